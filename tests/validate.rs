//! Integration tests for the `validate` command.
use regional_load::cli::handle_validate_command;
use regional_load::log::is_logger_initialised;
use regional_load::settings::Settings;
use std::fs;
use tempfile::tempdir;

use dataset::write_dataset;

/// An integration test for the `validate` command.
///
/// We also check that the logger is initialised after it is run.
#[test]
fn test_handle_validate_command() {
    unsafe { std::env::set_var("REGIONAL_LOAD_LOG_LEVEL", "off") };

    assert!(!is_logger_initialised());

    let dir = tempdir().unwrap();
    let config_path = write_dataset(dir.path(), &[2030, 2035]);
    handle_validate_command(&config_path, Some(Settings::default())).unwrap();

    assert!(is_logger_initialised());

    // Remove a zone from one of the load files so that base year fails
    let load_path = dir.path().join("load_2020.csv");
    let contents = fs::read_to_string(&load_path)
        .unwrap()
        .lines()
        .map(|line| line.rsplitn(3, ',').nth(2).unwrap().to_string())
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(&load_path, contents).unwrap();

    // The logger is already initialised, so check the pipeline directly
    let config = regional_load::config::RunConfig::from_path(&config_path).unwrap();
    let inputs = regional_load::input::load_inputs(&config).unwrap();
    let summary = regional_load::pipeline::validate(&config, &inputs);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].base_year, 2020);
}
