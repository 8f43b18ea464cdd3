//! Provides the main entry point to the program.
use human_panic::{metadata, setup_panic};
use log::error;
use regional_load::cli::run_cli;
use regional_load::log::is_logger_initialised;

fn main() {
    setup_panic!(metadata!().support("Please report the issue to the developers."));

    if let Err(err) = run_cli() {
        if is_logger_initialised() {
            error!("{err:?}");
        } else {
            eprintln!("Error: {err:?}");
        }

        // Terminate program, signalling an error
        std::process::exit(1);
    }
}
