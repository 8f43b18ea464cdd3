//! The command line interface for the program.
use crate::config::RunConfig;
use crate::input::load_inputs;
use crate::log;
use crate::output::metadata::write_metadata;
use crate::output::{create_output_directory, get_output_dir};
use crate::pipeline;
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result, ensure};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the program.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Produce regional load profiles.
    Run {
        /// Path to the run configuration file.
        config_path: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Check that input data is valid without writing any profiles.
    Validate {
        /// Path to the run configuration file.
        config_path: PathBuf,
    },
    /// Manage program settings.
    Settings {
        /// The subcommands for managing settings.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { config_path, opts } => handle_run_command(&config_path, &opts, None),
            Self::Validate { config_path } => handle_validate_command(&config_path, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ regional-load --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        // Output program help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided
fn settings_or_load(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Handle the `run` command.
pub fn handle_run_command(
    config_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = settings_or_load(settings)?;

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(config_path)?;
        &pathbuf
    };

    let allow_overwrite = opts.overwrite || settings.overwrite;
    let overwritten = create_output_directory(output_path, allow_overwrite).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;

    // Initialise program logger
    log::init(Some(settings.log_level.as_str()), Some(output_path))
        .context("Failed to initialise logging.")?;

    // NB: We have to wait until the logger is initialised to display this warning
    if overwritten {
        warn!("Output folder was overwritten");
    }

    // Load the configuration and shared inputs
    let config = RunConfig::from_path(config_path).context("Failed to load run configuration.")?;
    let inputs = load_inputs(&config).context("Failed to load input data.")?;
    info!("Loaded run configuration from {}", config_path.display());
    info!("Output folder: {}", output_path.display());
    write_metadata(output_path, config_path, &config).context("Failed to save metadata.")?;

    let summary = pipeline::run(&config, &inputs, output_path);
    ensure!(
        summary.is_success(),
        "{} unit(s) of work failed ({} profile(s) written). See the log for details.",
        summary.failures.len(),
        summary.n_written()
    );
    info!("Wrote {} load profiles", summary.n_written());

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(config_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = settings_or_load(settings)?;

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(settings.log_level.as_str()), None).context("Failed to initialise logging.")?;

    let config = RunConfig::from_path(config_path).context("Failed to load run configuration.")?;
    let inputs = load_inputs(&config).context("Failed to load input data.")?;
    let summary = pipeline::validate(&config, &inputs);
    ensure!(
        summary.is_success(),
        "{} base year(s) failed validation. See the log for details.",
        summary.failures.len()
    );
    info!("Validation successful!");

    Ok(())
}
