//! Initialisation and configuration of the program's logging system.
//!
//! Messages are written to the console, with colours if it is a terminal, and optionally to log
//! files in the output folder. The log level can be set through an environment variable.
use anyhow::{Context, Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::Arguments;
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// Set once the logger has been installed
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The environment variable which overrides the log level
const LOG_LEVEL_ENV_VAR: &str = "REGIONAL_LOAD_LOG_LEVEL";

/// Log level used when neither the environment nor the settings file gives one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log file for messages below warning level
const LOG_INFO_FILE_NAME: &str = "regional_load_info.log";

/// Log file for warnings and errors
const LOG_ERROR_FILE_NAME: &str = "regional_load_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Choose the log level: the environment variable wins, then settings, then the default
fn resolve_log_level(env_value: Option<&str>, from_settings: Option<&str>) -> Result<LevelFilter> {
    parse_log_level(env_value.or(from_settings).unwrap_or(DEFAULT_LOG_LEVEL))
}

/// Convert a log level name (case insensitive) to a [`LevelFilter`]
fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    Ok(match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    })
}

/// Console output: warnings and errors go to stderr, everything else to stdout
fn console_dispatch(log_level: LevelFilter) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let stdout_colour = std::io::stdout().is_terminal().then_some(colours);
    let stderr_colour = std::io::stderr().is_terminal().then_some(colours);

    Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(move |out, message, record| {
                    write_log(out, message, record, stdout_colour.as_ref());
                })
                .level(log_level)
                .chain(std::io::stdout()),
        )
        .chain(
            Dispatch::new()
                .format(move |out, message, record| {
                    write_log(out, message, record, stderr_colour.as_ref());
                })
                .level(log_level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        )
}

/// Log files in `dir`. The info file always records at least `info` level.
fn file_dispatch(dir: &Path, log_level: LevelFilter) -> Result<Dispatch> {
    let open = |file_name: &str| {
        let file_path = dir.join(file_name);
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&file_path)
            .with_context(|| format!("Could not create log file {}", file_path.display()))
    };
    let info_file = open(LOG_INFO_FILE_NAME)?;
    let error_file = open(LOG_ERROR_FILE_NAME)?;

    Ok(Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(|out, message, record| write_log(out, message, record, None))
                .level(log_level.max(LevelFilter::Info))
                .chain(info_file),
        )
        .chain(
            Dispatch::new()
                .format(|out, message, record| write_log(out, message, record, None))
                .level(LevelFilter::Warn)
                .chain(error_file),
        ))
}

/// Initialise the program logger.
///
/// The level is read from the `REGIONAL_LOAD_LOG_LEVEL` environment variable if set, otherwise
/// from the settings file, otherwise it is `info`. Valid levels are `off`, `error`, `warn`,
/// `info`, `debug` and `trace`.
///
/// # Arguments
///
/// * `log_level_from_settings`: The log level specified in `settings.toml`
/// * `log_dir`: If given, `regional_load_info.log` and `regional_load_error.log` are written here
pub fn init(log_level_from_settings: Option<&str>, log_dir: Option<&Path>) -> Result<()> {
    let env_value = env::var(LOG_LEVEL_ENV_VAR).ok();
    let log_level = resolve_log_level(env_value.as_deref(), log_level_from_settings)?;

    let mut dispatch = Dispatch::new().chain(console_dispatch(log_level));
    if let Some(log_dir) = log_dir {
        dispatch = dispatch.chain(file_dispatch(log_dir, log_level)?);
    }

    dispatch.apply().context("Logger already initialised")?;
    LOGGER_INIT.get_or_init(|| ());

    Ok(())
}

/// Format a log record as `[time level target] message`, colouring the level if requested
fn write_log(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    colours: Option<&ColoredLevelConfig>,
) {
    let timestamp = Local::now().format("%H:%M:%S");
    let target = record.target();
    match colours {
        Some(colours) => {
            let level = colours.color(record.level());
            out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
        }
        None => {
            let level = record.level();
            out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
        }
    }
}
