//! Command-line argument parsing.
//!
//! Global flags (`--debug`, `--config <dir>`, `--help`, `--version`) may
//! appear anywhere; the first remaining word selects the command and the rest
//! are its arguments. Invalid input logs a warning and yields
//! [`CliAction::ShowHelpDueToError`].

use chrono::NaiveDate;

/// Default step of `simulate` in minutes.
pub const DEFAULT_SIMULATE_STEP_MINUTES: u32 = 10;

/// What the binary was asked to do.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon in the foreground
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Print the running daemon's state
    Status {
        json: bool,
        config_dir: Option<String>,
    },
    /// Print sunrise and sunset for the configured location
    Sun {
        date: Option<NaiveDate>,
        config_dir: Option<String>,
    },
    /// Step the engine through a time range and print every change
    Simulate {
        debug_enabled: bool,
        start_time: String,
        end_time: String,
        step_minutes: u32,
        timezone: Option<String>,
        config_dir: Option<String>,
    },
    /// Store coordinates in the configuration
    Location {
        latitude: f64,
        longitude: f64,
        config_dir: Option<String>,
    },
    /// Ask the running daemon to reload its configuration
    Reload { config_dir: Option<String> },
    /// Ask the running daemon for a preview of the night temperature
    Preview { config_dir: Option<String> },
    /// Toggle disabled-until-tomorrow on the running daemon
    Pause { config_dir: Option<String> },
    /// Stop the running daemon
    Stop { config_dir: Option<String> },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to invalid arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse `args`, whose first item is the program name.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ParsedArgs {
            action: parse_action(args),
        }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

fn parse_action<I, S>(args: I) -> CliAction
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args_vec: Vec<String> = args
        .into_iter()
        .skip(1)
        .map(|s| s.as_ref().to_string())
        .collect();

    let mut debug_enabled = false;
    let mut display_help = false;
    let mut display_version = false;
    let mut config_dir: Option<String> = None;
    let mut json = false;
    let mut timezone: Option<String> = None;
    let mut positionals: Vec<String> = Vec::new();

    let mut iter = args_vec.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-d" | "--debug" => debug_enabled = true,
            "-h" | "--help" => display_help = true,
            "-V" | "-v" | "--version" => display_version = true,
            "--json" => json = true,
            "-c" | "--config" => match iter.next() {
                Some(dir) => config_dir = Some(dir),
                None => {
                    log_warning!("Missing directory for --config");
                    return CliAction::ShowHelpDueToError;
                }
            },
            "--tz" => match iter.next() {
                Some(tz) => timezone = Some(tz),
                None => {
                    log_warning!("Missing time zone for --tz");
                    return CliAction::ShowHelpDueToError;
                }
            },
            // Negative numbers are arguments, not flags
            flag if flag.starts_with('-') && flag.parse::<f64>().is_err() => {
                log_warning!("Unknown option: {flag}");
                return CliAction::ShowHelpDueToError;
            }
            _ => positionals.push(arg),
        }
    }

    if display_version {
        return CliAction::ShowVersion;
    }
    if display_help {
        return CliAction::ShowHelp;
    }

    let Some((command, rest)) = positionals.split_first() else {
        return CliAction::Run {
            debug_enabled,
            config_dir,
        };
    };

    if json && command != "status" {
        log_warning!("--json is only supported by the status command");
        return CliAction::ShowHelpDueToError;
    }
    if timezone.is_some() && command != "simulate" {
        log_warning!("--tz is only supported by the simulate command");
        return CliAction::ShowHelpDueToError;
    }

    match (command.as_str(), rest) {
        ("run", []) => CliAction::Run {
            debug_enabled,
            config_dir,
        },
        ("status", []) => CliAction::Status { json, config_dir },
        ("sun", []) => CliAction::Sun {
            date: None,
            config_dir,
        },
        ("sun", [date]) => match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            Ok(date) => CliAction::Sun {
                date: Some(date),
                config_dir,
            },
            Err(_) => {
                log_warning!("Invalid date '{date}'. Usage: nightlightd sun [YYYY-MM-DD]");
                CliAction::ShowHelpDueToError
            }
        },
        ("simulate", [start, end, step @ ..]) if step.len() <= 1 => {
            let step_minutes = match step.first() {
                None => DEFAULT_SIMULATE_STEP_MINUTES,
                Some(value) => match value.parse::<u32>() {
                    Ok(minutes) if minutes > 0 => minutes,
                    _ => {
                        log_warning!("Step must be a positive number of minutes, got '{value}'");
                        return CliAction::ShowHelpDueToError;
                    }
                },
            };
            CliAction::Simulate {
                debug_enabled,
                start_time: start.clone(),
                end_time: end.clone(),
                step_minutes,
                timezone,
                config_dir,
            }
        }
        ("location", [lat, lon]) => match (lat.parse::<f64>(), lon.parse::<f64>()) {
            (Ok(latitude), Ok(longitude)) => CliAction::Location {
                latitude,
                longitude,
                config_dir,
            },
            _ => {
                log_warning!(
                    "Invalid coordinates. Usage: nightlightd location <latitude> <longitude>"
                );
                CliAction::ShowHelpDueToError
            }
        },
        ("reload", []) => CliAction::Reload { config_dir },
        ("preview", []) => CliAction::Preview { config_dir },
        ("pause", []) => CliAction::Pause { config_dir },
        ("stop", []) => CliAction::Stop { config_dir },
        ("run" | "status" | "reload" | "preview" | "pause" | "stop", _) => {
            log_warning!("'{command}' takes no arguments");
            CliAction::ShowHelpDueToError
        }
        ("sun" | "simulate" | "location", _) => {
            log_warning!("Wrong number of arguments for '{command}'");
            CliAction::ShowHelpDueToError
        }
        _ => {
            log_warning!("Unknown command: {command}");
            CliAction::ShowHelpDueToError
        }
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    log_end!();
}

/// Displays the help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("nightlightd [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("run                    Run the daemon in the foreground (default)");
    log_indented!("status [--json]        Show the state of the running daemon");
    log_indented!("sun [YYYY-MM-DD]       Show sunrise and sunset for the configured location");
    log_indented!("simulate <start> <end> [step] [--tz <Area/City>]");
    log_indented!("                       Step through time, times as \"YYYY-MM-DD HH:MM\"");
    log_indented!("location <lat> <lon>   Store coordinates and use the automatic schedule");
    log_indented!("reload                 Reload the configuration of the running daemon");
    log_indented!("preview                Show the night temperature for a few seconds");
    log_indented!("pause                  Toggle night light off until tomorrow");
    log_indented!("stop                   Stop the running daemon");
    log_end!();
}
