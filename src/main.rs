//! Entry point: parse the command line and dispatch to a command handler.
//!
//! Every handler returns `anyhow::Result`; failures are printed with their
//! full context chain and turn into a non-zero exit code.

use nightlightd::args::{self, CliAction, ParsedArgs};
use nightlightd::commands::{control, location, run, simulate, status, sun};
use nightlightd::common::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use nightlightd::common::logger::Log;
use nightlightd::config;

fn main() {
    let parsed_args = ParsedArgs::from_env();

    let (debug_enabled, config_dir) = match &parsed_args.action {
        CliAction::Run {
            debug_enabled,
            config_dir,
        }
        | CliAction::Simulate {
            debug_enabled,
            config_dir,
            ..
        } => (*debug_enabled, config_dir.clone()),
        CliAction::Status { config_dir, .. }
        | CliAction::Sun { config_dir, .. }
        | CliAction::Location { config_dir, .. }
        | CliAction::Reload { config_dir }
        | CliAction::Preview { config_dir }
        | CliAction::Pause { config_dir }
        | CliAction::Stop { config_dir } => (false, config_dir.clone()),
        CliAction::ShowHelp | CliAction::ShowVersion | CliAction::ShowHelpDueToError => {
            (false, None)
        }
    };

    Log::set_debug(debug_enabled);
    if config_dir.is_some()
        && let Err(e) = config::set_config_dir(config_dir)
    {
        nightlightd::log_error_standalone!("{e}");
        std::process::exit(EXIT_FAILURE);
    }

    let result = match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Run { debug_enabled, .. } => run::handle_run_command(debug_enabled),
        CliAction::Status { json, .. } => status::handle_status_command(json),
        CliAction::Sun { date, .. } => sun::handle_sun_command(date),
        CliAction::Simulate {
            start_time,
            end_time,
            step_minutes,
            timezone,
            ..
        } => simulate::handle_simulate_command(
            &start_time,
            &end_time,
            step_minutes,
            timezone.as_deref(),
        ),
        CliAction::Location {
            latitude,
            longitude,
            ..
        } => location::handle_location_command(latitude, longitude),
        CliAction::Reload { .. } => control::handle_control_command(control::ControlCommand::Reload),
        CliAction::Preview { .. } => {
            control::handle_control_command(control::ControlCommand::Preview)
        }
        CliAction::Pause { .. } => control::handle_control_command(control::ControlCommand::Pause),
        CliAction::Stop { .. } => control::handle_stop_command(),
    };

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(e) => {
            Log::set_enabled(true);
            nightlightd::log_error_exit!("{}", e);
            if e.chain().count() > 1 {
                // Print the cause chain below the summary
                eprintln!("{e:?}");
            }
            std::process::exit(EXIT_FAILURE);
        }
    }
}
