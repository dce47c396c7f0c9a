//! Sprout CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use sprout::cli::{Cli, CliDispatcher};
use sprout::config::Settings;
use sprout::error::Result;
use sprout::registry::VersionResolver;
use sprout::shell::{is_ci, is_elevated};
use sprout::ui::{create_ui, OutputMode, UserInterface};
use sprout::updates::{UpdateChecker, CORE_PACKAGE, VERSION};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("sprout=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sprout=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Settings for this run: the user's files and environment, then the flags.
fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load()?;
    if let Some(path) = &cli.target_path {
        settings.target_path = Some(path.clone());
    }
    if cli.no_update_check {
        settings.update_check = false;
    }
    Ok(settings)
}

/// Tell the user about a newer compatible release.
fn check_for_update(settings: &Settings, ui: &mut dyn UserInterface) {
    let resolver = match VersionResolver::from_url(&settings.registry) {
        Ok(resolver) => resolver,
        Err(e) => {
            tracing::debug!("Skipping update check: {}", e);
            return;
        }
    };
    let checker = UpdateChecker::new(resolver, settings.update_cache_path());
    if let Some(info) = checker.check() {
        if info.update_available {
            ui.warning(&format!(
                "sprout {} is available (current {}). Update with: npm install -g {}",
                info.latest, info.current, CORE_PACKAGE
            ));
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("sprout {} starting with args: {:?}", VERSION, cli);

    // Determine output mode
    let output_mode = if cli.quiet {
        OutputMode::Quiet
    } else if cli.verbose {
        OutputMode::Verbose
    } else {
        OutputMode::Normal
    };

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let mut ui = create_ui(!is_ci() && console::user_attended(), output_mode);

    if is_elevated() {
        ui.warning("Running as root is discouraged; files created now will be owned by root");
    }

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            tracing::debug!("{:?}", e);
            return ExitCode::from(1);
        }
    };

    if settings.update_check {
        check_for_update(&settings, ui.as_mut());
    }

    let working_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            return ExitCode::from(1);
        }
    };
    let dispatcher = CliDispatcher::new(settings, working_dir);

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(u8::try_from(result.exit_code).unwrap_or(1)),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            tracing::debug!("{:?}", e);
            ExitCode::from(1)
        }
    }
}
