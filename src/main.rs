use std::process::ExitCode;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cmdtrust::config::{Config, Settings};
use cmdtrust::runner;

fn main() -> Result<ExitCode> {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    // Load settings
    let mut settings = Settings::load(cli.config.as_ref())?;
    settings.merge_cli(&cli);
    settings.validate();

    // Run the subcommand
    let mut stdout = std::io::stdout().lock();
    let outcome = runner::run(&cli.command, &settings, &mut stdout)?;
    Ok(outcome.exit_code())
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("cmdtrust=debug,cmdtrust_core=debug")
    } else {
        EnvFilter::new("cmdtrust=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
