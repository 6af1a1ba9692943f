//! frizbee-action - Pin GitHub Actions and container images to immutable digests
//!
//! This is the main entry point of the action container.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use frizbee_action::cli::{self, Cli, LogFormat};

#[tokio::main]
async fn main() {
    // Parse CLI arguments and action inputs
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.log_format);

    let exit_code = cli::run::execute(&cli.inputs).await;
    std::process::exit(exit_code);
}

fn setup_logging(verbosity: u8, format: LogFormat) {
    // CI logs are the only output, so info is shown by default
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer().with_target(false))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
    }
}
