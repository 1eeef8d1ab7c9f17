//! st - spacetree command-line entry point

use std::process::ExitCode;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use spacetree::cli::{self, Cli};
use spacetree::ui::output;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr. `--debug` wins over the environment.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("spacetree=debug")
    } else {
        EnvFilter::try_from_env("SPACETREE_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("spacetree=warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
