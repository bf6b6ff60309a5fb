use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use papertrans::cli::Args;
use papertrans::cli::commands::process::{self, ProcessOptions};
use papertrans::ui::Style;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging based on verbosity
    let default_filter = match args.verbose {
        0 => "papertrans=warn",
        1 => "papertrans=info",
        _ => "papertrans=debug",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let options = ProcessOptions {
        config: args.config,
        mode: args.mode,
        model: args.model,
        to: args.to,
        quiet: args.quiet,
    };

    let code = match process::run_process(options).await {
        Ok(_) => exitcode::OK,
        Err(err) => {
            eprintln!("{} {err:#}", Style::error("Error:"));
            process::exit_code_for(&err)
        }
    };

    std::process::exit(code);
}
