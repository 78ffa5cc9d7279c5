//! # Cohort
//!
//! ```bash
//! # Generate a demo roster and group it
//! cohort template --output roster.json --config-output cohort.toml
//! cohort partition --roster roster.json --config cohort.toml --mode isolation-boost
//!
//! # Start the HTTP server
//! cohort server --host 0.0.0.0 --port 8080
//! ```

use clap::Parser;
use cohort::cli::{self, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // COHORT_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("COHORT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "cohort=debug,tower_http=debug"
    } else {
        "cohort=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so `--json` output on stdout stays parseable.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && matches!(cli.command, Commands::Server { .. }) {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
   ___      _                _
  / __|___ | |_   ___  _ _ _| |_
 | (__/ _ \| ' \ / _ \| '_|_   _|
  \___\___/|_||_|\___/|_|   |_|

  Preference-graph grouping v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
