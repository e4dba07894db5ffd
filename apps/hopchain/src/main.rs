//! # hopchain - word chain solve service
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! HOPS_API_URL=http://hops.local GAMES_API_URL=http://games.local \
//!     hopchain server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! hopchain status
//! hopchain edges -f replay.json
//! hopchain list --owner user-1
//! ```

use clap::Parser;
use hopchain::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // HOPCHAIN_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("HOPCHAIN_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hopchain=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!(error_kind = e.kind(), "Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  hopchain v{}
  one word at a time, every path counted once
"#,
        env!("CARGO_PKG_VERSION")
    );
}
