//! Pokedex CLI - browse PokeAPI location areas and catch Pokemon
//!
//! A line-oriented REPL. Responses from the PokeAPI are kept in an in-memory
//! cache whose entries are swept after the configured interval.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use pokedex::app::App;
use pokedex::cache::TtlCache;
use pokedex::cli::{Cli, StartupConfig};
use pokedex::commands::CommandRegistry;
use pokedex::data::PokeApiClient;

const PROMPT: &str = "Pokedex > ";

/// Sets up logging to stderr so it never interleaves with REPL output on stdout.
/// `RUST_LOG` overrides the default filter.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "pokedex=debug,warn" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(io::stderr)
                .with_filter(filter),
        )
        .init();
}

/// Reads commands from stdin until `exit` or end of input
async fn run_repl(app: &mut App, registry: &CommandRegistry) -> io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "{}", PROMPT)?;
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            // End of input: finish the prompt line
            writeln!(stdout)?;
            break;
        };

        if let Err(e) = app.handle_line(registry, &line, &mut stdout).await {
            warn!(command = %e.name, error = %e.source, "command failed");
            eprintln!("{}", e);
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    init_tracing(config.verbose);

    let cache = match TtlCache::new(config.cache_interval) {
        Ok(cache) => cache,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        interval_secs = config.cache_interval.as_secs(),
        base_url = %config.base_url,
        "starting pokedex"
    );

    let client = PokeApiClient::new(cache.clone())
        .with_base_url(config.base_url.clone())
        .with_page_size(config.page_size);
    let registry = CommandRegistry::standard();
    let mut app = App::new(client, config.catch_difficulty);

    let result = run_repl(&mut app, &registry).await;

    // Stop the sweep before the runtime shuts down
    cache.shutdown().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error reading input: {}", e);
            ExitCode::FAILURE
        }
    }
}
