//! eventscout - upcoming tech events, co-working venues and an event
//! assistant, from the terminal.
//!
//! Events are served from the local cache for a day after each fetch; use
//! `events --refresh` to force a new grounded search.

mod render;

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use eventscout_core::api::{LatLng, ProxyClient};
use eventscout_core::cache::{FeedStore, FileFeedStore, MemoryFeedStore};
use eventscout_core::models::{CostFilter, EventFilter};
use eventscout_core::{App, Config};

// ============================================================================
// Constants
// ============================================================================

/// Set to "1" to also write logs to a daily file in the cache directory
const LOG_FILE_ENV: &str = "EVENTSCOUT_LOG_FILE";

const LOG_FILE_PREFIX: &str = "eventscout.log";

const CHAT_PROMPT: &str = "you> ";

#[derive(Parser)]
#[command(name = "eventscout")]
#[command(author, version, about = "Tech events, venues and an event assistant for your city")]
struct Cli {
    /// Keep the feed in memory only; the cache on disk is neither read nor written
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List upcoming events (cache-first)
    Events {
        /// Ignore a fresh cache and search again
        #[arg(short, long)]
        refresh: bool,

        /// all, free or paid
        #[arg(long, default_value = "all")]
        cost: CostFilter,

        /// Only events that award a certificate
        #[arg(long)]
        certificate: bool,

        /// Print the model's raw reply instead of event cards
        #[arg(long)]
        raw: bool,
    },

    /// Show the detailed guide for one event, by list number or id
    Details { event: String },

    /// List the web sources the current feed was grounded on
    Sources,

    /// Recommend co-working spaces and tech hubs nearby
    Venues {
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,
    },

    /// Chat with the event assistant (empty line or "exit" to quit)
    Chat,

    /// Delete the cached feed
    ClearCache,

    /// Print the effective configuration
    Config,
}

/// Initialize the tracing subscriber for logging.
/// The returned guard must be held until exit so file logs are flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=eventscout_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let (config, rejected_settings) = Config::load()?;
    let cache_dir = config.cache_dir()?;

    let log_dir = std::env::var(LOG_FILE_ENV)
        .is_ok_and(|v| v == "1")
        .then_some(cache_dir.as_path());
    let _log_guard = init_tracing(log_dir);
    for message in &rejected_settings {
        warn!("{}", message);
    }
    info!(proxy = %config.proxy_url, city = %config.city, "eventscout starting");

    let backend = ProxyClient::from_config(&config)?;

    if cli.no_cache {
        run(cli.command, App::new(config, backend, MemoryFeedStore::new())).await
    } else {
        let store = FileFeedStore::new(cache_dir)?;
        run(cli.command, App::new(config, backend, store)).await
    }
}

async fn run<S: FeedStore + 'static>(command: Commands, mut app: App<ProxyClient, S>) -> Result<()> {
    match command {
        Commands::Events {
            refresh,
            cost,
            certificate,
            raw,
        } => {
            app.filter = EventFilter {
                cost,
                certificate_only: certificate,
            };
            app.request_feed(refresh);
            app.settle().await;
            if raw {
                println!("{}", app.raw_text);
            } else {
                render::print_feed(&app);
            }
        }
        Commands::Details { event } => {
            app.request_feed(false);
            app.settle().await;
            if let Some(message) = app.error_message() {
                anyhow::bail!(message);
            }
            let event_id = resolve_event(&app, &event)
                .with_context(|| format!("No event '{}' in the current feed", event))?;
            app.open_details(&event_id);
            app.settle().await;
            render::print_details(&app);
        }
        Commands::Sources => {
            app.request_feed(false);
            app.settle().await;
            render::print_sources(&app);
        }
        Commands::Venues { lat, lng } => {
            let location = lat
                .zip(lng)
                .map(|(latitude, longitude)| LatLng { latitude, longitude });
            app.request_venues(location);
            app.settle().await;
            render::print_venues(&app);
        }
        Commands::Chat => chat_loop(&mut app).await?,
        Commands::ClearCache => {
            app.store().clear()?;
            println!("Cache cleared.");
        }
        Commands::Config => {
            println!("# {}", Config::config_path()?.display());
            println!("{}", serde_json::to_string_pretty(&app.config)?);
        }
    }
    Ok(())
}

/// Accept a 1-based position in the unfiltered list, or an event id
fn resolve_event<S: FeedStore + 'static>(app: &App<ProxyClient, S>, key: &str) -> Option<String> {
    if let Ok(n) = key.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| app.events.get(i))
            .map(|e| e.id.clone());
    }
    app.find_event(key).map(|e| e.id.clone())
}

async fn chat_loop<S: FeedStore + 'static>(app: &mut App<ProxyClient, S>) -> Result<()> {
    if let Some(greeting) = app.conversation().last_reply() {
        render::print_reply(&greeting);
    }

    let stdin = io::stdin();
    loop {
        print!("{}", CHAT_PROMPT);
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() || message.eq_ignore_ascii_case("exit") {
            break;
        }

        app.send_chat(message);
        app.settle().await;
        if let Some(reply) = app.conversation().last_reply() {
            render::print_reply(&reply);
        }
    }
    Ok(())
}
