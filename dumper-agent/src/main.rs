//! Dumper Agent
//!
//! Copies the vehicle logs aside when a fatal safety condition is raised.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Transport: Publish results through the pub/sub sidecar
//! - Dispatch: Route pushed events to the registered topic handler
//! - Services: The filesystem dump itself
//! - API: Endpoints the sidecar uses to discover and deliver subscriptions
//!
//! On every `safety/fatal` message the agent copies the regular files of the
//! log directory into the dump directory and publishes the outcome on
//! `dumper/dump`.

mod api;
mod config;
mod dispatch;
mod handler;
mod service;
mod signals;
mod transport;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dumper_client::PubSubClient;
use dumper_core::domain::dump::DumpRequest;
use dumper_core::domain::topic::SAFETY_FATAL_TOPIC;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::AppState;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::handler::DumpHandler;
use crate::service::{DumpService, FsDumpService};
use crate::transport::{Publisher, SidecarPublisher, StdoutPublisher};

#[derive(Parser)]
#[command(name = "dumper-agent")]
#[command(about = "Dumps logs when a fatal safety event is raised", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Subscribe to safety events and dump on every trigger (default)
    Serve,
    /// Dump once right now and print the result to stdout
    Dump,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for results in `dump` mode
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dumper_agent=debug,dumper_client=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;
    info!(
        "Loaded configuration: log_path={}, dump_path={}, sidecar_url={}",
        config.log_path.display(),
        config.dump_path.display(),
        config.sidecar_url
    );

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Dump => dump_once(config).await,
    }
}

fn dump_service(config: &Config) -> Arc<dyn DumpService> {
    Arc::new(FsDumpService::new(
        config.log_path.clone(),
        config.dump_path.clone(),
    ))
}

/// Runs the agent until a shutdown signal arrives
async fn serve(config: Config) -> Result<()> {
    info!("Starting DumperApp...");

    let client = Arc::new(PubSubClient::new(
        config.sidecar_url.clone(),
        config.pubsub_name.clone(),
    ));
    let publisher: Arc<dyn Publisher> = Arc::new(SidecarPublisher::new(client));

    let handler = Arc::new(DumpHandler::new(
        dump_service(&config),
        publisher,
        config.max_concurrent_dumps,
    ));

    let mut dispatcher = Dispatcher::new();
    dispatcher.register(SAFETY_FATAL_TOPIC, handler);

    let app = api::create_router(AppState {
        dispatcher: Arc::new(dispatcher),
        pubsub_name: config.pubsub_name.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = signals::wait_for_shutdown_signal().await {
                warn!("Failed to listen for shutdown signals: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received, stopping");
        })
        .await
        .context("Server error")?;

    Ok(())
}

/// Performs a single dump and exits non-zero when it failed
async fn dump_once(config: Config) -> Result<()> {
    let handler = DumpHandler::new(dump_service(&config), Arc::new(StdoutPublisher::new()), 1);

    let result = handler.on_safety_fatal(DumpRequest::new()).await;
    if !result.is_success() {
        anyhow::bail!("{}", result.message);
    }

    Ok(())
}
