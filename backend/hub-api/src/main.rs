use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use hub_api::cache::{CacheStore, DerivedViewCache, MemoryCache, RedisCache};
use hub_api::config::{CacheBackend, Config};
use hub_api::fanout::{self, RedisNotifier};
use hub_api::processor::EmployeeEventProcessor;
use hub_api::services::ChecklistService;
use hub_api::upstream::HrServiceClient;
use hub_api::{build_router, consumer, AppState};

#[derive(Parser)]
#[command(name = "hub-api", about = "Employee checklist hub: derived views kept in sync with the HR service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API and WebSocket notifications, consuming events in-process (default)
    Serve,
    /// Consume employee events from RabbitMQ until shutdown (requires the Redis cache)
    Consume,
    /// Drain queued employee events and exit (requires the Redis cache)
    Pull {
        /// Max number of messages to handle
        #[arg(long)]
        limit: Option<usize>,
        /// Handle a single message then exit
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Consume => {
            config.ensure_shared_cache("consume")?;
            let processor = worker_processor(&config).await?;
            info!(
                "Connecting to RabbitMQ at {}:{}...",
                config.broker.host, config.broker.port
            );
            consumer::run(
                &config.broker,
                &processor,
                config.processing_timeout,
                shutdown_signal(),
            )
            .await;
            Ok(())
        }
        Command::Pull { limit, once } => {
            config.ensure_shared_cache("pull")?;
            let processor = worker_processor(&config).await?;
            let limit = if once { Some(1) } else { limit };
            let summary = consumer::pull(
                &config.broker,
                &processor,
                config.processing_timeout,
                limit,
            )
            .await?;
            if summary.handled() == 0 && summary.requeued == 0 {
                info!("No messages in queue.");
            }
            info!(
                "Done. Processed {} message(s) ({} dropped, {} requeued).",
                summary.handled(),
                summary.dropped,
                summary.requeued
            );
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hub_api=debug,employee_events=debug,tower_http=debug".into());

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn connect_cache(config: &Config) -> anyhow::Result<DerivedViewCache> {
    let store: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Redis => {
            let store = RedisCache::connect(&config.redis_url, &config.cache_prefix).await?;
            info!("Redis cache connected");
            Arc::new(store)
        }
        CacheBackend::Memory => {
            info!("Using in-process cache");
            Arc::new(MemoryCache::new())
        }
    };
    Ok(DerivedViewCache::new(store, config.cache_ttl))
}

/// Processor for standalone workers: shared Redis cache, frames published for the servers to relay.
async fn worker_processor(config: &Config) -> anyhow::Result<EmployeeEventProcessor> {
    let cache = connect_cache(config).await?;
    let notifier = RedisNotifier::connect(&config.redis_url, &config.notify_channel).await?;
    Ok(EmployeeEventProcessor::new(cache, Arc::new(notifier)))
}

async fn stopped(mut stop: watch::Receiver<bool>) {
    while !*stop.borrow() {
        if stop.changed().await.is_err() {
            break;
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Starting hub API server...");

    let cache = connect_cache(&config).await?;
    let source = HrServiceClient::new(config.hr_service_url.clone(), config.hr_service_timeout)?;
    let checklists = ChecklistService::new(cache, Arc::new(source), config.hr_page_size);

    // Build application state
    let app_state = AppState::new(checklists);

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut background = Vec::new();

    // With Redis, every event's frames go through pub/sub so all servers see
    // them, including those fed by standalone `consume` workers.
    let processor = match config.cache_backend {
        CacheBackend::Redis => {
            background.push(tokio::spawn(fanout::relay(
                config.redis_url.clone(),
                config.notify_channel.clone(),
                app_state.broadcast_tx.clone(),
                stopped(stop_rx.clone()),
            )));
            let notifier = RedisNotifier::connect(&config.redis_url, &config.notify_channel).await?;
            app_state.processor_with(Arc::new(notifier))
        }
        CacheBackend::Memory => app_state.local_processor(),
    };

    if config.consumer_enabled {
        let broker = config.broker.clone();
        let timeout = config.processing_timeout;
        let stop = stopped(stop_rx.clone());
        info!(
            "Consuming employee events from RabbitMQ at {}:{}",
            broker.host, broker.port
        );
        background.push(tokio::spawn(async move {
            consumer::run(&broker, &processor, timeout, stop).await;
        }));
    } else if config.cache_backend == CacheBackend::Memory {
        warn!("Consumer disabled with an in-process cache: views refresh only by TTL");
    }

    let app = build_router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    // Graceful shutdown
    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutting down gracefully...");
        }
    }

    let _ = stop_tx.send(true);
    for task in background {
        if let Err(e) = task.await {
            error!("Background task failed: {}", e);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
