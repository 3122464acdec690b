//! tessel-daemon: resolves cell sightings into areas and applies profiles.
//!
//! Single OS process running a Tokio async runtime. Clients report cell
//! locations and manage areas and profiles via JSON-RPC over a Unix socket.

mod commands;
mod config;
mod events;
mod rpc;
mod sink;

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{error, info};

use tessel_engine::applier::ProfileApplier;
use tessel_engine::clock::SystemClock;
use tessel_engine::dispatcher::SightingDispatcher;
use tessel_engine::normalizer::SightingNormalizer;
use tessel_engine::Engine;

use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::rpc::RpcServer;
use crate::sink::{EventIndicator, EventSink};

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Database connection, shared with the engine.
    pub db: Arc<Mutex<rusqlite::Connection>>,
    /// Configuration.
    pub config: DaemonConfig,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
    /// Resolution engine.
    pub engine: Arc<Engine>,
    /// Keyed sighting workers.
    pub dispatcher: SightingDispatcher,
    /// Status display adapter.
    pub indicator: Arc<EventIndicator>,
    /// Shutdown signal sender.
    pub shutdown_tx: broadcast::Sender<()>,
    /// Unix time the daemon started.
    pub started_at: u64,
}

impl DaemonState {
    /// Wire the engine and its collaborators. Spawns the sighting workers,
    /// so it must run inside the runtime.
    pub fn new(conn: rusqlite::Connection, config: DaemonConfig) -> Arc<Self> {
        let db = Arc::new(Mutex::new(conn));
        let event_bus = EventBus::new(1000);
        let indicator = Arc::new(EventIndicator::new(event_bus.clone()));
        let applier = ProfileApplier::new(
            Arc::new(EventSink::new(event_bus.clone())),
            indicator.clone(),
        );
        let engine = Arc::new(Engine::new(
            db.clone(),
            Arc::new(SystemClock::new()),
            applier,
            config.labels.clone(),
        ));
        let dispatcher = SightingDispatcher::new(
            engine.clone(),
            SightingNormalizer::new(config.radio.network_type),
            config.engine.workers,
            config.engine.queue_capacity,
        );
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

        Arc::new(Self {
            db,
            config,
            event_bus,
            engine,
            dispatcher,
            indicator,
            shutdown_tx,
            started_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("tessel={}", config.advanced.log_level).parse()?),
        )
        .init();

    info!("Tessel daemon starting");

    let data_dir = config.data_dir();

    // Ensure data directory exists
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open database
    let db_path = data_dir.join("tessel.db");
    let conn = tessel_db::open(&db_path)?;

    // 3. Build daemon state
    info!(
        network_type = %config.radio.network_type,
        workers = config.engine.workers,
        "Starting resolution engine"
    );
    let state = DaemonState::new(conn, config);
    tokio::spawn(events::log_events(state.event_bus.subscribe()));

    // 4. Start IPC server
    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    // 5. Emit DaemonStarted event
    state.event_bus.emit(events::Event::now(
        events::DAEMON_STARTED,
        serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
        }),
    ));

    // 6. Run the RPC server until shutdown
    let mut shutdown_rx = state.shutdown_tx.subscribe();
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Graceful shutdown: let queued sightings finish
    info!("Daemon shutting down gracefully");
    state.dispatcher.shutdown().await;

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
