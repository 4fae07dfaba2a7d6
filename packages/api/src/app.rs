//! Application wiring and startup.

use std::sync::Arc;

use db::DbConfig;
use lifecycle::{JobLifecycle, SweeperConfig, SweeperMessage, start_sweeper};
use ractor::ActorRef;
use realtime::{NotificationBus, RealtimeConfig};
use storage::{ArtifactStore, ArtifactStoreConfig};

use crate::ApiError;

/// Everything the transport layer needs to serve the queue.
pub struct App {
    pub(crate) lifecycle: Arc<JobLifecycle>,
    pub(crate) artifacts: ArtifactStore,
    sweeper: ActorRef<SweeperMessage>,
}

impl App {
    /// The notification bus, for admitting dashboard connections.
    pub fn bus(&self) -> &NotificationBus {
        self.lifecycle.bus()
    }

    /// The artifact store, for the upload collaborator.
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Stop the background sweeper.
    pub fn shutdown(&self) {
        if self.sweeper.send_message(SweeperMessage::Shutdown).is_err() {
            tracing::debug!("sweeper already stopped");
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db: DbConfig,
    pub storage: ArtifactStoreConfig,
    pub realtime: RealtimeConfig,
    pub sweeper: SweeperConfig,
}

impl AppConfig {
    /// In-memory everything, for tests.
    pub fn memory() -> Self {
        Self {
            db: DbConfig::memory(),
            storage: ArtifactStoreConfig::memory(),
            realtime: RealtimeConfig::default(),
            sweeper: SweeperConfig::default(),
        }
    }

    /// Build a config from environment variables.
    ///
    /// - `DB_ENDPOINT` (default `mem://`, e.g. `rocksdb://./data/printshop`)
    /// - storage vars as in [`ArtifactStoreConfig::from_env`]
    /// - `REALTIME_ALLOWED_ORIGIN` (default `"*"`)
    /// - `SWEEP_INTERVAL_SECS` (default 900)
    /// - `JOB_RETENTION_HOURS` (default 24)
    pub fn from_env() -> Result<Self, ApiError> {
        let db = match std::env::var("DB_ENDPOINT") {
            Ok(endpoint) if !endpoint.trim().is_empty() => DbConfig {
                endpoint: endpoint.trim().to_string(),
                ..DbConfig::default()
            },
            _ => DbConfig::memory(),
        };

        let storage = ArtifactStoreConfig::from_env()?;
        let realtime = RealtimeConfig::from_env();

        let mut sweeper = SweeperConfig::default();
        if let Ok(secs) = std::env::var("SWEEP_INTERVAL_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| ApiError::Startup(format!("invalid SWEEP_INTERVAL_SECS={secs}")))?;
            sweeper.interval = std::time::Duration::from_secs(secs);
        }
        if let Ok(hours) = std::env::var("JOB_RETENTION_HOURS") {
            let hours: i64 = hours
                .trim()
                .parse()
                .map_err(|_| ApiError::Startup(format!("invalid JOB_RETENTION_HOURS={hours}")))?;
            sweeper.retention = chrono::Duration::hours(hours);
        }

        Ok(Self {
            db,
            storage,
            realtime,
            sweeper,
        })
    }
}

/// Initialize logging from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Initialize the print queue system.
///
/// This should be called once at startup before handling requests: connects
/// the database, applies the schema, opens the artifact store and spawns the
/// expiration sweeper.
pub async fn init_app(config: AppConfig) -> Result<App, ApiError> {
    tracing::info!("Initializing print queue...");

    db::init(config.db).await?;

    let artifacts = ArtifactStore::new(config.storage)?;
    let bus = NotificationBus::new(config.realtime);
    let lifecycle = Arc::new(JobLifecycle::new(artifacts.clone(), bus));

    let (sweeper, _handle) = start_sweeper(Arc::clone(&lifecycle), config.sweeper)
        .await
        .map_err(|e| ApiError::Startup(format!("failed to spawn sweeper: {e}")))?;

    tracing::info!("Print queue initialized");

    Ok(App {
        lifecycle,
        artifacts,
        sweeper,
    })
}
