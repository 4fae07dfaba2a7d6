//! Periodic expiration of stale pending jobs.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef};

use crate::manager::JobLifecycle;

/// Sweeper configuration.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often the sweep runs.
    pub interval: Duration,
    /// How long a job may stay pending before it expires.
    pub retention: chrono::Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(900),
            retention: chrono::Duration::hours(24),
        }
    }
}

/// Messages for the sweeper actor.
#[derive(Debug)]
pub enum SweeperMessage {
    /// Run one sweep now.
    Sweep,

    /// Shutdown the sweeper gracefully.
    Shutdown,
}

/// State for the sweeper actor.
pub struct SweeperState {
    lifecycle: Arc<JobLifecycle>,
    retention: chrono::Duration,
}

/// Arguments for spawning the sweeper.
pub struct SweeperArgs {
    pub lifecycle: Arc<JobLifecycle>,
    pub config: SweeperConfig,
}

/// Actor that expires jobs left pending past the retention window.
pub struct ExpirationSweeper;

impl Actor for ExpirationSweeper {
    type Msg = SweeperMessage;
    type State = SweeperState;
    type Arguments = SweeperArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            "Starting expiration sweeper (every {:?}, retention {})",
            args.config.interval,
            args.config.retention
        );

        // Start periodic tick
        let myself_clone = myself.clone();
        let interval_duration = args.config.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval_duration);
            loop {
                interval.tick().await;
                if myself_clone.send_message(SweeperMessage::Sweep).is_err() {
                    break;
                }
            }
        });

        Ok(SweeperState {
            lifecycle: args.lifecycle,
            retention: args.config.retention,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SweeperMessage::Sweep => {
                let cutoff = Utc::now() - state.retention;
                match state.lifecycle.expire_stale(cutoff).await {
                    Ok(0) => {}
                    Ok(expired) => {
                        tracing::info!("expired {} stale pending jobs", expired);
                    }
                    Err(e) => {
                        tracing::warn!("expiration sweep failed: {}", e);
                    }
                }
            }

            SweeperMessage::Shutdown => {
                tracing::info!("Shutting down expiration sweeper");
                myself.stop(None);
            }
        }

        Ok(())
    }
}

/// Start the sweeper with the given configuration.
pub async fn start_sweeper(
    lifecycle: Arc<JobLifecycle>,
    config: SweeperConfig,
) -> Result<(ActorRef<SweeperMessage>, tokio::task::JoinHandle<()>), ractor::SpawnErr> {
    let (actor, handle) =
        Actor::spawn(None, ExpirationSweeper, SweeperArgs { lifecycle, config }).await?;

    Ok((actor, handle))
}
