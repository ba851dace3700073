use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::registry::TaskRegistry;

/// Configuration for the terminal-task retention sweeper.
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// How often to scan for evictable tasks (seconds).
    pub sweep_interval: u64,
    /// How long a completed/failed task stays queryable (seconds).
    pub terminal_ttl: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            sweep_interval: 60,
            terminal_ttl: 3600,
        }
    }
}

/// Start the retention sweeper loop.
///
/// Completed and failed tasks stay queryable for `terminal_ttl` seconds
/// after their last update, then get evicted so the registry does not
/// grow without bound. Pending and in-progress tasks are never touched.
///
/// Returns a CancellationToken that stops the sweeper when cancelled.
pub fn start(registry: Arc<TaskRegistry>, config: RetentionConfig) -> CancellationToken {
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        let interval = Duration::from_secs(config.sweep_interval);
        let ttl = config.terminal_ttl;

        tokio::spawn(async move {
            info!("task retention sweeper started (interval={interval:?}, ttl={ttl}s)");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("task retention sweeper stopped");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        debug!("retention sweep");
                        match registry.sweep_terminal(ttl) {
                            0 => {}
                            n => info!("retention sweeper: evicted {n} terminal tasks"),
                        }
                    }
                }
            }
        });
    }

    cancel
}
