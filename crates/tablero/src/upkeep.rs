//! Periodic maintenance: the stats reporter and the idle-room reaper.
//!
//! Two independent tasks, started once when the server starts, running
//! for the lifetime of the process. The stats reporter is pure
//! observability; the reaper is a safety net behind the immediate
//! empty-room deletion that happens on the last leave.

use std::sync::Arc;
use std::time::Duration;

use crate::server::ServerState;

/// Cadence and thresholds for the maintenance tasks.
#[derive(Debug, Clone)]
pub struct UpkeepConfig {
    /// How often to log room/connection counts.
    pub stats_interval: Duration,
    /// How often the idle-room reaper scans.
    pub reap_interval: Duration,
    /// Age past which an empty room is reaped.
    pub room_idle_timeout: Duration,
}

impl Default for UpkeepConfig {
    fn default() -> Self {
        Self {
            stats_interval: Duration::from_secs(30),
            reap_interval: Duration::from_secs(300),
            room_idle_timeout: Duration::from_secs(1800),
        }
    }
}

/// Spawns the stats and reaper tasks. Fire-and-forget: they live as
/// long as the process.
pub(crate) fn spawn_upkeep(state: Arc<ServerState>, config: UpkeepConfig) {
    let stats_state = Arc::clone(&state);
    let stats_interval = config.stats_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(stats_interval);
        // The first interval tick completes immediately; skip it so the
        // first report lands one full period after startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let rooms = stats_state.rooms.lock().await.room_count();
            let connections = stats_state.connections.lock().await.len();
            tracing::info!(rooms, connections, "registry stats");
        }
    });

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.reap_interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = state
                .rooms
                .lock()
                .await
                .reap_idle(config.room_idle_timeout);
            if !removed.is_empty() {
                tracing::info!(count = removed.len(), "reaped idle rooms");
            }
        }
    });
}
