use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::Config;
use crate::room::RoomRegistry;

/// Shared state injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub config: Arc<Config>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            registry: Arc::new(RoomRegistry::with_shard_amount(config.room_shards)),
            config: Arc::new(config),
            started_at: Utc::now(),
        }
    }
}
