use std::sync::Arc;

use crate::broadcast::Broadcaster;
use crate::config::ServerConfig;
use crate::store::{DocumentStore, MemoryStore};
use crate::timers::RoomTimers;
use crate::tracker::{PositionCache, StatusMap};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub broadcaster: Arc<Broadcaster>,
    pub positions: Arc<PositionCache>,
    pub status: Arc<StatusMap>,
    pub timers: Arc<RoomTimers>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), config)
    }

    pub fn with_store(store: Arc<dyn DocumentStore>, config: ServerConfig) -> Self {
        Self {
            store,
            broadcaster: Arc::new(Broadcaster::new()),
            positions: Arc::new(PositionCache::new()),
            status: Arc::new(StatusMap::new()),
            timers: Arc::new(RoomTimers::new()),
            config: Arc::new(config),
        }
    }
}
