use crate::config::AppConfig;
use crate::services::broadcast_service::UpdateBroadcaster;
use crate::store::TextStore;

/// In-memory shared application state
///
/// Everything here is cheap to clone: the store shares one connection, the
/// broadcaster shares one channel.
#[derive(Clone)]
pub struct AppState {
    pub store: TextStore,
    pub updates: UpdateBroadcaster,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: TextStore, updates: UpdateBroadcaster, config: AppConfig) -> Self {
        Self {
            store,
            updates,
            config,
        }
    }
}
