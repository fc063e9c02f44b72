use std::collections::BTreeMap;

use crate::defaults::is_known_key;
use crate::errors::ApiError;
use crate::services::broadcast_service::UpdateBroadcaster;
use crate::store::{HistoryRecord, TextStore};

/// Current value of every known key.
pub fn get_all(store: &TextStore) -> Result<BTreeMap<String, String>, ApiError> {
    Ok(store.get_all()?)
}

/// Validate and commit a single edit, then fan it out.
///
/// The broadcast happens strictly after the commit, so subscribers only ever
/// see writes that `get_all` will also return. Exactly one publish per
/// committed write.
pub fn set(
    store: &TextStore,
    updates: &UpdateBroadcaster,
    key: &str,
    value: &str,
) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::invalid("Value is required"));
    }
    if !is_known_key(key) {
        return Err(ApiError::invalid(format!("Unknown text key: {key}")));
    }

    store.set(key, value)?;
    updates.publish(key, value);

    tracing::debug!("set {key} = {value:?}");
    Ok(())
}

/// Overwrite every known key back to its built-in default.
///
/// Used by the idle-timeout policy. Deliberately does not broadcast per-key;
/// clients pick the defaults up on their next snapshot reload.
pub fn reset_all(store: &TextStore) -> Result<(), ApiError> {
    store.reset_all()?;
    tracing::info!("all site text reset to defaults");
    Ok(())
}

/// Up to `limit` most recent history records across all keys, newest first.
pub fn history(store: &TextStore, limit: usize) -> Result<Vec<HistoryRecord>, ApiError> {
    Ok(store.history(limit)?)
}
