use super::SharedStore;
use crate::prelude::*;

/// Best-effort audit trail. Appends never fail the caller; a rejected event
/// is logged at debug level and dropped.
#[derive(Clone, Debug)]
pub struct StatusLog {
    store: SharedStore,
}

impl StatusLog {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn record(&self, event: StatusEvent) {
        match self.store.append_status(&event).await {
            Ok(()) => trace!("Status '{}' recorded for {}", event.note, event.device_id),
            Err(e) => debug!(
                "Dropping status '{}' for {}: {}",
                event.note, event.device_id, e
            ),
        }
    }
}
