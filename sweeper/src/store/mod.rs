use crate::prelude::*;
use async_trait::async_trait;
use serde_json::Value;

mod http;
mod memory;
mod status_log;

pub use http::HttpStore;
pub use memory::MemoryStore;
pub use status_log::StatusLog;

/// The remote collection of device records plus its write-only status feed.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    async fn list(&self) -> StoreResult<Vec<Record>>;
    async fn get(&self, id: &str) -> StoreResult<Record>;
    async fn create(&self, payload: &Value) -> StoreResult<Record>;
    async fn update(&self, id: &str, payload: &Value) -> StoreResult<Record>;
    async fn delete(&self, id: &str) -> StoreResult<Record>;
    async fn append_status(&self, event: &StatusEvent) -> StoreResult<()>;
}

pub type SharedStore = Arc<dyn RecordStore>;

pub fn from_config(config: &StoreConfiguration) -> Result<SharedStore> {
    match config.backend {
        StoreBackend::Http => {
            info!("Using record store at {}", config.base_url);
            Ok(Arc::new(HttpStore::new(config)?))
        }
        StoreBackend::Memory => {
            let store = match &config.seed_file {
                Some(path) => {
                    info!("Using in-memory record store seeded from {}", path.display());
                    MemoryStore::load(path)?
                }
                None => {
                    info!("Using empty in-memory record store");
                    MemoryStore::default()
                }
            };
            Ok(Arc::new(store))
        }
    }
}
