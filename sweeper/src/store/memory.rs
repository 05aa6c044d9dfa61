use super::RecordStore;
use crate::prelude::*;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// In-process record store. Keeps insertion order like the remote
/// collection and hands out incrementing numeric ids.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    records:     Vec<Record>,
    status:      Vec<StatusEvent>,
    next_id:     u64,
    writes:      u64,
    fail_status: bool,
}

impl MemoryState {
    fn count_write(&mut self) {
        self.writes += 1;
        trace!("Memory store write #{}", self.writes);
    }
}

fn record_id(record: &Record) -> Option<String> {
    field_str(record, FieldKeys::ID)
}

fn not_found(method: &'static str, id: &str) -> StoreError {
    StoreError::Status {
        method,
        url: format!("memory://devices/{}", id),
        status: 404,
    }
}

impl MemoryStore {
    pub fn with_records(records: Vec<Record>) -> Self {
        let next_id = records
            .iter()
            .filter_map(|r| record_id(r)?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            state: Mutex::new(MemoryState {
                records,
                next_id,
                ..Default::default()
            }),
        }
    }

    /// Seeds the store from a JSON array of device records.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read seed file {}!", path.display()))?;
        let records: Vec<Record> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse contents of {}!", path.display()))?;
        Ok(Self::with_records(records))
    }

    pub fn records(&self) -> Vec<Record> {
        self.state.lock().records.clone()
    }

    #[cfg(test)]
    pub fn status_events(&self) -> Vec<StatusEvent> {
        self.state.lock().status.clone()
    }

    /// Number of create, update and delete calls that reached the store.
    #[cfg(test)]
    pub fn write_count(&self) -> u64 {
        self.state.lock().writes
    }

    /// Makes every subsequent status append fail.
    #[cfg(test)]
    pub fn fail_status_writes(&self, fail: bool) {
        self.state.lock().fail_status = fail;
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Record>> {
        Ok(self.records())
    }

    async fn get(&self, id: &str) -> StoreResult<Record> {
        let state = self.state.lock();
        state
            .records
            .iter()
            .find(|r| record_id(r).as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| not_found("GET", id))
    }

    async fn create(&self, payload: &Value) -> StoreResult<Record> {
        let mut record = payload
            .as_object()
            .cloned()
            .ok_or_else(|| StoreError::Decode("payload is not an object".into()))?;
        let mut state = self.state.lock();
        state.count_write();
        state.next_id += 1;
        record.insert("id".into(), Value::String(state.next_id.to_string()));
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, payload: &Value) -> StoreResult<Record> {
        let fields = payload
            .as_object()
            .ok_or_else(|| StoreError::Decode("payload is not an object".into()))?;
        let mut state = self.state.lock();
        state.count_write();
        let record = state
            .records
            .iter_mut()
            .find(|r| record_id(r).as_deref() == Some(id))
            .ok_or_else(|| not_found("PUT", id))?;
        for (k, v) in fields {
            if !FieldKeys::ID.contains(&k.as_str()) {
                record.insert(k.clone(), v.clone());
            }
        }
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<Record> {
        let mut state = self.state.lock();
        state.count_write();
        let pos = state
            .records
            .iter()
            .position(|r| record_id(r).as_deref() == Some(id))
            .ok_or_else(|| not_found("DELETE", id))?;
        Ok(state.records.remove(pos))
    }

    async fn append_status(&self, event: &StatusEvent) -> StoreResult<()> {
        let mut state = self.state.lock();
        if state.fail_status {
            return Err(StoreError::Status {
                method: "POST",
                url:    "memory://status".into(),
                status: 503,
            });
        }
        state.status.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn assigns_ids_after_seeded_records() {
        let store = MemoryStore::with_records(vec![json!({"id": "4", "tipo": "robot"})
            .as_object()
            .cloned()
            .unwrap()]);
        let created = store.create(&json!({"name": "Dock Kitchen"})).await.unwrap();
        assert_eq!(json!("5"), created["id"]);
        assert_eq!(2, store.list().await.unwrap().len());
        assert_eq!(1, store.write_count());
    }

    #[tokio::test]
    async fn update_merges_and_keeps_id() {
        let store = MemoryStore::default();
        let created = store
            .create(&json!({"name": "Robot Sala", "Bateria": 10}))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();
        let updated = store
            .update(&id, &json!({"Bateria": 15, "id": "99"}))
            .await
            .unwrap();
        assert_eq!(json!(15), updated["Bateria"]);
        assert_eq!(json!("Robot Sala"), updated["name"]);
        assert_eq!(json!(id), updated["id"]);
    }

    #[tokio::test]
    async fn missing_records_are_404() {
        let store = MemoryStore::default();
        match store.delete("1").await {
            Err(StoreError::Status { status, .. }) => assert_eq!(404, status),
            other => panic!("unexpected {:?}", other),
        }
        assert!(store.get("1").await.is_err());
    }

    #[test]
    fn loads_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"[{"id": "1", "name": "Robot Cocina", "tipo": "robot"}]"#,
        )
        .unwrap();
        let store = MemoryStore::load(file.path()).unwrap();
        assert_eq!(1, store.records().len());
    }
}
