mod associations;

use crate::{
    prelude::*,
    store::{SharedStore, StatusLog},
};
pub use associations::*;
use chrono::Utc;

/// In-memory device cache shared by the console, the admin commands and the
/// simulator. Refreshed wholesale from the store; every mutation goes through
/// the same write path (cache, then store, then status log).
#[derive(Clone, Debug, Deref)]
pub struct DeviceRegistry(Arc<DeviceRegistryInner>);

#[derive(Debug)]
pub struct DeviceRegistryInner {
    devices: RwLock<Vec<Device>>,
    store:   SharedStore,
    status:  StatusLog,
}

/// Normalizes raw records, skipping the ones that are not devices.
pub fn normalize(records: Vec<Record>) -> Vec<Device> {
    records
        .iter()
        .filter_map(|r| match Device::from_record(r) {
            Ok(d) => Some(d),
            Err(e) => {
                debug!("Skipping record: {}", e);
                None
            }
        })
        .collect()
}

impl DeviceRegistry {
    pub fn new(store: SharedStore) -> Self {
        Self(Arc::new(DeviceRegistryInner {
            devices: Default::default(),
            status: StatusLog::new(store.clone()),
            store,
        }))
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn status_log(&self) -> &StatusLog {
        &self.status
    }

    /// Replaces the cache with the store's current contents. On failure the
    /// previous contents stay in place.
    pub async fn refresh(&self) -> SweeperResult<usize> {
        let records = self.store.list().await?;
        let devices = normalize(records);
        let count = devices.len();
        *self.devices.write() = devices;
        debug!("Device cache refreshed with {} devices", count);
        Ok(count)
    }

    pub fn snapshot(&self) -> Vec<Device> {
        self.devices.read().clone()
    }

    pub fn get(&self, id: &str) -> SweeperResult<Device> {
        self.devices
            .read()
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| SweeperError::NotFoundLocal(id.into()))
    }

    pub fn get_robot(&self, id: &str) -> SweeperResult<Device> {
        let device = self.get(id)?;
        if device.is_robot() {
            Ok(device)
        } else {
            Err(SweeperError::NotARobot(id.into()))
        }
    }

    pub fn robots(&self) -> Vec<Device> {
        self.devices
            .read()
            .iter()
            .filter(|d| d.is_robot())
            .cloned()
            .collect()
    }

    pub fn robots_in(&self, room: Room) -> Vec<Device> {
        self.robots()
            .into_iter()
            .filter(|d| d.room == Some(room))
            .collect()
    }

    pub fn associated(&self, robot: &Device) -> Associated {
        find_associated_devices(robot, &self.devices.read())
    }

    /// Applies `f` to the cached device, stamps it and persists it.
    pub async fn mutate<F>(&self, id: &str, note: &str, f: F) -> SweeperResult<Device>
    where
        F: FnOnce(&mut Device) + Send,
    {
        let updated = {
            let mut devices = self.devices.write();
            let device = devices
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| SweeperError::NotFoundLocal(id.into()))?;
            f(device);
            device.last_used = Some(Utc::now());
            device.clone()
        };
        self.persist(&updated, note).await?;
        Ok(updated)
    }

    async fn persist(&self, device: &Device, note: &str) -> SweeperResult<()> {
        self.store.update(&device.id, &device.to_payload()).await?;
        self.status
            .record(StatusEvent::snapshot(device, note))
            .await;
        Ok(())
    }

    /// Creates a draft in the store and caches what the store returned.
    pub async fn create(&self, draft: &Device) -> SweeperResult<Device> {
        let record = self.store.create(&draft.to_payload()).await?;
        let created = Device::from_record(&record)?;
        self.devices.write().push(created.clone());
        self.status
            .record(StatusEvent::new(&created.id, Notes::CREATED))
            .await;
        Ok(created)
    }

    pub async fn delete(&self, id: &str) -> SweeperResult<()> {
        self.store.delete(id).await?;
        self.devices.write().retain(|d| d.id != id);
        self.status
            .record(StatusEvent::new(id, Notes::DELETED))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn seeded(records: serde_json::Value) -> (Arc<MemoryStore>, DeviceRegistry) {
        let records = records
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect();
        let store = Arc::new(MemoryStore::with_records(records));
        (store.clone(), DeviceRegistry::new(store))
    }

    #[tokio::test]
    async fn refresh_skips_foreign_records() {
        let (_, registry) = seeded(json!([
            {"id": "1", "name": "Robot Cocina", "tipo": "robot"},
            {"id": "2", "name": "Lamp", "tipo": "lamp"},
            {"name": "No id", "tipo": "dock"}
        ]));
        assert_eq!(1, registry.refresh().await.unwrap());
        assert_eq!(1, registry.robots_in(Room::Kitchen).len());
        assert!(registry.robots_in(Room::Bathroom).is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found_locally() {
        let (store, registry) = seeded(json!([]));
        registry.refresh().await.unwrap();
        match registry.mutate("42", Notes::UPDATED, |_| {}).await {
            Err(SweeperError::NotFoundLocal(id)) => assert_eq!("42", id),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(0, store.write_count());
    }

    #[tokio::test]
    async fn mutate_writes_cache_store_and_status() {
        let (store, registry) = seeded(json!([
            {"id": "1", "name": "Robot Sala", "tipo": "robot", "Obstaculo": true}
        ]));
        registry.refresh().await.unwrap();
        registry
            .mutate("1", Notes::OBSTACLE_CLEARED, |d| {
                if let DeviceKind::Robot { obstacle, .. } = &mut d.kind {
                    *obstacle = false;
                }
            })
            .await
            .unwrap();
        assert_eq!(Some(false), registry.get("1").unwrap().kind.obstacle());
        assert_eq!(json!(false), store.records()[0]["Obstaculo"]);
        assert!(store.records()[0].contains_key("Ultimo_uso"));
        let events = store.status_events();
        assert_eq!(1, events.len());
        assert_eq!(Notes::OBSTACLE_CLEARED, events[0].note);
        assert_eq!(Some(false), events[0].obstacle);
    }

    #[tokio::test]
    async fn status_failures_do_not_fail_writes() {
        let (store, registry) = seeded(json!([{"id": "1", "name": "Robot", "tipo": "robot"}]));
        registry.refresh().await.unwrap();
        store.fail_status_writes(true);
        assert!(registry.mutate("1", Notes::POWER_OFF, |d| d.active = false).await.is_ok());
        assert!(store.status_events().is_empty());
        assert_eq!(json!(false), store.records()[0]["Activo"]);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_cache() {
        #[derive(Debug)]
        struct Broken;

        #[async_trait::async_trait]
        impl crate::store::RecordStore for Broken {
            async fn list(&self) -> StoreResult<Vec<Record>> {
                Err(StoreError::Status {
                    method: "GET",
                    url:    "broken".into(),
                    status: 500,
                })
            }
            async fn get(&self, _: &str) -> StoreResult<Record> {
                unimplemented!()
            }
            async fn create(&self, _: &serde_json::Value) -> StoreResult<Record> {
                unimplemented!()
            }
            async fn update(&self, _: &str, _: &serde_json::Value) -> StoreResult<Record> {
                unimplemented!()
            }
            async fn delete(&self, _: &str) -> StoreResult<Record> {
                unimplemented!()
            }
            async fn append_status(&self, _: &StatusEvent) -> StoreResult<()> {
                unimplemented!()
            }
        }

        let registry = DeviceRegistry::new(Arc::new(Broken));
        registry.devices.write().push(Device::draft(
            "Robot Cuarto".into(),
            Room::Bedroom,
            None,
            DeviceKind::Robot {
                battery:    10,
                dirt_level: 10,
                obstacle:   false,
            },
        ));
        assert!(matches!(
            registry.refresh().await,
            Err(SweeperError::Store(StoreError::Status { status: 500, .. }))
        ));
        assert_eq!(1, registry.snapshot().len());
    }
}
