use crate::{data_structures::time_format, prelude::*};
use comfy_table::Table;
use std::{future::Future, time::Duration};

pub fn status_label(device: &Device) -> String {
    if !device.active {
        return "Off".into();
    }
    match &device.mode {
        Some(mode) => mode.to_string(),
        None => "Unknown".into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusRow {
    pub id:        DeviceId,
    pub name:      String,
    pub kind:      &'static str,
    pub room:      String,
    pub status:    String,
    pub battery:   String,
    pub dirt:      String,
    pub last_used: String,
}

fn percent(value: Option<u8>) -> String {
    value.map(|v| format!("{}%", v)).unwrap_or_default()
}

pub fn rows(devices: &[Device]) -> Vec<StatusRow> {
    devices
        .iter()
        .map(|d| StatusRow {
            id:        d.id.clone(),
            name:      d.name.clone(),
            kind:      d.kind.type_name(),
            room:      d.room.map(|r| r.to_string()).unwrap_or_default(),
            status:    status_label(d),
            battery:   percent(d.kind.battery()),
            dirt:      percent(d.kind.dirt_level()),
            last_used: d
                .last_used
                .as_ref()
                .map(time_format::format_local)
                .unwrap_or_else(|| "-".into()),
        })
        .collect()
}

pub fn render(rows: &[StatusRow]) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        "Id", "Name", "Type", "Room", "Status", "Battery", "Dirt", "Last used",
    ]);
    for r in rows {
        table.add_row(vec![
            r.id.as_str(),
            &r.name,
            r.kind,
            &r.room,
            &r.status,
            &r.battery,
            &r.dirt,
            &r.last_used,
        ]);
    }
    table.to_string()
}

/// Refreshes the cache and renders every device. A failed refresh is logged
/// and the previous cache contents are shown instead.
pub async fn snapshot(registry: &DeviceRegistry) -> String {
    if let Err(e) = registry.refresh().await {
        error!("Could not load devices: {}", e);
    }
    render(&rows(&registry.snapshot()))
}

/// Prints the status table every `period` until Ctrl-C.
pub async fn watch(registry: &DeviceRegistry, period: Duration) -> Result<()> {
    watch_until(registry, period, tokio::signal::ctrl_c()).await
}

/// Like `watch`, stopping once `shutdown` completes. The same `shutdown`
/// future is polled across refreshes.
pub async fn watch_until<F: Future>(
    registry: &DeviceRegistry,
    period: Duration,
    shutdown: F,
) -> Result<()> {
    let mut interval = tokio::time::interval(period);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Signal received, stopping status watch");
                return Ok(());
            }
            _ = interval.tick() => {
                println!("{}", snapshot(registry).await);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn labels_follow_power_then_mode() {
        let record = |v: serde_json::Value| Device::from_record(v.as_object().unwrap()).unwrap();
        let off = record(json!({"id": "1", "tipo": "robot", "Activo": "no", "Modo": "Limpieza"}));
        let unknown = record(json!({"id": "2", "tipo": "dock"}));
        let reporting = record(json!({"id": "3", "tipo": "sensor", "Modo": "Reportando"}));
        assert_eq!("Off", status_label(&off));
        assert_eq!("Unknown", status_label(&unknown));
        assert_eq!("Reportando", status_label(&reporting));
    }

    #[tokio::test]
    async fn snapshot_lists_every_kind() {
        let records = json!([
            {"id": "1", "name": "Robot Cocina", "tipo": "robot", "Bateria": 40},
            {"id": "2", "name": "Dock Cocina", "tipo": "dock"},
            {"id": "3", "name": "Sensor Cocina", "tipo": "sensor", "Nivel_suciedad": 12}
        ]);
        let records = records
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect();
        let registry = DeviceRegistry::new(Arc::new(MemoryStore::with_records(records)));
        let text = snapshot(&registry).await;
        for expected in &["Robot Cocina", "dock", "sensor", "40%", "12%", "Unknown"] {
            assert!(text.contains(expected), "missing {}", expected);
        }
        let rows = rows(&registry.snapshot());
        assert_eq!(3, rows.len());
        assert_eq!("", rows[1].battery);
    }

    #[tokio::test(start_paused = true)]
    async fn watch_stops_on_a_long_lived_shutdown() {
        let registry = DeviceRegistry::new(Arc::new(MemoryStore::default()));
        let shutdown = tokio::time::sleep(Duration::from_secs(5));
        let watched = tokio::time::timeout(
            Duration::from_secs(60),
            watch_until(&registry, Duration::from_secs(2), shutdown),
        )
        .await;
        assert!(watched.unwrap().is_ok());
    }
}
