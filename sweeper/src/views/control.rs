use crate::{prelude::*, simulation::Simulator};
use comfy_table::Table;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Alert {
    #[display(fmt = "Low battery ({}%)", _0)]
    LowBattery(u8),
    #[display(fmt = "Obstacle detected")]
    Obstacle,
}

pub fn alerts_for(robot: &Device, low_battery: u8) -> Vec<Alert> {
    let mut alerts = vec![];
    if let DeviceKind::Robot {
        battery, obstacle, ..
    } = robot.kind
    {
        if battery < low_battery {
            alerts.push(Alert::LowBattery(battery));
        }
        if obstacle {
            alerts.push(Alert::Obstacle);
        }
    }
    alerts
}

/// One robot with its companions, as shown on the control panel.
#[derive(Debug, Clone)]
pub struct RobotCard {
    pub robot:    Device,
    pub dock:     Option<Device>,
    pub sensor:   Option<Device>,
    pub alerts:   Vec<Alert>,
    pub cleaning: bool,
    pub charging: bool,
}

impl RobotCard {
    /// Commands that resolve this card's alerts.
    pub fn hints(&self) -> Vec<String> {
        self.alerts
            .iter()
            .filter_map(|alert| match alert {
                Alert::LowBattery(_) if self.charging => None,
                Alert::LowBattery(_) if self.dock.is_some() => {
                    Some(format!("charge {}", self.robot.id))
                }
                Alert::LowBattery(_) => None,
                Alert::Obstacle => Some(format!("clear {}", self.robot.id)),
            })
            .collect()
    }
}

/// Room view built from the cache, never from the store.
#[derive(Debug, Clone)]
pub struct ControlPanel {
    pub room:  Room,
    pub cards: Vec<RobotCard>,
}

impl ControlPanel {
    pub fn build(simulator: &Simulator, room: Room, low_battery: u8) -> Self {
        let registry = simulator.registry();
        let cards = registry
            .robots_in(room)
            .into_iter()
            .map(|robot| {
                let Associated { dock, sensor } = registry.associated(&robot);
                RobotCard {
                    alerts: alerts_for(&robot, low_battery),
                    cleaning: simulator.is_cleaning(&robot.id),
                    charging: simulator.is_charging(&robot.id),
                    robot,
                    dock,
                    sensor,
                }
            })
            .collect();
        Self { room, cards }
    }
}

fn power(device: &Device) -> &'static str {
    if device.active {
        "on"
    } else {
        "off"
    }
}

fn percent(value: Option<u8>) -> String {
    value.map(|v| format!("{}%", v)).unwrap_or_else(|| "-".into())
}

fn mode(device: &Device) -> String {
    device
        .mode
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "-".into())
}

fn tabs(selected: Room) -> String {
    Room::ALL
        .iter()
        .map(|room| {
            if *room == selected {
                format!("[{}]", room)
            } else {
                format!(" {} ", room)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for ControlPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", tabs(self.room))?;
        if self.cards.is_empty() {
            return writeln!(f, "No robots in {}", self.room);
        }
        for card in &self.cards {
            let mut table = Table::new();
            table.set_header(vec!["Device", "Id", "Power", "Mode", "Battery", "Dirt", "Notes"]);
            let r = &card.robot;
            let mut notes = vec![];
            if card.cleaning {
                notes.push("brush running".to_string());
            }
            if card.charging {
                notes.push("charging".to_string());
            }
            table.add_row(vec![
                r.name.clone(),
                r.id.clone(),
                power(r).into(),
                mode(r),
                percent(r.kind.battery()),
                percent(r.kind.dirt_level()),
                notes.join(", "),
            ]);
            for companion in card.dock.iter().chain(card.sensor.iter()) {
                table.add_row(vec![
                    companion.name.clone(),
                    companion.id.clone(),
                    power(companion).into(),
                    mode(companion),
                    percent(companion.kind.battery()),
                    percent(companion.kind.dirt_level()),
                    String::new(),
                ]);
            }
            if card.dock.is_none() {
                table.add_row(vec!["(no dock)", "", "", "", "", "", ""]);
            }
            if card.sensor.is_none() {
                table.add_row(vec!["(no sensor)", "", "", "", "", "", ""]);
            }
            writeln!(f, "{}", table)?;
            for alert in &card.alerts {
                writeln!(f, "  ! {}", alert)?;
            }
            let hints = card.hints();
            if !hints.is_empty() {
                writeln!(f, "  > {}", hints.join(" | "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn robot(battery: u8, obstacle: bool) -> Device {
        let mut d = Device::draft(
            "Robot Sala".into(),
            Room::LivingRoom,
            None,
            DeviceKind::Robot {
                battery,
                dirt_level: 0,
                obstacle,
            },
        );
        d.id = "1".into();
        d
    }

    #[test]
    fn low_battery_is_strictly_below_threshold() {
        assert_eq!(vec![Alert::LowBattery(29)], alerts_for(&robot(29, false), 30));
        assert!(alerts_for(&robot(30, false), 30).is_empty());
        assert_eq!(
            vec![Alert::LowBattery(5), Alert::Obstacle],
            alerts_for(&robot(5, true), 30)
        );
    }

    #[test]
    fn hints_need_a_dock_to_charge() {
        let mut card = RobotCard {
            robot:    robot(10, true),
            dock:     None,
            sensor:   None,
            alerts:   alerts_for(&robot(10, true), 30),
            cleaning: false,
            charging: false,
        };
        assert_eq!(vec!["clear 1".to_string()], card.hints());
        card.dock = Some(robot(0, false));
        assert_eq!(vec!["charge 1", "clear 1"], card.hints());
        card.charging = true;
        assert_eq!(vec!["clear 1"], card.hints());
    }

    #[tokio::test]
    async fn builds_room_from_cache() {
        let records = json!([
            {"id": "1", "name": "Robot Sala", "tipo": "robot", "Bateria": 12},
            {"id": "2", "name": "Dock Sala", "tipo": "dock"},
            {"id": "3", "name": "Robot Cocina", "tipo": "robot"}
        ]);
        let records = records
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect();
        let registry = DeviceRegistry::new(Arc::new(MemoryStore::with_records(records)));
        registry.refresh().await.unwrap();
        let sim = Simulator::new(registry, Default::default());
        let panel = ControlPanel::build(&sim, Room::LivingRoom, 30);
        assert_eq!(1, panel.cards.len());
        assert_eq!("2", panel.cards[0].dock.as_ref().unwrap().id);
        assert!(panel.cards[0].sensor.is_none());
        let text = panel.to_string();
        assert!(text.contains("[LivingRoom]"));
        assert!(text.contains("Low battery (12%)"));
        assert!(text.contains("charge 1"));
        assert!(text.contains("(no sensor)"));
        assert!(ControlPanel::build(&sim, Room::Bedroom, 30)
            .to_string()
            .contains("No robots in Bedroom"));
    }

    #[tokio::test]
    async fn nameless_robot_shows_under_general() {
        let records = vec![json!({"id": "1", "tipo": "robot"}).as_object().cloned().unwrap()];
        let registry = DeviceRegistry::new(Arc::new(MemoryStore::with_records(records)));
        registry.refresh().await.unwrap();
        let sim = Simulator::new(registry, Default::default());
        let cards: Vec<(Room, usize)> = Room::ALL
            .iter()
            .map(|room| (*room, ControlPanel::build(&sim, *room, 30).cards.len()))
            .filter(|(_, n)| *n > 0)
            .collect();
        assert_eq!(vec![(Room::General, 1)], cards);
    }
}
