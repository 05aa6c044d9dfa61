use crate::{data_structures::time_format, prelude::*};
use comfy_table::Table;
use rand::Rng;

/// One line of the admin robot table.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminRow {
    pub id:        DeviceId,
    pub name:      String,
    pub room:      String,
    pub last_used: String,
}

impl From<&Device> for AdminRow {
    fn from(robot: &Device) -> Self {
        AdminRow {
            id:        robot.id.clone(),
            name:      robot.name.clone(),
            room:      robot.room.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
            last_used: robot
                .last_used
                .as_ref()
                .map(time_format::format_local)
                .unwrap_or_else(|| "-".into()),
        }
    }
}

pub fn render(rows: &[AdminRow]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Room", "Last used"]);
    for row in rows {
        table.add_row(vec![&row.id, &row.name, &row.room, &row.last_used]);
    }
    table.to_string()
}

/// A freshly provisioned robot with its companions.
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub robot:  Device,
    pub dock:   Device,
    pub sensor: Device,
}

/// Robot CRUD with companion provisioning and cascades.
#[derive(Debug, Clone)]
pub struct AdminPanel {
    registry: DeviceRegistry,
}

fn valid_name(name: &str) -> SweeperResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        Err(SweeperError::InvalidName)
    } else {
        Ok(name)
    }
}

impl AdminPanel {
    pub fn new(registry: DeviceRegistry) -> Self {
        Self { registry }
    }

    pub async fn list(&self) -> SweeperResult<Vec<AdminRow>> {
        self.registry.refresh().await?;
        Ok(self.registry.robots().iter().map(AdminRow::from).collect())
    }

    /// Creates a robot named `name` in the room its name points at, plus a
    /// dock and a sensor linked to it. Rejected without writing anything when
    /// that room already has a robot.
    pub async fn create_robot(&self, name: &str) -> SweeperResult<Provisioned> {
        let name = valid_name(name)?;
        self.registry.refresh().await?;
        let room = Room::from_name(name);
        if !self.registry.robots_in(room).is_empty() {
            return Err(SweeperError::RoomOccupied(room));
        }
        let (battery, dirt_level) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(1..=100), rng.gen_range(1..=100))
        };

        let robot = self
            .registry
            .create(&Device::draft(
                name.into(),
                room,
                None,
                DeviceKind::Robot {
                    battery,
                    dirt_level,
                    obstacle: false,
                },
            ))
            .await?;
        info!("Created robot {} ({}) in {}", robot.name, robot.id, room);
        let dock = self
            .registry
            .create(&Device::draft(
                companion_name("Dock", room),
                room,
                Some(robot.id.clone()),
                DeviceKind::Dock {
                    battery: robot.kind.battery(),
                },
            ))
            .await?;
        let sensor = self
            .registry
            .create(&Device::draft(
                companion_name("Sensor", room),
                room,
                Some(robot.id.clone()),
                DeviceKind::Sensor {
                    dirt_level: robot.kind.dirt_level(),
                },
            ))
            .await?;
        Ok(Provisioned {
            robot,
            dock,
            sensor,
        })
    }

    /// Renames a robot and moves its companions to the room the new name
    /// points at. Companions are found through the robot's old room.
    pub async fn rename_robot(&self, id: &str, new_name: &str) -> SweeperResult<Device> {
        let new_name = valid_name(new_name)?;
        self.registry.refresh().await?;
        let robot = self.registry.get_robot(id)?;
        let new_room = Room::from_name(new_name);
        let snapshot = self.registry.snapshot();
        let companions: Vec<Device> = linked_devices(&robot.id, robot.room, &snapshot)
            .into_iter()
            .cloned()
            .collect();

        let updated = self
            .registry
            .mutate(id, Notes::UPDATED, |d| {
                d.name = new_name.into();
                d.room = Some(new_room);
            })
            .await?;
        info!("Renamed robot {} to {}", id, new_name);

        for companion in companions {
            let name = if companion.is_dock_like() {
                Some(companion_name("Dock", new_room))
            } else if companion.is_sensor_like() {
                Some(companion_name("Sensor", new_room))
            } else {
                None
            };
            let result = self
                .registry
                .mutate(&companion.id, Notes::UPDATED, |d| {
                    if let Some(name) = name {
                        d.name = name;
                    }
                    d.room = Some(new_room);
                })
                .await;
            if let Err(e) = result {
                warn!("Could not update companion {}: {}", companion.id, e);
            }
        }
        Ok(updated)
    }

    /// Deletes a robot with every device linked to it by parent or by its
    /// room's naming. Returns the ids that were removed.
    pub async fn delete_robot(&self, id: &str) -> SweeperResult<Vec<DeviceId>> {
        self.registry.refresh().await?;
        let robot = match self.registry.get_robot(id) {
            Ok(robot) => Some(robot),
            Err(SweeperError::NotFoundLocal(_)) => None,
            Err(e) => return Err(e),
        };
        let room = robot.as_ref().and_then(|r| r.room);
        let snapshot = self.registry.snapshot();
        let mut targets: Vec<DeviceId> = linked_devices(id, room, &snapshot)
            .into_iter()
            .map(|d| d.id.clone())
            .collect();
        if robot.is_some() {
            targets.push(id.into());
        } else {
            warn!("Robot {} is not in the store, removing linked devices only", id);
        }

        let mut removed = vec![];
        for target in targets {
            match self.registry.delete(&target).await {
                Ok(()) => removed.push(target),
                Err(e) => warn!("Could not delete device {}: {}", target, e),
            }
        }
        Ok(removed)
    }
}
