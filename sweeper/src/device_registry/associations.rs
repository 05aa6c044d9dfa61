use crate::prelude::*;

/// Dock and sensor paired with a robot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Associated {
    pub dock:   Option<Device>,
    pub sensor: Option<Device>,
}

/// `"Dock <room>"` style companion name, using the room's display label.
pub fn companion_name(prefix: &str, room: Room) -> String {
    format!("{} {}", prefix, room)
}

/// Case-insensitive exact match against `dock <label>` / `sensor <label>` for
/// every label the room is known by.
pub fn is_companion_name(name: &str, room: Room) -> bool {
    let name = name.trim().to_lowercase();
    room.labels().iter().any(|label| {
        let label = label.to_lowercase();
        name == format!("dock {}", label) || name == format!("sensor {}", label)
    })
}

/// Devices tied to `robot_id`, parent-linked ones first, then the ones named
/// after `room`. Store order is kept within each group.
pub fn linked_devices<'a>(
    robot_id: &str,
    room: Option<Room>,
    devices: &'a [Device],
) -> Vec<&'a Device> {
    let others = move || devices.iter().filter(move |d| d.id != robot_id);
    let by_parent = others().filter(|d| d.parent_id.as_deref() == Some(robot_id));
    let by_name = others().filter(|d| {
        d.parent_id.as_deref() != Some(robot_id)
            && room.map_or(false, |room| is_companion_name(&d.name, room))
    });
    by_parent.chain(by_name).collect()
}

pub fn find_associated_devices(robot: &Device, devices: &[Device]) -> Associated {
    let candidates = linked_devices(&robot.id, robot.room, devices);
    Associated {
        dock:   candidates.iter().find(|d| d.is_dock_like()).map(|d| (*d).clone()),
        sensor: candidates
            .iter()
            .find(|d| d.is_sensor_like())
            .map(|d| (*d).clone()),
    }
}
