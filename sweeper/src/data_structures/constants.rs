/// Candidate keys for each logical record attribute, in lookup order.
///
/// Producers of the device collection disagree on casing and naming, so every
/// attribute is resolved through `get_field` with one of these lists. Each key
/// is also tried lowercased.
pub struct FieldKeys;

impl FieldKeys {
    pub const ID: &'static [&'static str] = &["id", "ID"];
    pub const NAME: &'static [&'static str] = &["name", "Nombre"];
    pub const TYPE: &'static [&'static str] = &["tipo", "Tipo", "type"];
    pub const ROOM: &'static [&'static str] = &["Ubicacion", "location", "room"];
    pub const PARENT: &'static [&'static str] = &["parentId", "parent", "parent_id"];
    pub const ACTIVE: &'static [&'static str] = &["Activo", "activo", "isOnline"];
    pub const MODE: &'static [&'static str] = &["Modo", "mode"];
    pub const BATTERY: &'static [&'static str] = &["Bateria", "battery"];
    pub const DIRT_LEVEL: &'static [&'static str] = &["Nivel_suciedad", "dirtLevel"];
    pub const OBSTACLE: &'static [&'static str] = &["Obstaculo", "obstacle"];
    pub const LAST_USED: &'static [&'static str] =
        &["Ultimo_uso", "lastSeen", "lastUsed", "createdAt"];
}

pub struct Notes;

impl Notes {
    pub const CREATED: &'static str = "Created";
    pub const UPDATED: &'static str = "Updated";
    pub const DELETED: &'static str = "Deleted";
    pub const POWER_ON: &'static str = "Powered on";
    pub const POWER_OFF: &'static str = "Powered off";
    pub const CHARGING: &'static str = "Charging";
    pub const CLEANING_STARTED: &'static str = "Cleaning started";
    pub const CLEANING: &'static str = "Cleaning";
    pub const CLEANING_STOPPED: &'static str = "Cleaning stopped";
    pub const OBSTACLE_DETECTED: &'static str = "Obstacle detected";
    pub const OBSTACLE_CLEARED: &'static str = "Obstacle cleared";
    pub const SENSOR_REPORT: &'static str = "Sensor report";
}
