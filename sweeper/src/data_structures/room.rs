use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum Room {
    #[display(fmt = "Kitchen")]
    Kitchen,
    #[display(fmt = "Bathroom")]
    Bathroom,
    #[display(fmt = "Bedroom")]
    Bedroom,
    #[display(fmt = "LivingRoom")]
    LivingRoom,
    #[display(fmt = "General")]
    General,
}

impl Room {
    pub const ALL: [Room; 5] = [
        Room::Kitchen,
        Room::Bathroom,
        Room::Bedroom,
        Room::LivingRoom,
        Room::General,
    ];

    /// Every label the room is known by in the store, display label first.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Room::Kitchen => &["Kitchen", "Cocina"],
            Room::Bathroom => &["Bathroom", "Baño", "Bano"],
            Room::Bedroom => &["Bedroom", "Cuarto"],
            Room::LivingRoom => &["LivingRoom", "Sala", "Living Room"],
            Room::General => &["General"],
        }
    }

    /// Infers the room from free text such as a robot name. Never fails,
    /// unmatched text lands in `General`.
    pub fn from_name(name: &str) -> Room {
        let name = name.to_lowercase();
        if name.contains("cocina") || name.contains("kitchen") {
            Room::Kitchen
        } else if name.contains("baño") || name.contains("bano") || name.contains("bathroom") {
            Room::Bathroom
        } else if name.contains("cuarto") || name.contains("bedroom") {
            Room::Bedroom
        } else if name.contains("sala") || name.contains("living") {
            Room::LivingRoom
        } else {
            Room::General
        }
    }

    /// Exact, case-insensitive label match.
    pub fn parse_label(label: &str) -> Option<Room> {
        let label = label.trim().to_lowercase();
        Room::ALL
            .iter()
            .copied()
            .find(|room| room.labels().iter().any(|l| l.to_lowercase() == label))
    }

    /// Resolves an explicit room field: a known label, else keyword inference
    /// over the field text.
    pub fn from_field(value: &str) -> Room {
        Room::parse_label(value).unwrap_or_else(|| Room::from_name(value))
    }
}

impl FromStr for Room {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Room::parse_label(s).ok_or_else(|| anyhow::anyhow!("Unknown room '{}'", s))
    }
}
