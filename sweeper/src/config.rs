use crate::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    io::{Read, Write},
    path::PathBuf,
    time::Duration,
};

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "snake_case", default)]
pub struct Configuration {
    pub store:      Arc<StoreConfiguration>,
    pub simulation: Arc<SimulationConfiguration>,
    pub console:    Arc<ConsoleConfiguration>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Http,
    Memory,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields, rename_all = "snake_case", default)]
pub struct StoreConfiguration {
    pub backend:      StoreBackend,
    pub base_url:     String,
    pub devices_path: String,
    pub status_path:  String,
    /// JSON array of device records loaded by the memory backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_file:    Option<PathBuf>,
}

impl Default for StoreConfiguration {
    fn default() -> Self {
        StoreConfiguration {
            backend:      StoreBackend::Http,
            base_url:     "https://68cc9d85716562cf5077edc6.mockapi.io/api/v1".into(),
            devices_path: "devices".into(),
            status_path:  "status".into(),
            seed_file:    None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields, rename_all = "snake_case", default)]
pub struct SimulationConfiguration {
    pub charge_step_ms:         u64,
    pub charge_step_amount:     u8,
    pub clean_step_ms:          u64,
    pub clean_step_amount:      u8,
    pub sensor_report_secs:     u64,
    pub obstacle_interval_secs: u64,
    pub obstacle_probability:   f64,
    pub low_battery_threshold:  u8,
    /// Fixed seed for the obstacle dice. Unset means seeded from entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed:                   Option<u64>,
}

impl Default for SimulationConfiguration {
    fn default() -> Self {
        SimulationConfiguration {
            charge_step_ms:         1000,
            charge_step_amount:     5,
            clean_step_ms:          1000,
            clean_step_amount:      1,
            sensor_report_secs:     120,
            obstacle_interval_secs: 300,
            obstacle_probability:   0.1,
            low_battery_threshold:  30,
            seed:                   None,
        }
    }
}

impl SimulationConfiguration {
    pub fn charge_period(&self) -> Duration {
        Duration::from_millis(self.charge_step_ms.max(1))
    }

    pub fn clean_period(&self) -> Duration {
        Duration::from_millis(self.clean_step_ms.max(1))
    }

    pub fn sensor_report_period(&self) -> Duration {
        Duration::from_secs(self.sensor_report_secs.max(1))
    }

    pub fn obstacle_period(&self) -> Duration {
        Duration::from_secs(self.obstacle_interval_secs.max(1))
    }

    /// Probability clamped into `[0, 1]`; NaN disables injection.
    pub fn obstacle_chance(&self) -> f64 {
        if self.obstacle_probability.is_nan() {
            0.0
        } else {
            self.obstacle_probability.max(0.0).min(1.0)
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields, rename_all = "snake_case", default)]
pub struct ConsoleConfiguration {
    pub default_room:        String,
    pub status_refresh_secs: u64,
    /// How often the console reloads devices from the store.
    pub poll_ms:             u64,
}

impl Default for ConsoleConfiguration {
    fn default() -> Self {
        ConsoleConfiguration {
            default_room:        "Kitchen".into(),
            status_refresh_secs: 10,
            poll_ms:             2000,
        }
    }
}

impl ConsoleConfiguration {
    pub fn room(&self) -> Room {
        self.default_room.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown default room '{}', falling back to {}",
                self.default_room,
                Room::General
            );
            Room::General
        })
    }

    pub fn status_refresh(&self) -> Duration {
        Duration::from_secs(self.status_refresh_secs.max(1))
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }
}

impl Configuration {
    pub fn load(file: PathBuf) -> Result<Arc<Self>> {
        let path = file.to_string_lossy().to_string();
        let mut f = std::fs::File::open(&file)
            .with_context(|| format!("Could not load configuration from file {}!", path))?;
        let mut contents = String::new();
        f.read_to_string(&mut contents)?;
        let c = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse contents of {}!", path))?;
        Ok(Arc::new(c))
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(file: PathBuf) -> Result<Arc<Self>> {
        if file.exists() {
            Self::load(file)
        } else {
            info!(
                "No configuration at {}, using defaults",
                file.to_string_lossy()
            );
            Ok(Arc::new(Self::default()))
        }
    }

    pub fn generate_default(file: PathBuf) -> Result<()> {
        let path = file.to_string_lossy().to_string();
        let config = Self::default();
        let content = toml::to_vec(&config)?;
        let mut f = std::fs::File::create(&file)
            .with_context(|| format!("Could not create file {}!", path))?;
        f.write_all(&content)?;
        Ok(())
    }
}
