mod tasks;

use crate::{prelude::*, util::*};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tasks::TaskTable;
use tokio_util::sync::CancellationToken;

/// Time-driven device behaviour: charging ramps, brush cleaning, the sensor
/// report cycle and random obstacle injection.
#[derive(Clone, Deref)]
pub struct Simulator(Arc<SimulatorData>);

pub struct SimulatorData {
    registry: DeviceRegistry,
    config:   Arc<SimulationConfiguration>,
    charging: TaskTable,
    cleaning: TaskTable,
    cycles:   CancellationToken,
    rng:      Mutex<StdRng>,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("charging", &self.charging)
            .field("cleaning", &self.cleaning)
            .finish()
    }
}

impl Simulator {
    pub fn new(registry: DeviceRegistry, config: Arc<SimulationConfiguration>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Simulator(Arc::new(SimulatorData {
            charging: TaskTable::default(),
            cleaning: TaskTable::default(),
            cycles: CancellationToken::new(),
            rng: Mutex::new(rng),
            registry,
            config,
        }))
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn is_charging(&self, id: &str) -> bool {
        self.charging.is_running(id)
    }

    pub fn is_cleaning(&self, id: &str) -> bool {
        self.cleaning.is_running(id)
    }

    /// Starts topping up a robot's battery at its dock. `Ok(false)` when the
    /// robot is already charging.
    pub fn start_charging(&self, robot_id: &str) -> SweeperResult<bool> {
        let robot = self.registry.get_robot(robot_id)?;
        if self.registry.associated(&robot).dock.is_none() {
            return Err(SweeperError::NoDock(robot_id.into()));
        }
        let claim = match self.charging.claim(robot_id) {
            Some(c) => c,
            None => {
                debug!("Robot {} is already charging", robot_id);
                return Ok(false);
            }
        };
        info!("Charging robot {} ({}%)", robot.name, robot.kind.battery().unwrap_or_default());
        let zelf = self.clone();
        start_service(
            self.config.charge_period(),
            format!("Charging {}", robot_id),
            false,
            claim.token.clone(),
            move || {
                let zelf = zelf.clone();
                let claim = claim.clone();
                async move {
                    let tick = zelf.charge_tick(&claim.id).await;
                    if let Ok(Tick::Done) = tick {
                        zelf.charging.release(&claim);
                    }
                    tick
                }
            },
        );
        Ok(true)
    }

    async fn charge_tick(&self, id: &str) -> Result<Tick> {
        let step = self.config.charge_step_amount;
        let updated = self
            .registry
            .mutate(id, Notes::CHARGING, |d| {
                if let DeviceKind::Robot { battery, .. } = &mut d.kind {
                    *battery = battery.saturating_add(step).min(100);
                }
            })
            .await;
        match updated {
            Ok(robot) => {
                let battery = robot.kind.battery().unwrap_or(100);
                trace!("Robot {} battery at {}%", id, battery);
                if battery >= 100 {
                    info!("Robot {} fully charged", robot.name);
                    Ok(Tick::Done)
                } else {
                    Ok(Tick::Continue)
                }
            }
            Err(SweeperError::NotFoundLocal(_)) => {
                warn!("Robot {} disappeared while charging", id);
                Ok(Tick::Done)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Flips the brush. Returns whether the robot is cleaning afterwards.
    pub async fn toggle_brush(&self, robot_id: &str) -> SweeperResult<bool> {
        if self.is_cleaning(robot_id) {
            self.stop_cleaning(robot_id).await?;
            Ok(false)
        } else {
            self.start_cleaning(robot_id).await?;
            Ok(true)
        }
    }

    /// Switches a robot to cleaning mode and starts draining its dirt level.
    /// `Ok(false)` when the brush is already running.
    pub async fn start_cleaning(&self, robot_id: &str) -> SweeperResult<bool> {
        let robot = self.registry.get_robot(robot_id)?;
        let claim = match self.cleaning.claim(robot_id) {
            Some(c) => c,
            None => return Ok(false),
        };
        info!("Cleaning with robot {}", robot.name);
        let zelf = self.clone();
        start_service(
            self.config.clean_period(),
            format!("Cleaning {}", robot_id),
            false,
            claim.token.clone(),
            move || {
                let zelf = zelf.clone();
                let claim = claim.clone();
                async move {
                    let tick = zelf.clean_tick(&claim.id).await;
                    if let Ok(Tick::Done) = tick {
                        zelf.cleaning.release(&claim);
                    }
                    tick
                }
            },
        );
        // The brush runs even if this write fails; the next tick persists again.
        self.registry
            .mutate(robot_id, Notes::CLEANING_STARTED, |d| {
                d.mode = Some(Mode::Cleaning)
            })
            .await?;
        Ok(true)
    }

    async fn clean_tick(&self, id: &str) -> Result<Tick> {
        let step = self.config.clean_step_amount;
        let updated = self
            .registry
            .mutate(id, Notes::CLEANING, |d| {
                if let DeviceKind::Robot { dirt_level, .. } = &mut d.kind {
                    *dirt_level = dirt_level.saturating_sub(step);
                    if *dirt_level == 0 {
                        d.mode = Some(Mode::Idle);
                    }
                }
            })
            .await;
        match updated {
            Ok(robot) => {
                if robot.kind.dirt_level().unwrap_or_default() == 0 {
                    info!("Robot {} finished cleaning", robot.name);
                    Ok(Tick::Done)
                } else {
                    Ok(Tick::Continue)
                }
            }
            Err(SweeperError::NotFoundLocal(_)) => {
                warn!("Robot {} disappeared while cleaning", id);
                Ok(Tick::Done)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Cancels the brush and puts the robot back to idle. `Ok(false)` when
    /// it was not cleaning.
    pub async fn stop_cleaning(&self, robot_id: &str) -> SweeperResult<bool> {
        if !self.cleaning.stop(robot_id) {
            return Ok(false);
        }
        info!("Stopping brush on robot {}", robot_id);
        self.registry
            .mutate(robot_id, Notes::CLEANING_STOPPED, |d| d.mode = Some(Mode::Idle))
            .await?;
        Ok(true)
    }

    /// Flips the power flag of any device. Powering a robot off stops its brush.
    pub async fn toggle_power(&self, id: &str) -> SweeperResult<Device> {
        let device = self.registry.get(id)?;
        let turning_off = device.active;
        let was_cleaning = turning_off && self.cleaning.stop(id);
        let note = if turning_off {
            Notes::POWER_OFF
        } else {
            Notes::POWER_ON
        };
        self.registry
            .mutate(id, note, |d| {
                d.active = !turning_off;
                if was_cleaning {
                    d.mode = Some(Mode::Idle);
                }
            })
            .await
    }

    pub async fn clear_obstacle(&self, robot_id: &str) -> SweeperResult<Device> {
        self.registry.get_robot(robot_id)?;
        self.registry
            .mutate(robot_id, Notes::OBSTACLE_CLEARED, |d| {
                if let DeviceKind::Robot { obstacle, .. } = &mut d.kind {
                    *obstacle = false;
                }
            })
            .await
    }

    /// One sensor report cycle: every active sensor posts its dirt reading.
    /// Returns how many sensors reported.
    pub async fn report_sensors(&self) -> usize {
        let sensors: Vec<Device> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|d| d.is_sensor() && d.active)
            .collect();
        for sensor in &sensors {
            self.registry
                .status_log()
                .record(StatusEvent::reading(sensor, Notes::SENSOR_REPORT))
                .await;
        }
        debug!("{} sensors reported", sensors.len());
        sensors.len()
    }

    /// One obstacle injection cycle: each active robot independently gets an
    /// obstacle with the configured probability. Returns the robots hit.
    pub async fn inject_obstacles(&self) -> Vec<DeviceId> {
        let chance = self.config.obstacle_chance();
        let robots: Vec<DeviceId> = self
            .registry
            .robots()
            .into_iter()
            .filter(|d| d.active)
            .map(|d| d.id)
            .collect();
        let mut hit = vec![];
        for id in robots {
            let roll = self.rng.lock().gen_bool(chance);
            if !roll {
                continue;
            }
            let result = self
                .registry
                .mutate(&id, Notes::OBSTACLE_DETECTED, |d| {
                    if let DeviceKind::Robot { obstacle, .. } = &mut d.kind {
                        *obstacle = true;
                    }
                })
                .await;
            if let Err(e) = result {
                warn!("Could not persist obstacle on robot {}: {}", id, e);
            } else {
                info!("Obstacle detected by robot {}", id);
            }
            hit.push(id);
        }
        hit
    }

    /// Starts the sensor report and obstacle injection cycles.
    pub fn start_cycles(&self) {
        let zelf = self.clone();
        start_service(
            self.config.sensor_report_period(),
            "Sensor reports".into(),
            false,
            self.cycles.child_token(),
            move || {
                let zelf = zelf.clone();
                async move {
                    zelf.report_sensors().await;
                    Ok(Tick::Continue)
                }
            },
        );
        let zelf = self.clone();
        start_service(
            self.config.obstacle_period(),
            "Obstacle injection".into(),
            false,
            self.cycles.child_token(),
            move || {
                let zelf = zelf.clone();
                async move {
                    zelf.inject_obstacles().await;
                    Ok(Tick::Continue)
                }
            },
        );
    }

    /// Reloads the cache from the store every `period` so changes made by
    /// other clients show up. Stopped by `stop_all`.
    pub fn start_polling(&self, period: std::time::Duration) {
        let zelf = self.clone();
        start_service(
            period,
            "Device polling".into(),
            false,
            self.cycles.child_token(),
            move || {
                let zelf = zelf.clone();
                async move {
                    if let Err(e) = zelf.registry.refresh().await {
                        warn!("Could not poll devices: {}", e);
                    }
                    Ok(Tick::Continue)
                }
            },
        );
    }

    /// Cancels every cycle and per-robot timer.
    pub fn stop_all(&self) {
        self.cycles.cancel();
        self.charging.stop_all();
        self.cleaning.stop_all();
    }
}
