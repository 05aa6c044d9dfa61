use crate::{
    prelude::*,
    simulation::Simulator,
    store,
    views::{admin, status, AdminPanel},
};
use args::{AdminCommand, Command};
use console::Console;
use std::io::Write;

mod args;
mod console;

#[derive(Clone, Deref, Debug)]
pub struct App(Arc<AppServices>);

#[derive(Debug)]
pub struct AppServices {
    pub config:    Arc<Configuration>,
    pub command:   Command,
    pub registry:  DeviceRegistry,
    pub simulator: Simulator,
}

impl App {
    pub async fn new() -> Result<Self> {
        let opts = args::parse()?;
        simplelog::TermLogger::init(
            match opts.verbosity {
                0 => simplelog::LevelFilter::Info,
                1 => simplelog::LevelFilter::Debug,
                _ => simplelog::LevelFilter::Trace,
            },
            simplelog::ConfigBuilder::new()
                .add_filter_allow_str("sweeper")
                .set_location_level(simplelog::LevelFilter::Debug)
                .set_target_level(simplelog::LevelFilter::Error)
                .set_time_format_str("%D %T")
                .set_time_to_local(true)
                .build(),
            simplelog::TerminalMode::Mixed,
        )?;
        if opts.generate {
            info!(
                "Generating new configuration file at {}",
                opts.config.to_string_lossy()
            );
            Configuration::generate_default(opts.config)?;
            std::process::exit(0);
        }
        let config = Configuration::load_or_default(opts.config)?;
        let store = store::from_config(&config.store)?;
        let registry = DeviceRegistry::new(store);
        let simulator = Simulator::new(registry.clone(), config.simulation.clone());
        Ok(App(Arc::new(AppServices {
            command: opts.command.unwrap_or_default(),
            config,
            registry,
            simulator,
        })))
    }

    pub async fn start(&self) -> Result<()> {
        match &self.command {
            Command::Console { room } => self.console(room.as_deref()).await,
            Command::Admin(command) => self.admin(command).await,
            Command::Status { watch } => {
                if *watch {
                    status::watch(&self.registry, self.config.console.status_refresh()).await
                } else {
                    println!("{}", status::snapshot(&self.registry).await);
                    Ok(())
                }
            }
        }
    }

    async fn console(&self, room: Option<&str>) -> Result<()> {
        let room = match room {
            Some(r) => r.parse()?,
            None => self.config.console.room(),
        };
        info!("Starting control console in {}", room);
        Console::new(
            self.simulator.clone(),
            room,
            self.config.simulation.low_battery_threshold,
            self.config.console.poll_period(),
        )
        .run()
        .await
    }

    async fn admin(&self, command: &AdminCommand) -> Result<()> {
        let panel = AdminPanel::new(self.registry.clone());
        match command {
            AdminCommand::List => {
                let rows = panel.list().await.context("Could not load robots")?;
                println!("{}", admin::render(&rows));
            }
            AdminCommand::Create { name } => {
                let p = panel.create_robot(name).await?;
                println!(
                    "Created robot {} ({}) with {} ({}) and {} ({})",
                    p.robot.name, p.robot.id, p.dock.name, p.dock.id, p.sensor.name, p.sensor.id
                );
            }
            AdminCommand::Rename { id, name } => {
                let robot = panel.rename_robot(id, name).await?;
                println!("Robot {} is now {}", robot.id, robot.name);
            }
            AdminCommand::Delete { id, yes } => {
                if !*yes && !confirm(&format!("Delete robot {} and its devices?", id)).await? {
                    println!("Cancelled");
                    return Ok(());
                }
                let removed = panel.delete_robot(id).await?;
                println!("Deleted {} devices: {}", removed.len(), removed.join(", "));
            }
        }
        Ok(())
    }
}

async fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let answer = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await??;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "si"))
}
