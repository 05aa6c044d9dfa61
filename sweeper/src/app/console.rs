use crate::{prelude::*, simulation::Simulator, views::ControlPanel};
use std::{future::Future, io::BufRead, str::FromStr, time::Duration};
use tokio::sync::mpsc;

const HELP: &str = "\
Commands:
  room <name>   switch to another room
  power <id>    toggle a device on or off
  brush <id>    start or stop cleaning
  charge <id>   charge a robot at its dock
  clear <id>    clear a robot's obstacle
  refresh       reload devices from the store
  show          render the current room
  help          this text
  quit          stop timers and exit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Room(Room),
    Power(DeviceId),
    Brush(DeviceId),
    Charge(DeviceId),
    Clear(DeviceId),
    Refresh,
    Show,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, arg) = match line.find(char::is_whitespace) {
            Some(i) => (&line[..i], line[i..].trim()),
            None => (line, ""),
        };
        let id = || -> Result<DeviceId> {
            if arg.is_empty() {
                Err(anyhow!("'{}' needs a device id", verb))
            } else {
                Ok(arg.to_string())
            }
        };
        Ok(match verb.to_lowercase().as_str() {
            "room" => ConsoleCommand::Room(arg.parse()?),
            "power" => ConsoleCommand::Power(id()?),
            "brush" => ConsoleCommand::Brush(id()?),
            "charge" => ConsoleCommand::Charge(id()?),
            "clear" => ConsoleCommand::Clear(id()?),
            "refresh" => ConsoleCommand::Refresh,
            "show" | "" => ConsoleCommand::Show,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => return Err(anyhow!("Unknown command '{}', try 'help'", other)),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Render,
    Message(String),
    Quit,
}

/// Interactive control panel bound to one room at a time.
#[derive(Debug)]
pub struct Console {
    simulator:   Simulator,
    room:        Room,
    low_battery: u8,
    poll:        Duration,
}

impl Console {
    pub fn new(simulator: Simulator, room: Room, low_battery: u8, poll: Duration) -> Self {
        Self {
            simulator,
            room,
            low_battery,
            poll,
        }
    }

    #[cfg(test)]
    pub fn room(&self) -> Room {
        self.room
    }

    pub fn render(&self) -> String {
        ControlPanel::build(&self.simulator, self.room, self.low_battery).to_string()
    }

    /// Reloads the cache. A failure keeps the previous contents.
    pub async fn load(&self) -> SweeperResult<usize> {
        self.simulator.registry().refresh().await
    }

    pub async fn execute(&mut self, command: ConsoleCommand) -> SweeperResult<Outcome> {
        let sim = &self.simulator;
        Ok(match command {
            ConsoleCommand::Room(room) => {
                self.room = room;
                Outcome::Render
            }
            ConsoleCommand::Power(id) => {
                sim.toggle_power(&id).await?;
                Outcome::Render
            }
            ConsoleCommand::Brush(id) => {
                sim.toggle_brush(&id).await?;
                Outcome::Render
            }
            ConsoleCommand::Charge(id) => {
                if sim.start_charging(&id)? {
                    Outcome::Render
                } else {
                    Outcome::Message(format!("Robot {} is already charging", id))
                }
            }
            ConsoleCommand::Clear(id) => {
                sim.clear_obstacle(&id).await?;
                Outcome::Render
            }
            ConsoleCommand::Refresh => {
                self.load().await?;
                Outcome::Render
            }
            ConsoleCommand::Show => Outcome::Render,
            ConsoleCommand::Help => Outcome::Message(HELP.into()),
            ConsoleCommand::Quit => Outcome::Quit,
        })
    }

    /// Reads commands until `quit`, end of input or Ctrl-C, then stops every
    /// timer. The cache is re-polled in the background while it runs.
    pub async fn run(self) -> Result<()> {
        self.run_until(spawn_stdin_reader(), tokio::signal::ctrl_c()).await
    }

    async fn run_until<F: Future>(
        mut self,
        mut lines: mpsc::Receiver<String>,
        shutdown: F,
    ) -> Result<()> {
        if let Err(e) = self.load().await {
            error!("Could not load devices: {}", e);
            println!("! Could not load devices: {}", e);
        }
        self.simulator.start_cycles();
        self.simulator.start_polling(self.poll);
        println!("{}", self.render());

        tokio::pin!(shutdown);
        loop {
            let line = tokio::select! {
                _ = &mut shutdown => {
                    warn!("Signal received, shutting down");
                    break;
                }
                line = lines.recv() => match line {
                    Some(line) => line,
                    None => break,
                },
            };
            let command = match line.parse::<ConsoleCommand>() {
                Ok(c) => c,
                Err(e) => {
                    println!("! {}", e);
                    continue;
                }
            };
            match self.execute(command).await {
                Ok(Outcome::Render) => println!("{}", self.render()),
                Ok(Outcome::Message(m)) => println!("{}", m),
                Ok(Outcome::Quit) => break,
                Err(e) => {
                    error!("Action failed: {}", e);
                    println!("! {}", e);
                    println!("{}", self.render());
                }
            }
        }
        self.simulator.stop_all();
        Ok(())
    }
}

/// Blocking stdin on its own thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Could not read from stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}
