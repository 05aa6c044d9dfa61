use crate::prelude::*;
use std::path::PathBuf;
use structopt::{clap::AppSettings::*, StructOpt};

pub fn parse() -> Result<Options> {
    Ok(Options::from_args())
}

#[derive(StructOpt, Debug)]
#[structopt(
    name = "sweeper",
    rename_all = "kebab_case",
    author,
    about,
    settings = &[DeriveDisplayOrder, DisableHelpSubcommand, UnifiedHelpMessage]
)]
pub struct Options {
    /// Location of the configuration file
    #[structopt(short = "c", long, parse(from_os_str), default_value = "sweeper.toml")]
    pub config: PathBuf,

    /// Generate configuration with default values
    #[structopt(short, long)]
    pub generate: bool,

    /// Verbosity level of output
    #[structopt(short = "v", long, parse(from_occurrences))]
    pub verbosity: u64,

    #[structopt(subcommand)]
    pub command: Option<Command>,
}

#[derive(StructOpt, Debug, Clone, PartialEq)]
#[structopt(rename_all = "kebab_case")]
pub enum Command {
    /// Interactive control panel for one room at a time
    Console {
        /// Room shown first, defaults to console.default_room
        #[structopt(short, long)]
        room: Option<String>,
    },
    /// Robot administration
    Admin(AdminCommand),
    /// Status table of every device
    Status {
        /// Keep refreshing until interrupted
        #[structopt(short, long)]
        watch: bool,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Console { room: None }
    }
}

#[derive(StructOpt, Debug, Clone, PartialEq)]
#[structopt(rename_all = "kebab_case")]
pub enum AdminCommand {
    /// List robots
    List,
    /// Create a robot with its dock and sensor
    Create { name: String },
    /// Rename a robot and move its companions
    Rename { id: String, name: String },
    /// Delete a robot and its companions
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[structopt(short, long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Options {
        Options::from_iter_safe(args).unwrap()
    }

    #[test]
    fn console_is_the_default() {
        let opts = parse(&["sweeper"]);
        assert_eq!(PathBuf::from("sweeper.toml"), opts.config);
        assert_eq!(Command::default(), opts.command.unwrap_or_default());
    }

    #[test]
    fn admin_subcommands() {
        let opts = parse(&["sweeper", "-vv", "admin", "delete", "7", "--yes"]);
        assert_eq!(2, opts.verbosity);
        assert_eq!(
            Some(Command::Admin(AdminCommand::Delete {
                id:  "7".into(),
                yes: true,
            })),
            opts.command
        );
        let opts = parse(&["sweeper", "admin", "rename", "3", "Robot Sala"]);
        assert_eq!(
            Some(Command::Admin(AdminCommand::Rename {
                id:   "3".into(),
                name: "Robot Sala".into(),
            })),
            opts.command
        );
    }
}
