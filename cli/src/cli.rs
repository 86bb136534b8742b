// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, ffi::OsString, path::PathBuf};

use clap::{ArgMatches, Command, ValueHint, arg, builder::styling, crate_version, value_parser};
use colored::Colorize;
use icsync_core::APP_NAME;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::cmd_daemon::CmdDaemon;
use crate::cmd_events::CmdEvents;
use crate::cmd_subscription::{CmdAdd, CmdEdit, CmdList, CmdRemove};
use crate::cmd_sync::CmdSync;
use crate::config::parse_config;

/// Run the icsync command-line interface.
pub async fn run() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse() {
        Ok(cli) => {
            if let Err(e) = cli.run().await {
                println!("{} {}", "Error:".red(), e);
                std::process::exit(1);
            }
        }
        Err(e) => println!("{} {}", "Error:".red(), e),
    }
    Ok(())
}

/// Command-line interface
#[derive(Debug)]
pub struct Cli {
    /// Path to the configuration file
    pub config: Option<PathBuf>,

    /// The command to execute
    pub command: Commands,
}

impl Cli {
    /// Create the command-line interface
    pub fn command() -> Command {
        const STYLES: styling::Styles = styling::Styles::styled()
            .header(styling::AnsiColor::Green.on_default().bold())
            .usage(styling::AnsiColor::Green.on_default().bold())
            .literal(styling::AnsiColor::Blue.on_default().bold())
            .placeholder(styling::AnsiColor::Cyan.on_default());

        Command::new(APP_NAME)
            .about("Subscribe to ICS feeds and keep local calendars in sync.")
            .version(crate_version!())
            .styles(STYLES)
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                arg!(-c --config [CONFIG] "Path to the configuration file")
                    .long_help(
                        "\
Path to the configuration file. Defaults to $XDG_CONFIG_HOME/icsync/config.toml on Linux and \
MacOS, %LOCALAPPDATA%/icsync/config.toml on Windows.",
                    )
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
            .subcommand(CmdAdd::command())
            .subcommand(CmdEdit::command())
            .subcommand(CmdList::command())
            .subcommand(CmdRemove::command())
            .subcommand(CmdSync::command())
            .subcommand(CmdEvents::command())
            .subcommand(CmdDaemon::command())
    }

    /// Parse the command-line arguments
    pub fn parse() -> Result<Self, Box<dyn Error>> {
        let command = Self::command();
        let matches = command.get_matches();
        Self::from(matches)
    }

    /// Parse the specified arguments
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, Box<dyn Error>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let command = Self::command();
        let matches = command.try_get_matches_from(args)?;
        Self::from(matches)
    }

    /// Create a CLI instance from the `ArgMatches`
    pub fn from(matches: ArgMatches) -> Result<Self, Box<dyn Error>> {
        use Commands::*;
        let command = match matches.subcommand() {
            Some((CmdAdd::NAME, matches)) => Add(CmdAdd::from(matches)?),
            Some((CmdEdit::NAME, matches)) => Edit(CmdEdit::from(matches)?),
            Some((CmdList::NAME, matches)) => List(CmdList::from(matches)),
            Some((CmdRemove::NAME, matches)) => Remove(CmdRemove::from(matches)),
            Some((CmdSync::NAME, matches)) => Sync(CmdSync::from(matches)),
            Some((CmdEvents::NAME, matches)) => Events(CmdEvents::from(matches)),
            Some((CmdDaemon::NAME, matches)) => Daemon(CmdDaemon::from(matches)),
            _ => unreachable!(),
        };

        let config = matches.get_one("config").cloned();
        Ok(Cli { config, command })
    }

    /// Run the command
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        self.command.run(self.config).await
    }
}

/// The commands available in the CLI
#[derive(Debug, Clone)]
pub enum Commands {
    /// Subscribe to a feed
    Add(CmdAdd),

    /// Edit a subscription
    Edit(CmdEdit),

    /// List subscriptions
    List(CmdList),

    /// Remove a subscription
    Remove(CmdRemove),

    /// Sync now
    Sync(CmdSync),

    /// List materialized events
    Events(CmdEvents),

    /// Run the periodic sync loop
    Daemon(CmdDaemon),
}

impl Commands {
    /// Run the command with the given configuration
    pub async fn run(self, config: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
        tracing::debug!("parsing configuration...");
        let core_config = parse_config(config).await?;
        let app = App::open(core_config).await?;

        use Commands::*;
        let result = match self {
            Add(a) => a.run(&app).await,
            Edit(a) => a.run(&app).await,
            List(a) => a.run(&app).await,
            Remove(a) => a.run(&app).await,
            Sync(a) => a.run(&app).await,
            Events(a) => a.run(&app).await,
            Daemon(a) => a.run(&app).await,
        };

        app.close().await;
        result
    }
}
