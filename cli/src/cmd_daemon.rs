// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::time::Duration;

use clap::{ArgMatches, Command};
use colored::Colorize;
use icsync_core::SyncScheduler;

use crate::app::App;

#[derive(Debug, Clone, Copy)]
pub struct CmdDaemon;

impl CmdDaemon {
    pub const NAME: &str = "daemon";

    pub fn command() -> Command {
        Command::new(Self::NAME).about("Run periodic sync passes until interrupted")
    }

    pub fn from(_matches: &ArgMatches) -> Self {
        Self
    }

    pub async fn run(self, app: &App) -> Result<(), Box<dyn Error>> {
        let minutes = app.config.sync_interval_minutes;
        let every = Duration::from_secs(u64::from(minutes) * 60);
        println!(
            "Syncing every {} minutes, press {} to stop",
            minutes.to_string().bold(),
            "Ctrl-C".bold()
        );

        let scheduler = SyncScheduler::spawn(app.syncer.clone(), every);
        wait_until_interrupted(&scheduler).await?;

        tracing::info!("interrupt received, shutting down");
        scheduler.shutdown().await;
        Ok(())
    }
}

/// Blocks until Ctrl-C. On unix, SIGHUP requests an immediate sync pass
/// without stopping the loop.
#[cfg(unix)]
async fn wait_until_interrupted(scheduler: &SyncScheduler) -> Result<(), Box<dyn Error>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => return Ok(res?),
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, requesting a sync pass");
                scheduler.trigger_now();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_until_interrupted(_scheduler: &SyncScheduler) -> Result<(), Box<dyn Error>> {
    Ok(tokio::signal::ctrl_c().await?)
}
