// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command, arg, value_parser};
use colored::Colorize;
use icsync_core::{CancelFlag, PassOutcome, SubscriptionReport};

use crate::app::App;
use crate::util::{CommonArgs, OutputFormat};

#[derive(Debug, Clone, Copy)]
pub struct CmdSync {
    /// Sync only this subscription instead of a full pass.
    pub id: Option<i64>,
    pub output_format: OutputFormat,
}

impl CmdSync {
    pub const NAME: &str = "sync";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Fetch and reconcile subscriptions now")
            .arg(arg!([ID] "Subscription id, defaults to all").value_parser(value_parser!(i64)))
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            id: matches.get_one::<i64>("ID").copied(),
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, app: &App) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self.id, "syncing...");
        let cancel = CancelFlag::new();

        let reports = match self.id {
            Some(id) => vec![app.syncer.sync_one(id, &cancel).await?],
            None => app.syncer.run_pass(&cancel).await?.subscriptions,
        };

        match self.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
            OutputFormat::Table => {
                if reports.is_empty() {
                    println!("{}", "No subscriptions to sync".italic());
                }
                for report in &reports {
                    print_report(report);
                }
            }
        }

        if reports.iter().any(|r| r.outcome.is_failed()) {
            return Err("one or more subscriptions failed to sync".into());
        }
        Ok(())
    }
}

fn print_report(report: &SubscriptionReport) {
    let id = format!("#{}", report.id).cyan();
    match &report.outcome {
        PassOutcome::Synced { outcome } => {
            let mut line = format!(
                "{} added, {} updated, {} deleted",
                outcome.added, outcome.updated, outcome.deleted
            );
            if outcome.skipped > 0 {
                line.push_str(&format!(", {} skipped", outcome.skipped));
            }
            println!("{:>4}  {}  {}  {}", id, report.name.bold(), "ok".green(), line);
            for failure in &outcome.failures {
                println!("      {} {}: {}", "skipped".yellow(), failure.uid, failure.reason);
            }
        }
        PassOutcome::Failed { reason } => {
            println!("{:>4}  {}  {}  {}", id, report.name.bold(), "failed".red(), reason);
        }
    }
}
