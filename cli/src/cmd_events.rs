// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use chrono::{DateTime, Utc};
use clap::{ArgMatches, Command, arg, value_parser};
use colored::Colorize;
use icsync_core::{CalendarStore, StoredEvent};

use crate::app::App;
use crate::util::{CommonArgs, OutputFormat};

#[derive(Debug, Clone, Copy)]
pub struct CmdEvents {
    pub id: i64,
    pub output_format: OutputFormat,
}

impl CmdEvents {
    pub const NAME: &str = "events";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("List the materialized events of a subscription")
            .arg(arg!(<ID> "Subscription id").value_parser(value_parser!(i64)))
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            id: matches.get_one::<i64>("ID").copied().unwrap_or_default(),
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, app: &App) -> Result<(), Box<dyn Error>> {
        tracing::debug!(id = self.id, "listing events...");
        let sub = app
            .db
            .subscriptions
            .get(self.id)
            .await?
            .ok_or_else(|| format!("Subscription #{} not found", self.id))?;
        let Some(calendar) = &sub.calendar_handle else {
            println!("{}", "Not synced yet, no events".italic());
            return Ok(());
        };

        let mut events = app.store.list_events(calendar).await?;
        events.sort_by(|a, b| a.start.cmp(&b.start));

        match self.output_format {
            OutputFormat::Json => {
                let rows: Vec<EventView> = events.iter().map(EventView::from).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            OutputFormat::Table => {
                if events.is_empty() {
                    println!("{}", "No events".italic());
                    return Ok(());
                }
                for event in &events {
                    print_event(event);
                }
            }
        }
        Ok(())
    }
}

fn print_event(event: &StoredEvent) {
    let when = match (event.start, event.all_day) {
        (Some(start), true) => start.format("%Y-%m-%d").to_string(),
        (Some(start), false) => start.format("%Y-%m-%d %H:%M UTC").to_string(),
        (None, _) => "unscheduled".to_string(),
    };
    println!("{}  {}", when.cyan(), event.title.bold());
}

#[derive(serde::Serialize)]
struct EventView {
    title: String,
    all_day: bool,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    timezone: Option<String>,
}

impl From<&StoredEvent> for EventView {
    fn from(event: &StoredEvent) -> Self {
        Self {
            title: event.title.clone(),
            all_day: event.all_day,
            start: event.start,
            end: event.end,
            timezone: event.timezone.clone(),
        }
    }
}
