// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use chrono::{DateTime, Utc};
use clap::{ArgMatches, Command, arg, value_parser};
use colored::Colorize;
use icsync_core::{CancelFlag, PassOutcome, Subscription, SubscriptionDraft, SyncStrategy};

use crate::app::App;
use crate::util::{CommonArgs, OutputFormat, format_color, parse_color};

#[derive(Debug, Clone)]
pub struct CmdAdd {
    pub name: String,
    pub uri: String,
    pub strategy: SyncStrategy,
    pub color: Option<u32>,
    pub reminder_minutes: Option<u32>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_agent: Option<String>,
}

impl CmdAdd {
    pub const NAME: &str = "add";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Subscribe to a calendar feed")
            .arg(arg!(<NAME> "Display name of the subscription"))
            .arg(arg!(<URI> "Feed location, an http(s) URL or a local path"))
            .arg(
                arg!(--strategy [STRATEGY] "Reconciliation strategy")
                    .value_parser(["merge", "replace"])
                    .default_value("merge"),
            )
            .arg(arg!(--color [COLOR] "Display color as #RRGGBB"))
            .arg(
                arg!(--reminder [MINUTES] "Reminder minutes before each event")
                    .value_parser(value_parser!(u32)),
            )
            .arg(arg!(--username [USERNAME] "Username for protected feeds"))
            .arg(arg!(--password [PASSWORD] "Password for protected feeds"))
            .arg(arg!(--"user-agent" [AGENT] "Override the request user agent"))
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let strategy = matches
            .get_one::<String>("strategy")
            .map(String::as_str)
            .unwrap_or("merge")
            .parse()?;
        let color = matches
            .get_one::<String>("color")
            .map(|c| parse_color(c))
            .transpose()?;

        Ok(Self {
            name: matches.get_one::<String>("NAME").cloned().unwrap_or_default(),
            uri: matches.get_one::<String>("URI").cloned().unwrap_or_default(),
            strategy,
            color,
            reminder_minutes: matches.get_one::<u32>("reminder").copied(),
            username: matches.get_one::<String>("username").cloned(),
            password: matches.get_one::<String>("password").cloned(),
            user_agent: matches.get_one::<String>("user-agent").cloned(),
        })
    }

    pub async fn run(self, app: &App) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self.name, ?self.uri, "adding subscription...");
        let mut draft = SubscriptionDraft::new(self.name, self.uri);
        draft.strategy = self.strategy;
        if let Some(color) = self.color {
            draft.color = color;
        }
        draft.reminder_minutes = self.reminder_minutes;
        draft.username = self.username;
        draft.password = self.password;
        draft.user_agent = self.user_agent;

        let sub = app.syncer.import(&draft).await?;
        println!(
            "Added subscription {} ({}), fetching...",
            sub.name.bold(),
            format!("#{}", sub.id).cyan(),
        );

        // First sync right away; later passes come from the scheduler.
        let report = app.syncer.sync_one(sub.id, &CancelFlag::new()).await?;
        match &report.outcome {
            PassOutcome::Synced { outcome } => {
                println!("Imported {} events", outcome.added.to_string().bold());
            }
            PassOutcome::Failed { reason } => {
                println!("{} {}", "Sync failed:".red(), reason);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CmdEdit {
    pub id: i64,
    pub name: Option<String>,
    pub uri: Option<String>,
    pub strategy: Option<SyncStrategy>,
    pub color: Option<u32>,
    pub reminder_minutes: Option<u32>,
}

impl CmdEdit {
    pub const NAME: &str = "edit";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Edit a subscription's settings")
            .arg(arg!(<ID> "Subscription id").value_parser(value_parser!(i64)))
            .arg(arg!(--name [NAME] "New display name"))
            .arg(arg!(--uri [URI] "New feed location"))
            .arg(
                arg!(--strategy [STRATEGY] "New reconciliation strategy")
                    .value_parser(["merge", "replace"]),
            )
            .arg(arg!(--color [COLOR] "New display color as #RRGGBB"))
            .arg(
                arg!(--reminder [MINUTES] "Reminder minutes before each event")
                    .value_parser(value_parser!(u32)),
            )
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let strategy = matches
            .get_one::<String>("strategy")
            .map(|s| s.parse())
            .transpose()?;
        let color = matches
            .get_one::<String>("color")
            .map(|c| parse_color(c))
            .transpose()?;

        Ok(Self {
            id: matches.get_one::<i64>("ID").copied().unwrap_or_default(),
            name: matches.get_one::<String>("name").cloned(),
            uri: matches.get_one::<String>("uri").cloned(),
            strategy,
            color,
            reminder_minutes: matches.get_one::<u32>("reminder").copied(),
        })
    }

    pub async fn run(self, app: &App) -> Result<(), Box<dyn Error>> {
        tracing::debug!(id = self.id, "editing subscription...");
        let Some(mut sub) = app.db.subscriptions.get(self.id).await? else {
            return Err(format!("Subscription #{} not found", self.id).into());
        };

        if let Some(name) = self.name {
            sub.name = name;
        }
        if let Some(uri) = self.uri {
            sub.uri = uri;
        }
        if let Some(strategy) = self.strategy {
            sub.strategy = strategy;
        }
        if let Some(color) = self.color {
            sub.color = color;
        }
        if let Some(minutes) = self.reminder_minutes {
            sub.reminder_minutes = Some(minutes);
        }

        app.syncer.update_subscription(&sub).await?;
        println!(
            "Updated subscription {} ({})",
            sub.name.bold(),
            format!("#{}", sub.id).cyan(),
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CmdList {
    pub output_format: OutputFormat,
}

impl CmdList {
    pub const NAME: &str = "list";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("List subscriptions")
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, app: &App) -> Result<(), Box<dyn Error>> {
        tracing::debug!("listing subscriptions...");
        let subscriptions = app.db.subscriptions.list().await?;

        match self.output_format {
            OutputFormat::Json => {
                let rows: Vec<SubscriptionView> =
                    subscriptions.iter().map(SubscriptionView::from).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            OutputFormat::Table => {
                if subscriptions.is_empty() {
                    println!("{}", "No subscriptions".italic());
                    return Ok(());
                }
                for sub in &subscriptions {
                    print_subscription(sub);
                }
            }
        }
        Ok(())
    }
}

fn print_subscription(sub: &Subscription) {
    let status = match (&sub.error_message, &sub.last_sync) {
        (Some(err), _) => format!("error: {err}").red(),
        (None, Some(at)) => format!("synced {}", at.format("%Y-%m-%d %H:%M UTC")).green(),
        (None, None) => "never synced".italic(),
    };
    println!(
        "{:>4}  {}  {}  [{}]  {}",
        format!("#{}", sub.id).cyan(),
        sub.name.bold(),
        sub.uri,
        sub.strategy,
        status,
    );
}

#[derive(serde::Serialize)]
struct SubscriptionView {
    id: i64,
    name: String,
    uri: String,
    strategy: String,
    color: String,
    reminder_minutes: Option<u32>,
    last_sync: Option<DateTime<Utc>>,
    error_message: Option<String>,
}

impl From<&Subscription> for SubscriptionView {
    fn from(sub: &Subscription) -> Self {
        Self {
            id: sub.id,
            name: sub.name.clone(),
            uri: sub.uri.clone(),
            strategy: sub.strategy.to_string(),
            color: format_color(sub.color),
            reminder_minutes: sub.reminder_minutes,
            last_sync: sub.last_sync,
            error_message: sub.error_message.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CmdRemove {
    pub id: i64,
}

impl CmdRemove {
    pub const NAME: &str = "remove";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("rm")
            .about("Remove a subscription and its calendar")
            .arg(arg!(<ID> "Subscription id").value_parser(value_parser!(i64)))
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            id: matches.get_one::<i64>("ID").copied().unwrap_or_default(),
        }
    }

    pub async fn run(self, app: &App) -> Result<(), Box<dyn Error>> {
        tracing::debug!(id = self.id, "removing subscription...");
        app.syncer.remove(self.id).await?;
        println!("Removed subscription {}", format!("#{}", self.id).cyan());
        Ok(())
    }
}
