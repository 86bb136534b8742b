// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line interface for the icsync feed reconciler.

mod app;
mod cli;
mod cmd_daemon;
mod cmd_events;
mod cmd_subscription;
mod cmd_sync;
mod config;
mod util;

pub use crate::app::App;
pub use crate::cli::{Cli, Commands, run};
pub use crate::config::parse_config;
