// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{Arg, ArgMatches, arg};

/// Output format shared by the listing commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub struct CommonArgs;

impl CommonArgs {
    pub fn output_format() -> Arg {
        arg!(--"output-format" [FORMAT] "Output format")
            .value_parser(["table", "json"])
            .default_value("table")
    }

    pub fn get_output_format(matches: &ArgMatches) -> OutputFormat {
        match matches.get_one::<String>("output-format").map(String::as_str) {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }
}

/// Parses a display color given as `#RRGGBB` or `RRGGBB`.
pub fn parse_color(raw: &str) -> Result<u32, Box<dyn Error>> {
    let hex = raw.strip_prefix('#').unwrap_or(raw);
    if hex.len() != 6 {
        return Err(format!("invalid color {raw:?}: expected #RRGGBB").into());
    }
    u32::from_str_radix(hex, 16).map_err(|e| format!("invalid color {raw:?}: {e}").into())
}

/// Renders a color as `#RRGGBB`.
pub fn format_color(color: u32) -> String {
    format!("#{color:06X}")
}
