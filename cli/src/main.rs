// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    icsync_cli::run().await
}
