// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::sync::Arc;

use icsync_core::{Config, DirectoryStore, HttpFetcher, LocalDb, Syncer};

const DB_FILENAME: &str = "icsync.db";

/// Wires the store, the fetcher, the index database and the orchestrator
/// together for one invocation.
pub struct App {
    pub config: Config,
    pub db: LocalDb,
    pub store: Arc<DirectoryStore>,
    pub syncer: Arc<Syncer>,
}

impl App {
    pub async fn open(config: Config) -> Result<Self, Box<dyn Error>> {
        let store = Arc::new(DirectoryStore::open(&config.store_dir).await?);

        let db_path = match &config.state_dir {
            Some(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                Some(dir.join(DB_FILENAME))
            }
            None => {
                tracing::warn!("no state directory, the event index will not persist");
                None
            }
        };
        let db = LocalDb::open(db_path.as_deref()).await?;

        let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout())?);
        let syncer = Arc::new(Syncer::new(db.clone(), store.clone(), fetcher));

        Ok(Self {
            config,
            db,
            store,
            syncer,
        })
    }

    pub async fn close(self) {
        self.db.close().await;
    }
}
