// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Periodic and manual sync triggering.
//!
//! One background task owns the pass loop. Manual triggers go through a
//! capacity-one channel, so triggers arriving while one is already pending
//! coalesce into a single pass. A trigger arriving while a pass is running
//! supersedes it: the running pass is cancelled and a fresh pass starts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::MIN_SYNC_INTERVAL_MINUTES;
use crate::sync::{CancelFlag, Syncer};

/// Handle to the background sync loop.
pub struct SyncScheduler {
    trigger: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl SyncScheduler {
    /// Spawns the pass loop, ticking every `every`. Intervals below the
    /// floor are clamped up.
    pub fn spawn(syncer: Arc<Syncer>, every: Duration) -> Self {
        let floor = Duration::from_secs(u64::from(MIN_SYNC_INTERVAL_MINUTES) * 60);
        let every = if every < floor {
            tracing::warn!(
                requested_secs = every.as_secs(),
                floor_secs = floor.as_secs(),
                "sync interval below floor, clamping"
            );
            floor
        } else {
            every
        };

        let (trigger, rx) = mpsc::channel(1);
        let handle = tokio::spawn(run_loop(syncer, rx, every));
        Self { trigger, handle }
    }

    /// Requests a sync pass now. Returns `false` when a trigger is already
    /// pending (the request coalesces into it) or the loop has stopped.
    pub fn trigger_now(&self) -> bool {
        match self.trigger.try_send(()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(())) => {
                tracing::debug!("sync trigger already pending, coalescing");
                false
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                tracing::warn!("sync loop has stopped, trigger dropped");
                false
            }
        }
    }

    /// Stops the loop. A running pass is cancelled and awaited before
    /// returning.
    pub async fn shutdown(self) {
        drop(self.trigger);
        if let Err(e) = self.handle.await {
            tracing::warn!(err = %e, "sync loop task failed");
        }
    }
}

async fn run_loop(syncer: Arc<Syncer>, mut rx: mpsc::Receiver<()>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately, giving a pass right at startup.

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            msg = rx.recv() => {
                if msg.is_none() {
                    tracing::debug!("sync loop shutting down");
                    return;
                }
            }
        }

        if run_superseded(&syncer, &mut rx).await.is_none() {
            tracing::debug!("sync loop shutting down");
            return;
        }
        // A manual pass pushes the next periodic one out a full interval.
        ticker.reset();
    }
}

/// Runs passes until one completes without being superseded. Returns `None`
/// when the trigger channel closed mid-pass.
async fn run_superseded(syncer: &Arc<Syncer>, rx: &mut mpsc::Receiver<()>) -> Option<()> {
    loop {
        let cancel = CancelFlag::new();
        let pass = syncer.run_pass(&cancel);
        tokio::pin!(pass);

        let interrupted = tokio::select! {
            res = &mut pass => {
                if let Err(e) = res {
                    tracing::error!(err = %e, "sync pass failed");
                }
                None
            }
            msg = rx.recv() => {
                // Newest trigger wins: cancel, wait the pass out, decide.
                cancel.set();
                if let Err(e) = pass.await {
                    tracing::error!(err = %e, "sync pass failed");
                }
                Some(msg)
            }
        };

        match interrupted {
            None => return Some(()),
            Some(Some(())) => continue,
            Some(None) => return None,
        }
    }
}
