// SPDX-FileCopyrightText: 2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities for integration tests.
//!
//! Provides test data factories (fixtures), an in-memory calendar store
//! and a scripted feed fetcher.

mod fixtures;
mod mock;

#[allow(unused_imports)]
pub use fixtures::{at, ics_feed, remote_event, synced_subscription};
#[allow(unused_imports)]
pub use mock::{MemoryStore, Script, ScriptedFetcher};
