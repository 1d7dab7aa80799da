// Copyright 2025-Present the logsink authors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! Bounded-store log ingestion.
//!
//! logsink receives UTF-8 log payloads pushed over UDP, normalizes each one
//! into a canonical [`Event`], and appends it to a size-bounded SQLite store
//! that evicts its oldest rows instead of growing past a hard ceiling.
//!
//! The pipeline is deliberately a single logical worker: one datagram is
//! fully normalized and persisted before the next one is received, so
//! backpressure is implicit and the store only ever sees one writer.

pub mod collector;
pub mod config;
pub mod error;
pub mod event;
pub mod service;
pub mod store;

pub use collector::Collector;
pub use config::CollectorConfig;
pub use error::{CollectorError, StartError, StoreError};
pub use event::{normalize, Event};
pub use service::{CollectorStatus, LogSink, LogSinkHandle};
pub use store::{EventStore, StoreConfig};
