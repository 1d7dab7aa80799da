// Copyright 2025-Present the logsink authors
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Errors raised by the event store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database file or schema is unusable at startup. Fatal.
    #[error("failed to initialize store at {path}: {source}")]
    Init {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Eviction and compaction could not bring the file back under the
    /// size ceiling. The offending event was not persisted.
    #[error("store size limit reached and eviction could not reclaim enough space")]
    CapacityExceeded,

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to read store file size: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the collector endpoint.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    /// The endpoint address is unavailable at startup. Fatal.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Startup failures: either the storage file/schema is unusable or the
/// endpoint cannot be bound. Both are fatal before serving begins; once
/// serving, per-event failures never terminate the loop.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Collector(#[from] CollectorError),
}
