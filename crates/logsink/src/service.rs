// Copyright 2025-Present the logsink authors
// SPDX-License-Identifier: Apache-2.0

//! Service coordinator.
//!
//! Wires the store and the collector together, runs the receive loop in a
//! background task, and publishes the lifecycle state machine over a watch
//! channel so callers can stop the service and wait for it to wind down.

use std::net::SocketAddr;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::collector::Collector;
use crate::config::CollectorConfig;
use crate::error::StartError;
use crate::store::{EventStore, StoreConfig};

/// Lifecycle of the collector service.
///
/// Transitions are one-way — `Created → Bound → Serving → ShuttingDown →
/// Stopped` — and the loop is single-shot per process lifetime; nothing
/// ever returns to `Serving`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorStatus {
    /// Service object exists, endpoint not bound yet.
    Created,
    /// Endpoint bound, loop not entered yet.
    Bound,
    /// Receive loop running.
    Serving,
    /// Stop requested; the in-flight iteration is finishing.
    ShuttingDown,
    /// Loop exited and resources released.
    Stopped,
}

/// Handle to a running collector service.
#[derive(Debug, Clone)]
pub struct LogSinkHandle {
    status_rx: watch::Receiver<CollectorStatus>,
    cancel_token: CancellationToken,
}

impl LogSinkHandle {
    /// Current lifecycle status.
    pub fn status(&self) -> CollectorStatus {
        *self.status_rx.borrow()
    }

    /// Request shutdown. Idempotent. The loop observes the cancellation on
    /// its next iteration; an in-flight insert completes first.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    /// Wait until the service reaches [`CollectorStatus::Stopped`].
    pub async fn stopped(&mut self) {
        while *self.status_rx.borrow_and_update() != CollectorStatus::Stopped {
            if self.status_rx.changed().await.is_err() {
                break;
            }
        }
    }
}

/// The log collector service: a size-bounded store fed by a UDP endpoint.
pub struct LogSink {
    config: CollectorConfig,
}

impl LogSink {
    /// Create a service from its configuration. Nothing is bound or opened
    /// until [`start`](Self::start).
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// Open the store, bind the endpoint, and start serving in a
    /// background task.
    ///
    /// Returns the control handle and the bound address. Startup failures
    /// (unusable store, unavailable endpoint) surface here and are fatal;
    /// once serving, per-event failures never terminate the service.
    pub async fn start(self) -> Result<(LogSinkHandle, SocketAddr), StartError> {
        self.config.validate()?;

        let (status_tx, status_rx) = watch::channel(CollectorStatus::Created);
        let cancel_token = CancellationToken::new();

        let store = EventStore::open(StoreConfig::new(&self.config.db_path))?;
        let collector = Collector::bind(&self.config, store, cancel_token.clone()).await?;
        let local_addr = collector.local_addr();
        let _ = status_tx.send(CollectorStatus::Bound);

        let handle = LogSinkHandle {
            status_rx,
            cancel_token: cancel_token.clone(),
        };

        tokio::spawn(async move {
            let _ = status_tx.send(CollectorStatus::Serving);

            let spin = collector.spin();
            tokio::pin!(spin);

            // Announce ShuttingDown as soon as cancellation fires, then keep
            // driving the loop so the in-flight iteration can finish.
            let mut announced = false;
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled(), if !announced => {
                        announced = true;
                        let _ = status_tx.send(CollectorStatus::ShuttingDown);
                    }
                    _ = &mut spin => break,
                }
            }

            let _ = status_tx.send(CollectorStatus::Stopped);
        });

        Ok((handle, local_addr))
    }
}
