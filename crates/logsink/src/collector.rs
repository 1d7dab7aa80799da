// Copyright 2025-Present the logsink authors
// SPDX-License-Identifier: Apache-2.0

//! UDP collector loop.
//!
//! Receives one payload per datagram and drives the
//! receive → normalize → store pipeline. The loop is strictly sequential:
//! a datagram is fully normalized and persisted before the next receive,
//! so the transport's own buffering absorbs bursts and the store only ever
//! sees one writer.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

use crate::config::CollectorConfig;
use crate::error::{CollectorError, StoreError};
use crate::event;
use crate::store::EventStore;

/// Receive buffer for one datagram.
const BUFFER_SIZE: usize = 8192;

/// Stored-event log lines carry at most this many characters of the message.
const LOG_MESSAGE_PREVIEW: usize = 100;

/// UDP log collector: receives payloads, normalizes them, stores them.
pub struct Collector {
    socket: UdpSocket,
    local_addr: SocketAddr,
    store: EventStore,
    cancel_token: CancellationToken,
}

impl Collector {
    /// Bind the collector's UDP endpoint.
    ///
    /// Fails with [`CollectorError::Bind`] when the address is already in
    /// use or otherwise unavailable; this is fatal, the caller must not
    /// proceed to serving.
    pub async fn bind(
        config: &CollectorConfig,
        store: EventStore,
        cancel_token: CancellationToken,
    ) -> Result<Collector, CollectorError> {
        let addr = config.bind_addr();
        let socket = UdpSocket::bind(&addr)
            .await
            .map_err(|source| CollectorError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = socket
            .local_addr()
            .map_err(|source| CollectorError::Bind { addr, source })?;
        info!("log collector listening on {}", local_addr);

        Ok(Collector {
            socket,
            local_addr,
            store,
            cancel_token,
        })
    }

    /// The address the socket is actually bound to (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Main receive loop.
    ///
    /// Runs until the cancellation token fires. Cancellation is observed
    /// between iterations, so an in-flight event always completes before
    /// shutdown takes effect. Per-message failures of any kind are logged
    /// and never terminate the loop.
    pub async fn spin(self) {
        let mut buf = [0u8; BUFFER_SIZE];
        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("shutdown requested, stopping collector");
                    break;
                }
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, src)) => {
                        trace!("received {} bytes from {}", len, src);
                        self.process_payload(&buf[..len]);
                    }
                    Err(e) => {
                        // Transient receive errors must not kill the loop.
                        error!("error receiving message: {}", e);
                    }
                },
            }
        }
    }

    /// Normalize and persist one payload.
    ///
    /// A capacity-exceeded store means the event is dropped with a warning;
    /// any other storage failure is reported and likewise swallowed.
    fn process_payload(&self, buf: &[u8]) {
        let payload = String::from_utf8_lossy(buf);
        let event = event::normalize(&payload);

        match self.store.insert(&event) {
            Ok(()) => info!(
                "stored event: {}",
                preview(&event.message, LOG_MESSAGE_PREVIEW)
            ),
            Err(StoreError::CapacityExceeded) => {
                warn!("store size limit reached, event dropped");
            }
            Err(e) => error!("database error: {}", e),
        }
    }
}

/// First `max` characters of a message, cut on a char boundary.
fn preview(message: &str, max: usize) -> &str {
    match message.char_indices().nth(max) {
        Some((idx, _)) => &message[..idx],
        None => message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_message_is_untouched() {
        assert_eq!(preview("disk low", 100), "disk low");
    }

    #[test]
    fn test_preview_cuts_long_message() {
        let long = "a".repeat(250);
        assert_eq!(preview(&long, 100).len(), 100);
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let message = "é".repeat(150);
        assert_eq!(preview(&message, 100).chars().count(), 100);
    }
}
