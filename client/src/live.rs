// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fmt::Display;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::board::Board;
use crate::config::ClientConfig;

/// Listens on the server push channel and refreshes the board on every message.
///
/// Messages are pure invalidation signals: their content is logged and
/// otherwise ignored.
#[derive(Debug, Clone)]
pub struct LiveUpdates {
    url: String,
    reconnect_interval: Duration,
    reconnect_attempts: u32,
}

impl LiveUpdates {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            url: config.ws_url.clone(),
            reconnect_interval: config.reconnect_interval,
            reconnect_attempts: config.reconnect_attempts,
        }
    }

    /// Runs the listener in the background. Abort the handle to stop it.
    pub fn spawn(self, board: Board) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(board).await })
    }

    /// Connects, forwards invalidations and reconnects until the attempt
    /// budget runs out. A successful connection restores the full budget.
    pub async fn run(self, board: Board) {
        let mut failures: u32 = 0;

        loop {
            match connect_async(self.url.as_str()).await {
                Ok((stream, _response)) => {
                    info!("Live update channel connected to {}", self.url);
                    failures = 0;
                    let received = forward_invalidations(stream, &board).await;
                    info!(
                        "Live update channel closed after {} notifications.",
                        received
                    );
                }
                Err(e) => {
                    failures += 1;
                    warn!(
                        "Failed to connect to {} (attempt {}): {}",
                        self.url, failures, e
                    );
                    if failures >= self.reconnect_attempts {
                        error!(
                            "Giving up on live updates after {} failed attempts.",
                            failures
                        );
                        return;
                    }
                }
            }

            time::sleep(self.reconnect_interval).await;
        }
    }
}

/// Spawns one board refresh per data message until the stream closes or
/// errors. Refreshes are independent tasks so a slow fetch never delays the
/// next notification. Returns the number of notifications seen.
pub async fn forward_invalidations<S, E>(mut stream: S, board: &Board) -> usize
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut received = 0;

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                debug!("WebSocket message received: {}", text.as_str());
            }
            Ok(Message::Binary(bytes)) => {
                debug!("WebSocket message received: {} bytes", bytes.len());
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!("WebSocket read error: {}", e);
                break;
            }
        }

        received += 1;
        let board = board.clone();
        tokio::spawn(async move {
            board.refresh().await;
        });
    }

    received
}
