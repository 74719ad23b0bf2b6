// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # WebSocket Event Hub
//!
//! One `tokio::sync::broadcast` channel fans audit (and future) events out
//! to every connected client. Delivery is best-effort: a lagging receiver
//! skips messages instead of back-pressuring the senders.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tokio::sync::broadcast;
use tracing::debug;

use zrp_domain::services::Broadcaster;

use super::state::AppState;

/// Channel depth before slow receivers start skipping.
const EVENT_BUFFER: usize = 256;

/// The broadcast side handed to services as the [`Broadcaster`] port.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<String>,
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster for EventHub {
    fn broadcast(&self, message: serde_json::Value) {
        // Send fails only when no client is connected; that is fine.
        let _ = self.tx.send(message.to_string());
    }
}

/// `GET /api/v1/ws` — upgrade and stream events until the client leaves.
pub async fn ws_handler(State(state): State<AppState>, upgrade: WebSocketUpgrade) -> impl IntoResponse {
    let rx = state.events.subscribe();
    upgrade.on_upgrade(move |socket| stream_events(socket, rx))
}

async fn stream_events(mut socket: WebSocket, mut rx: broadcast::Receiver<String>) {
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(message) => {
                    if socket.send(Message::Text(message)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "websocket client lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                // Inbound frames are ignored; the hub is one-way.
                Some(Ok(_)) => {}
                _ => break,
            },
        }
    }
}
