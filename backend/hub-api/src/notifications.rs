//! Outbound change notifications and the WebSocket endpoint that fans them out.
//!
//! Notifications are fire-and-forget pub/sub: nothing is persisted and a topic
//! with no subscribers simply drops the message. Each process fans out to its
//! own sockets through [`BroadcastChannel`]; [`crate::fanout`] carries frames
//! between processes.

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::AppState;

/// Topic-scoped broadcast channel: (topic, json payload).
pub type BroadcastChannel = broadcast::Sender<(String, String)>;

pub fn create_broadcast_channel() -> BroadcastChannel {
    broadcast::channel(100).0
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("notification channel unavailable: {0}")]
    Unavailable(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, topic: &str, event: &str, payload: Value) -> Result<(), NotifyError>;
}

pub fn checklist_topic(country: &str) -> String {
    format!("checklist.{}", country)
}

pub fn employees_topic(country: &str) -> String {
    format!("employees.{}", country)
}

/// Published on `checklist.{country}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistUpdated {
    pub country: String,
    pub event_type: String,
    pub message: String,
    pub missing_fields: Vec<String>,
}

impl ChecklistUpdated {
    pub const NAME: &'static str = "ChecklistUpdated";

    pub fn new(country: &str, event_type: &str, missing_fields: Vec<String>) -> Self {
        let message = if missing_fields.is_empty() {
            format!("Checklist updated for {}. All data complete.", country)
        } else {
            format!(
                "Checklist data invalidated for {}. Some items need attention.",
                country
            )
        };
        Self {
            country: country.to_string(),
            event_type: event_type.to_string(),
            message,
            missing_fields,
        }
    }
}

/// Published on `employees.{country}`; `data` is the event's raw `data` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeDataUpdated {
    pub country: String,
    pub event_type: String,
    pub data: Option<Value>,
    pub message: String,
}

impl EmployeeDataUpdated {
    pub const NAME: &'static str = "EmployeeDataUpdated";

    pub fn new(country: &str, event_type: &str, data: Option<Value>) -> Self {
        Self {
            country: country.to_string(),
            event_type: event_type.to_string(),
            data,
            message: format!(
                "Employee data updated for {}. Refresh or refetch employees.",
                country
            ),
        }
    }
}

/// Frame pushed to WebSocket subscribers.
#[derive(Debug, Serialize, Deserialize)]
pub struct Frame {
    pub topic: String,
    pub event: String,
    pub data: Value,
}

impl Frame {
    pub fn new(topic: &str, event: &str, data: Value) -> Self {
        Self {
            topic: topic.to_string(),
            event: event.to_string(),
            data,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Clone)]
pub struct BroadcastNotifier {
    channel: BroadcastChannel,
}

impl BroadcastNotifier {
    pub fn new(channel: BroadcastChannel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn notify(&self, topic: &str, event: &str, payload: Value) -> Result<(), NotifyError> {
        let message = Frame::new(topic, event, payload).encode()?;
        // No subscribers is fine for fan-out.
        let _ = self.channel.send((topic.to_string(), message));
        Ok(())
    }
}

#[derive(Deserialize)]
pub struct WebSocketQuery {
    /// Comma-separated topics, e.g. `checklist.USA,employees.USA`.
    topic: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WebSocketQuery>,
    State(state): State<AppState>,
) -> Result<Response, StatusCode> {
    let topics: HashSet<String> = query
        .topic
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    if topics.is_empty() {
        tracing::warn!("WebSocket connection attempt without topic");
        return Err(StatusCode::BAD_REQUEST);
    }

    tracing::info!("WebSocket subscribed to {:?}", topics);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, topics)))
}

async fn handle_socket(socket: WebSocket, state: AppState, topics: HashSet<String>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.broadcast_tx.subscribe();

    // Spawn task to send messages from broadcast channel to client
    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok((topic, msg)) => {
                    if !topics.contains(&topic) {
                        continue;
                    }
                    if sender.send(Message::Text(msg)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("WebSocket subscriber lagged, skipped {} notifications", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Spawn task to receive messages from client (for ping/pong)
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };
}
