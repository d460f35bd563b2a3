use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    /// Only forward orders submitted by this client.
    pub client_id: Option<Uuid>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<FeedQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_submitted_orders(socket, state, query.client_id))
}

async fn stream_submitted_orders(socket: WebSocket, state: Arc<AppState>, client_id: Option<Uuid>) {
    let (mut sender, mut receiver) = socket.split();
    let mut orders = state.order_events_tx.subscribe();

    info!(client_id = ?client_id, "summary feed connected");

    let forward = tokio::spawn(async move {
        loop {
            let event = match orders.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "summary feed lagging; dropped submitted orders");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if client_id.is_some_and(|id| id != event.client_id) {
                continue;
            }

            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(error = %err, wizard_id = %event.wizard_id, "failed to encode submitted order");
                    continue;
                }
            };

            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let drain = tokio::spawn(async move { while let Some(Ok(_)) = receiver.next().await {} });

    until_either_finishes(forward, drain).await;

    info!(client_id = ?client_id, "summary feed disconnected");
}

/// Waits for the first task to end and aborts the other.
async fn until_either_finishes(mut first: JoinHandle<()>, mut second: JoinHandle<()>) {
    tokio::select! {
        _ = &mut first => second.abort(),
        _ = &mut second => first.abort(),
    }
}
