use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::services::debounce::Debouncer;
use crate::services::locations::MIN_QUERY_LEN;
use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.booking_events_tx.subscribe();

    info!("booking event client connected");

    let send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize booking event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!("booking event client disconnected");
}

pub async fn suggest_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_suggest_socket(socket, state))
}

async fn handle_suggest_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<String>(16);

    info!("suggestion client connected");

    let send_task = tokio::spawn(async move {
        while let Some(json) = out_rx.recv().await {
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    relay_suggestions(receiver, out_tx, state).await;
    let _ = send_task.await;

    info!("suggestion client disconnected");
}

/// Each text frame is the current contents of an address field; only the
/// last query typed within the debounce window is looked up. Returns when
/// the client closes, dropping any lookup still pending.
async fn relay_suggestions<S>(mut incoming: S, out_tx: mpsc::Sender<String>, state: Arc<AppState>)
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let mut debouncer = Debouncer::new(state.config.suggest_debounce);

    while let Some(Ok(msg)) = incoming.next().await {
        let query = match msg {
            Message::Text(text) => text.trim().to_string(),
            Message::Close(_) => break,
            _ => continue,
        };

        if query.chars().count() < MIN_QUERY_LEN {
            debouncer.cancel();
            if out_tx.send("[]".to_string()).await.is_err() {
                break;
            }
            continue;
        }

        let state = state.clone();
        let out_tx = out_tx.clone();
        debouncer.trigger(move |ticket| async move {
            let suggestions = state.locations.suggest(&query).await;
            if !ticket.is_current() {
                debug!(query = %query, "dropping superseded suggestions");
                return;
            }

            match serde_json::to_string(&suggestions) {
                Ok(json) => {
                    let _ = out_tx.send(json).await;
                }
                Err(err) => warn!(error = %err, "failed to serialize suggestions for ws"),
            }
        });
    }

    debouncer.cancel();
}
