//! Live status notifications over the backend's `/ws` channel.
//!
//! Inbound messages are JSON `{id, status, meta?}` updates for individual
//! assets. Outbound traffic is a periodic `{"type":"ping"}` keep-alive,
//! sent only while the socket is open. The channel is deliberately lossy:
//! malformed payloads are dropped and logged, a transport error closes
//! the channel, and there is no reconnect or replay -- the polling loop
//! is the catch-up path.

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::client::{ImageMeta, ImageStatus};
use crate::config::Config;
use crate::error::ChannelError;

/// One out-of-band status change for an asset. Delivery order and
/// exactly-once semantics are NOT guaranteed; consumers merge by id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusUpdate {
    pub id: i64,
    pub status: ImageStatus,
    #[serde(default)]
    pub meta: Option<ImageMeta>,
}

/// Parse an inbound payload, dropping anything malformed.
#[must_use]
pub fn parse_update(text: &str) -> Option<StatusUpdate> {
    match serde_json::from_str(text) {
        Ok(update) => Some(update),
        Err(e) => {
            warn!(error = %e, payload = text, "dropping malformed notification payload");
            None
        }
    }
}

/// An open notification channel. Dropping it (or calling
/// [`NotificationChannel::close`]) tears down the socket task.
pub struct NotificationChannel {
    updates: mpsc::Receiver<StatusUpdate>,
    task: JoinHandle<()>,
}

impl NotificationChannel {
    /// Connect to the backend's `/ws` endpoint derived from the config.
    pub async fn connect(config: &Config) -> Result<Self, ChannelError> {
        let url = config
            .ws_url()
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        let (socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        debug!(url, "notification channel open");

        let (tx, rx) = mpsc::channel(64);
        let ping_interval = config.ping_interval;
        let task = tokio::spawn(run_channel(socket, tx, ping_interval));

        Ok(Self { updates: rx, task })
    }

    /// Next update, or `None` once the channel has closed. Loss between
    /// updates is possible and expected; merge by id, do not replay.
    pub async fn recv(&mut self) -> Option<StatusUpdate> {
        self.updates.recv().await
    }

    pub fn close(&self) {
        self.task.abort();
    }
}

impl Drop for NotificationChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_channel<S>(
    socket: tokio_tungstenite::WebSocketStream<S>,
    tx: mpsc::Sender<StatusUpdate>,
    ping_interval: std::time::Duration,
) where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut sink, mut stream) = socket.split();

    // First ping one full interval after open, not immediately.
    let start = tokio::time::Instant::now() + ping_interval;
    let mut ping = tokio::time::interval_at(start, ping_interval);

    loop {
        tokio::select! {
            _ = ping.tick() => {
                let payload = r#"{"type":"ping"}"#.to_string();
                if let Err(e) = sink.send(Message::Text(payload)).await {
                    warn!(error = %e, "keep-alive send failed; closing notification channel");
                    break;
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if let Some(update) = parse_update(&text) {
                        if tx.send(update).await.is_err() {
                            // Receiver gone: consumer dropped the channel.
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("notification channel closed by server");
                    break;
                }
                Some(Ok(_)) => {
                    // Binary/ping/pong frames carry no updates.
                }
                Some(Err(e)) => {
                    // No reconnect, no replay; polling catches up.
                    warn!(error = %e, "notification channel transport error");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_update() {
        let update = parse_update(r#"{"id": 4, "status": "processing"}"#).unwrap();
        assert_eq!(update.id, 4);
        assert_eq!(update.status, ImageStatus::Processing);
        assert_eq!(update.meta, None);
    }

    #[test]
    fn parses_update_with_meta_bounds() {
        let update = parse_update(
            r#"{"id": 4, "status": "done", "meta": {"bounds": {"south":1,"west":2,"north":3,"east":4}}}"#,
        )
        .unwrap();
        let bounds = update.meta.unwrap().bounds.unwrap();
        assert_eq!(bounds.north, 3.0);
    }

    #[test]
    fn malformed_payloads_are_dropped_not_fatal() {
        assert_eq!(parse_update("not json"), None);
        assert_eq!(parse_update(r#"{"id": "four", "status": "done"}"#), None);
        assert_eq!(parse_update(r#"{"status": "done"}"#), None);
        assert_eq!(parse_update(r#"{"id": 1, "status": "exploded"}"#), None);
    }
}
