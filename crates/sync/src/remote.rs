// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The remote collaborator that executes queued mutations.
//!
//! [`Remote`] is the seam between the orchestrator and whatever actually
//! applies a mutation server-side. Production uses [`WebSocketRemote`];
//! tests use the scripted remote in `crate::testing`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use ph_core::{ClientMessage, Confirmation, QueuedAction, ServerMessage};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Why a remote call did not confirm the action.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    /// The server refused the mutation.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The server could not be reached.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// No answer within the configured limit.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with something unintelligible.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Result type for remote calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future returned by [`Remote::execute`].
pub type RemoteFuture<'a> = Pin<Box<dyn Future<Output = RemoteResult<Confirmation>> + Send + 'a>>;

/// Executes one queued mutation against the server.
///
/// Every failure counts against the action's retry budget; the caller does
/// not distinguish transient from permanent errors.
pub trait Remote: Send + Sync {
    fn execute<'a>(&'a self, action: &'a QueuedAction) -> RemoteFuture<'a>;
}

impl<R: Remote + ?Sized> Remote for Arc<R> {
    fn execute<'a>(&'a self, action: &'a QueuedAction) -> RemoteFuture<'a> {
        (**self).execute(action)
    }
}

impl<R: Remote + ?Sized> Remote for Box<R> {
    fn execute<'a>(&'a self, action: &'a QueuedAction) -> RemoteFuture<'a> {
        (**self).execute(action)
    }
}

/// Bounds every call of the wrapped remote.
#[derive(Debug)]
pub struct Timeout<R> {
    inner: R,
    limit: Duration,
}

/// Wrap `remote` so that calls exceeding `limit` fail with [`RemoteError::Timeout`].
pub fn with_timeout<R: Remote>(remote: R, limit: Duration) -> Timeout<R> {
    Timeout {
        inner: remote,
        limit,
    }
}

impl<R: Remote> Remote for Timeout<R> {
    fn execute<'a>(&'a self, action: &'a QueuedAction) -> RemoteFuture<'a> {
        Box::pin(async move {
            match tokio::time::timeout(self.limit, self.inner.execute(action)).await {
                Ok(result) => result,
                Err(_) => Err(RemoteError::Timeout(self.limit)),
            }
        })
    }
}

/// A remote for engines that never sync (no URL configured).
#[derive(Debug, Default, Clone, Copy)]
pub struct Disconnected;

impl Remote for Disconnected {
    fn execute<'a>(&'a self, _action: &'a QueuedAction) -> RemoteFuture<'a> {
        Box::pin(async { Err(RemoteError::Unavailable("no remote configured".into())) })
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Sends each action as a `ClientMessage::Execute` over one WebSocket and
/// waits for the matching `Confirmed` or `Rejected` answer.
///
/// The connection is opened lazily and dropped after any transport failure,
/// so the next call reconnects.
pub struct WebSocketRemote {
    url: String,
    conn: Mutex<Option<WsStream>>,
}

impl WebSocketRemote {
    pub fn new(url: impl Into<String>) -> Self {
        WebSocketRemote {
            url: url.into(),
            conn: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for WebSocketRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketRemote")
            .field("url", &self.url)
            .finish()
    }
}

impl Remote for WebSocketRemote {
    fn execute<'a>(&'a self, action: &'a QueuedAction) -> RemoteFuture<'a> {
        Box::pin(async move {
            let mut conn = self.conn.lock().await;
            if conn.is_none() {
                let (ws, _) = tokio_tungstenite::connect_async(self.url.as_str())
                    .await
                    .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
                tracing::debug!(url = %self.url, "connected to remote");
                *conn = Some(ws);
            }
            let Some(ws) = conn.as_mut() else {
                return Err(RemoteError::Unavailable("connection closed".into()));
            };

            let result = exchange(ws, action).await;
            if matches!(
                result,
                Err(RemoteError::Unavailable(_)) | Err(RemoteError::Protocol(_))
            ) {
                *conn = None;
            }
            result
        })
    }
}

async fn exchange(ws: &mut WsStream, action: &QueuedAction) -> RemoteResult<Confirmation> {
    let json = ClientMessage::execute(action.clone())
        .to_json()
        .map_err(|e| RemoteError::Protocol(e.to_string()))?;
    ws.send(Message::Text(json.into()))
        .await
        .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                let msg = ServerMessage::from_json(&text)
                    .map_err(|e| RemoteError::Protocol(e.to_string()))?;
                match msg {
                    ServerMessage::Confirmed { id, confirmation } if id == action.id => {
                        return Ok(confirmation);
                    }
                    ServerMessage::Rejected { id, reason } if id == action.id => {
                        return Err(RemoteError::Rejected(reason));
                    }
                    ServerMessage::Error { message } => {
                        return Err(RemoteError::Protocol(message));
                    }
                    // Late answer to an abandoned call.
                    _ => continue,
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                return Err(RemoteError::Unavailable("connection closed".into()));
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(RemoteError::Unavailable(e.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
