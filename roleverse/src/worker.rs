//! Background task that talks to the game server.
//!
//! The UI loop owns the state machine and never awaits the network. It sends
//! [`Request`]s down one channel and picks [`Reply`]s up from another between
//! frames, so animations and skips keep working while a call is outstanding.

use std::sync::Arc;

use roleverse_core::{execute, GameBackend, Reply, Request};
use tokio::sync::mpsc;

/// Channel endpoints held by the UI loop.
pub struct WorkerHandle {
    pub request_tx: mpsc::UnboundedSender<Request>,
    pub reply_rx: mpsc::UnboundedReceiver<Reply>,
}

/// Spawn the worker. It stops once the request sender is dropped.
pub fn spawn_worker<B: GameBackend + 'static>(backend: B) -> WorkerHandle {
    let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Request>();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();
    let backend = Arc::new(backend);

    tokio::spawn(async move {
        while let Some(request) = request_rx.recv().await {
            // Health polls and status refreshes may overlap a slow action, so
            // every call gets its own task. The machine serializes the rest.
            let backend = Arc::clone(&backend);
            let reply_tx = reply_tx.clone();
            tokio::spawn(async move {
                let reply = execute(backend.as_ref(), request).await;
                if reply_tx.send(reply).is_err() {
                    tracing::debug!("UI loop gone, dropping reply");
                }
            });
        }
        tracing::debug!("worker stopped");
    });

    WorkerHandle {
        request_tx,
        reply_rx,
    }
}
