//! Idle-timer coalescing of rapid updates.
//!
//! Every `push` cancels the pending timer and starts a new one. When `idle`
//! passes without another value, the action runs once with the latest value.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Background worker that collapses a burst of values into one action call.
pub struct Coalescer<T> {
    tx: mpsc::UnboundedSender<T>,
    worker: JoinHandle<()>,
}

impl<T: Send + 'static> Coalescer<T> {
    /// Spawn the worker. Must be called inside a tokio runtime.
    pub fn new<F, Fut>(idle: Duration, mut action: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();
        let worker = tokio::spawn(async move {
            let mut pending: Option<T> = None;
            loop {
                if pending.is_none() {
                    match rx.recv().await {
                        Some(value) => pending = Some(value),
                        None => break,
                    }
                    continue;
                }
                tokio::select! {
                    msg = rx.recv() => match msg {
                        Some(value) => pending = Some(value),
                        None => {
                            if let Some(value) = pending.take() {
                                action(value).await;
                            }
                            break;
                        }
                    },
                    _ = tokio::time::sleep(idle) => {
                        if let Some(value) = pending.take() {
                            debug!("idle interval elapsed, flushing");
                            action(value).await;
                        }
                    }
                }
            }
        });
        Self { tx, worker }
    }

    /// Queue `value`, replacing any value still waiting. Returns false once
    /// the worker has stopped.
    pub fn push(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }

    /// Flush a waiting value immediately and wait for the worker to finish.
    pub async fn close(self) {
        let Self { tx, worker } = self;
        drop(tx);
        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "coalescer worker ended abnormally");
        }
    }
}
