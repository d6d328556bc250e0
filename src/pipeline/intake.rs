use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::pipeline::cancel::CancelToken;

/// Enqueue handle onto a stage's internal queue.
///
/// Both the direct [`Intake::accept`] path and the bridging [`Intake::listen`]
/// path feed the same queue; the queue has no identity of sender. The queue
/// closes once every `Intake` clone and the stage's own sender have dropped,
/// which is what lets a finished upstream ripple downstream as ordinary
/// exhaustion.
pub struct Intake<T> {
    tx: mpsc::Sender<T>,
    cancel: CancelToken,
}

impl<T> Clone for Intake<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<T: Send + 'static> Intake<T> {
    pub(crate) fn new(tx: mpsc::Sender<T>, cancel: CancelToken) -> Self {
        Self { tx, cancel }
    }

    /// Blocking enqueue. Applies backpressure while the stage queue is full.
    pub async fn accept(&self, value: T) -> Result<()> {
        self.tx
            .send(value)
            .await
            .map_err(|_| Error::pipeline("stage queue closed"))
    }

    /// Bridges an external stream into the stage queue, forwarding every
    /// value until the stream closes or cancellation fires.
    ///
    /// Consumes the handle: when the stream closes, dropping the underlying
    /// sender is what propagates shutdown into the stage.
    pub async fn listen(self, mut feed: mpsc::Receiver<T>) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "conveyor.cancelled", stage = "intake", "conveyor.cancelled");
                    return;
                }
                msg = feed.recv() => {
                    let Some(value) = msg else { return; };
                    if self.accept(value).await.is_err() {
                        #[cfg(feature = "tracing")]
                        tracing::event!(tracing::Level::INFO, event = "conveyor.downstream.closed", stage = "intake", "conveyor.downstream.closed");
                        return;
                    }
                }
            }
        }
    }
}
