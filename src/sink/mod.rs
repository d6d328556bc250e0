use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::item::Outcome;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::intake::Intake;

/// Write contract for the persistence backend.
///
/// May fail; a failure is non-fatal to the pipeline.
#[async_trait]
pub trait Writer: Send + Sync {
    async fn write(&self, outcome: &Outcome) -> Result<()>;
}

/// Drains outcomes through `concurrency` parallel writers and fires a single
/// completion signal once every writer has exited.
///
/// A failed write is reported through tracing and the outcome dropped; the
/// completion signal means drained, not all-writes-succeeded.
pub struct Sink<W> {
    concurrency: usize,
    writer: Arc<W>,
    cancel: CancelToken,
    intake_tx: mpsc::Sender<Outcome>,
    intake_rx: mpsc::Receiver<Outcome>,
    done: oneshot::Sender<()>,
}

impl<W> Sink<W>
where
    W: Writer + 'static,
{
    /// Builds the sink and hands back its completion handle, available before
    /// [`Sink::run`] starts. `concurrency` is clamped to at least 1.
    pub fn new(
        cancel: CancelToken,
        concurrency: usize,
        writer: W,
    ) -> (Self, oneshot::Receiver<()>) {
        let (intake_tx, intake_rx) = mpsc::channel(1);
        let (done, done_rx) = oneshot::channel();
        let sink = Self {
            concurrency: concurrency.max(1),
            writer: Arc::new(writer),
            cancel,
            intake_tx,
            intake_rx,
            done,
        };
        (sink, done_rx)
    }

    /// Builds the sink and starts it on a fresh task.
    pub fn spawn(
        cancel: CancelToken,
        concurrency: usize,
        writer: W,
    ) -> (Intake<Outcome>, oneshot::Receiver<()>, JoinHandle<Result<()>>) {
        let (sink, done_rx) = Self::new(cancel, concurrency, writer);
        let intake = sink.intake();
        (intake, done_rx, tokio::spawn(sink.run()))
    }

    /// Enqueue handle for feeding the sink; same contract as the pool's.
    pub fn intake(&self) -> Intake<Outcome> {
        Intake::new(self.intake_tx.clone(), self.cancel.clone())
    }

    /// Starts the writers, blocks until all of them have exited, then fires
    /// the completion signal exactly once.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub async fn run(self) -> Result<()> {
        let Self {
            concurrency,
            writer,
            cancel,
            intake_rx,
            done,
            ..
        } = self;
        let queue = Arc::new(Mutex::new(intake_rx));

        let mut writers = Vec::with_capacity(concurrency);
        for worker in 0..concurrency {
            let queue = Arc::clone(&queue);
            let writer = Arc::clone(&writer);
            let cancel = cancel.clone();
            writers.push(tokio::spawn(async move {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::TRACE, event = "conveyor.worker.start", stage = "sink", worker = worker, "conveyor.worker.start");
                loop {
                    let outcome = tokio::select! {
                        _ = cancel.cancelled() => {
                            #[cfg(feature = "tracing")]
                            tracing::event!(tracing::Level::DEBUG, event = "conveyor.cancelled", stage = "sink", worker = worker, "conveyor.cancelled");
                            break;
                        }
                        msg = async { queue.lock().await.recv().await } => {
                            let Some(outcome) = msg else {
                                #[cfg(feature = "tracing")]
                                tracing::event!(tracing::Level::TRACE, event = "conveyor.worker.stop", stage = "sink", worker = worker, "conveyor.worker.stop");
                                break;
                            };
                            outcome
                        }
                    };

                    if let Err(err) = writer.write(&outcome).await {
                        // No retry: report and drop.
                        #[cfg(feature = "tracing")]
                        tracing::event!(tracing::Level::WARN, event = "conveyor.write.failed", stage = "sink", worker = worker, id = outcome.id, error = %err, "conveyor.write.failed");
                    }
                }
            }));
        }

        for handle in writers {
            handle.await?;
        }

        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::DEBUG, event = "conveyor.stage.drained", stage = "sink", "conveyor.stage.drained");
        let _ = done.send(());
        Ok(())
    }
}
