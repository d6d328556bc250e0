use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::item::{Item, Outcome};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::intake::Intake;

/// Per-item transformation contract.
///
/// Total from the pool's perspective: given an [`Item`] it must return
/// exactly one [`Outcome`], representing any internal failure through the
/// outcome's status and error fields rather than aborting the worker.
#[async_trait]
pub trait Transform: Send + Sync {
    async fn transform(&self, item: Item) -> Outcome;
}

/// Fans items out across `concurrency` parallel workers and fans their
/// outcomes back onto a single channel.
///
/// No ordering is preserved across items once fanned out; within a single
/// item it is always transform-then-emit.
pub struct WorkerPool<T> {
    concurrency: usize,
    transform: Arc<T>,
    cancel: CancelToken,
    intake_tx: mpsc::Sender<Item>,
    intake_rx: mpsc::Receiver<Item>,
    results: mpsc::Sender<Outcome>,
}

impl<T> WorkerPool<T>
where
    T: Transform + 'static,
{
    /// Builds the pool and hands back the receive side of its output channel.
    /// `concurrency` is clamped to at least 1.
    pub fn new(
        cancel: CancelToken,
        concurrency: usize,
        transform: T,
    ) -> (Self, mpsc::Receiver<Outcome>) {
        let (intake_tx, intake_rx) = mpsc::channel(1);
        let (results, results_rx) = mpsc::channel(1);
        let pool = Self {
            concurrency: concurrency.max(1),
            transform: Arc::new(transform),
            cancel,
            intake_tx,
            intake_rx,
            results,
        };
        (pool, results_rx)
    }

    /// Builds the pool and starts it on a fresh task.
    pub fn spawn(
        cancel: CancelToken,
        concurrency: usize,
        transform: T,
    ) -> (Intake<Item>, mpsc::Receiver<Outcome>, JoinHandle<Result<()>>) {
        let (pool, results_rx) = Self::new(cancel, concurrency, transform);
        let intake = pool.intake();
        (intake, results_rx, tokio::spawn(pool.run()))
    }

    /// Enqueue handle for feeding the pool, by direct [`Intake::accept`]
    /// calls or by bridging an upstream channel with [`Intake::listen`].
    ///
    /// Grab this before [`WorkerPool::run`] consumes the pool; the queue
    /// drains and closes once every handle has dropped.
    pub fn intake(&self) -> Intake<Item> {
        Intake::new(self.intake_tx.clone(), self.cancel.clone())
    }

    /// Starts the workers and blocks until all of them have exited.
    ///
    /// The output channel closes only after the last worker has observably
    /// stopped: each worker owns a sender clone dropped on exit, and every
    /// worker handle is joined before this returns.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub async fn run(self) -> Result<()> {
        let Self {
            concurrency,
            transform,
            cancel,
            intake_rx,
            results,
            ..
        } = self;
        let queue = Arc::new(Mutex::new(intake_rx));

        let mut workers = Vec::with_capacity(concurrency);
        for worker in 0..concurrency {
            let queue = Arc::clone(&queue);
            let transform = Arc::clone(&transform);
            let cancel = cancel.clone();
            let out = results.clone();
            workers.push(tokio::spawn(async move {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::TRACE, event = "conveyor.worker.start", stage = "pool", worker = worker, "conveyor.worker.start");
                loop {
                    let item = tokio::select! {
                        _ = cancel.cancelled() => {
                            #[cfg(feature = "tracing")]
                            tracing::event!(tracing::Level::DEBUG, event = "conveyor.cancelled", stage = "pool", worker = worker, "conveyor.cancelled");
                            break;
                        }
                        msg = async { queue.lock().await.recv().await } => {
                            let Some(item) = msg else {
                                #[cfg(feature = "tracing")]
                                tracing::event!(tracing::Level::TRACE, event = "conveyor.worker.stop", stage = "pool", worker = worker, "conveyor.worker.stop");
                                break;
                            };
                            item
                        }
                    };

                    let outcome = transform.transform(item).await;
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        sent = out.send(outcome) => {
                            if sent.is_err() {
                                #[cfg(feature = "tracing")]
                                tracing::event!(tracing::Level::INFO, event = "conveyor.downstream.closed", stage = "pool", worker = worker, "conveyor.downstream.closed");
                                break;
                            }
                        }
                    }
                }
            }));
        }

        drop(results);
        for handle in workers {
            handle.await?;
        }

        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::DEBUG, event = "conveyor.stage.drained", stage = "pool", "conveyor.stage.drained");
        Ok(())
    }
}
