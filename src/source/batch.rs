use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::item::Item;
use crate::pipeline::cancel::CancelToken;

/// Pull contract for the external batch-fetching service.
///
/// Must be safe to call repeatedly. Returning an empty batch with no error
/// signals permanent exhaustion; a batch shorter than `size` near the end of
/// the data is expected and not an error.
#[async_trait]
pub trait BatchProvider: Send + Sync {
    async fn batch(&self, size: usize) -> Result<Vec<Item>>;
}

/// Converts a pull-based batch provider into a push-based bounded stream.
///
/// Items are republished one at a time onto a channel of `waterline` capacity,
/// the cross-stage backpressure knob. A small fetch-ahead buffer of up to
/// `batch_size` items sits between provider calls and the published stream.
pub struct BatchSource<P> {
    provider: P,
    batch_size: usize,
    cancel: CancelToken,
    buffer: VecDeque<Item>,
    feed: mpsc::Sender<Item>,
}

impl<P> BatchSource<P>
where
    P: BatchProvider + 'static,
{
    /// Builds the stage and hands back the receive side of its published
    /// stream, so downstream wiring can happen before [`BatchSource::run`]
    /// starts. Sizes are clamped to at least 1.
    pub fn new(
        cancel: CancelToken,
        provider: P,
        batch_size: usize,
        waterline: usize,
    ) -> (Self, mpsc::Receiver<Item>) {
        let (feed, items) = mpsc::channel(waterline.max(1));
        let source = Self {
            provider,
            batch_size: batch_size.max(1),
            cancel,
            buffer: VecDeque::new(),
            feed,
        };
        (source, items)
    }

    /// Builds the stage and starts it on a fresh task.
    pub fn spawn(
        cancel: CancelToken,
        provider: P,
        batch_size: usize,
        waterline: usize,
    ) -> (mpsc::Receiver<Item>, JoinHandle<Result<()>>) {
        let (source, items) = Self::new(cancel, provider, batch_size, waterline);
        (items, tokio::spawn(source.run()))
    }

    /// Fetch-and-forward loop.
    ///
    /// Exhaustion (an empty batch) and cancellation both return `Ok(())`; a
    /// provider error stops this stage only and is returned to whoever joins
    /// the task. In every exit path the published channel closes when the
    /// stage drops its sender.
    pub async fn run(mut self) -> Result<()> {
        loop {
            if self.buffer.is_empty() {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::DEBUG, event = "conveyor.batch.fetch", stage = "source", size = self.batch_size, "conveyor.batch.fetch");

                let batch = match self.provider.batch(self.batch_size).await {
                    Ok(batch) => batch,
                    Err(err) => {
                        #[cfg(feature = "tracing")]
                        tracing::event!(tracing::Level::WARN, event = "conveyor.batch.failed", stage = "source", error = %err, "conveyor.batch.failed");
                        return Err(err);
                    }
                };
                if batch.is_empty() {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "conveyor.batch.exhausted", stage = "source", "conveyor.batch.exhausted");
                    return Ok(());
                }
                self.buffer.extend(batch);
            }

            // Forward exactly one buffered item per turn, yielding to
            // cancellation while the feed is full.
            let Some(next) = self.buffer.pop_front() else {
                continue;
            };
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "conveyor.cancelled", stage = "source", "conveyor.cancelled");
                    return Ok(());
                }
                sent = self.feed.send(next) => {
                    if sent.is_err() {
                        #[cfg(feature = "tracing")]
                        tracing::event!(tracing::Level::INFO, event = "conveyor.downstream.closed", stage = "source", "conveyor.downstream.closed");
                        return Ok(());
                    }
                }
            }
        }
    }
}
