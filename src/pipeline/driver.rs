use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::item::{Item, Outcome};
use crate::pipeline::cancel::CancelToken;
use crate::pool::{Transform, WorkerPool};
use crate::sink::{Sink, Writer};
use crate::source::batch::{BatchProvider, BatchSource};

/// Sizing knobs for a composed pipeline.
///
/// `source_waterline` is the capacity of the channel between the source and
/// the pool — the primary cross-stage backpressure control.
#[derive(Debug, Clone)]
pub struct Config {
    pub source_batch_size: usize,
    pub source_waterline: usize,
    pub pool_concurrency: usize,
    pub sink_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_batch_size: 64,
            source_waterline: 128,
            pool_concurrency: 4,
            sink_concurrency: 2,
        }
    }
}

struct Wiring<P, T, W> {
    source: BatchSource<P>,
    pool: WorkerPool<T>,
    sink: Sink<W>,
    items: mpsc::Receiver<Item>,
    results: mpsc::Receiver<Outcome>,
}

/// Composes the three stages from injected collaborators and drives their
/// lifecycle: constructed → started → draining → done.
///
/// Every termination path — source exhaustion, a fetch failure, external
/// cancellation — converges on the sink firing its completion signal, so
/// [`Driver::wait`] always resolves.
pub struct Driver<P, T, W> {
    cancel: CancelToken,
    wiring: Option<Wiring<P, T, W>>,
    completion: Option<oneshot::Receiver<()>>,
    handles: Vec<JoinHandle<Result<()>>>,
}

impl<P, T, W> Driver<P, T, W>
where
    P: BatchProvider + 'static,
    T: Transform + 'static,
    W: Writer + 'static,
{
    pub fn new(provider: P, transform: T, writer: W, config: Config) -> Self {
        let cancel = CancelToken::new();
        let (source, items) = BatchSource::new(
            cancel.clone(),
            provider,
            config.source_batch_size,
            config.source_waterline,
        );
        let (pool, results) = WorkerPool::new(cancel.clone(), config.pool_concurrency, transform);
        let (sink, completion) = Sink::new(cancel.clone(), config.sink_concurrency, writer);

        Self {
            cancel,
            wiring: Some(Wiring {
                source,
                pool,
                sink,
                items,
                results,
            }),
            completion: Some(completion),
            handles: Vec::new(),
        }
    }

    /// Shared stop signal for the whole pipeline; clone it into signal
    /// handlers or tests and call [`CancelToken::cancel`] to stop all stages.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Starts the three stage run loops and the two bridging tasks.
    pub fn start(&mut self) -> Result<()> {
        let Some(wiring) = self.wiring.take() else {
            return Err(Error::pipeline("pipeline already started"));
        };
        let Wiring {
            source,
            pool,
            sink,
            items,
            results,
        } = wiring;

        let pool_intake = pool.intake();
        let sink_intake = sink.intake();

        self.handles.push(tokio::spawn(source.run()));
        self.handles.push(tokio::spawn(pool.run()));
        self.handles.push(tokio::spawn(sink.run()));
        self.handles.push(tokio::spawn(async move {
            pool_intake.listen(items).await;
            Ok::<(), Error>(())
        }));
        self.handles.push(tokio::spawn(async move {
            sink_intake.listen(results).await;
            Ok::<(), Error>(())
        }));
        Ok(())
    }

    /// Blocks until the sink reports full drain, then joins every stage task
    /// and surfaces the first deferred stage failure, if any.
    ///
    /// A source fetch failure therefore shows up here as an error after the
    /// pipeline has still drained everything fetched before the failure.
    pub async fn wait(&mut self) -> Result<()> {
        if self.wiring.is_some() {
            return Err(Error::pipeline("pipeline not started"));
        }
        let Some(done) = self.completion.take() else {
            return Err(Error::pipeline("pipeline already waited"));
        };
        let _ = done.await;

        let mut first_err = None;
        for handle in self.handles.drain(..) {
            let joined = match handle.await {
                Ok(res) => res,
                Err(err) => Err(Error::from(err)),
            };
            if let Err(err) = joined {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::WARN, event = "conveyor.stage.failed", error = %err, "conveyor.stage.failed");
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
