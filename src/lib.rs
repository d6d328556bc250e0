//! # conveyor
//!
//! **Staged concurrent pipelines over bounded Tokio channels.**
//!
//! `conveyor` moves discrete work items from a pull-based batch source,
//! through a pool of parallel transformation workers, to a pool of parallel
//! output writers, with bounded in-flight buffering at each stage boundary
//! and coordinated graceful shutdown.
//!
//! It is designed for production constraints:
//!
//! - bounded memory: every inter-stage queue has a fixed capacity
//! - backpressure: a full queue blocks its producer, nothing else throttles
//! - graceful shutdown: one shared [`CancelToken`] observed at every wait
//! - no item loss on the happy path: a stage's output closes only after all
//!   of its workers have stopped
//!
//! ---
//!
//! ## Core Model
//!
//! A pipeline is three fixed stages wired by a [`Driver`]:
//!
//! ```text
//! BatchSource → WorkerPool → Sink
//! ```
//!
//! The source converts a pull-based "give me up to N items" provider into a
//! push-based stream of [`Item`]s over a channel of `source_waterline`
//! capacity. The pool fans items out across `pool_concurrency` workers, each
//! applying the injected [`Transform`], and fans the resulting [`Outcome`]s
//! back in. The sink drains outcomes through `sink_concurrency` writers and
//! fires a single completion signal once fully drained.
//!
//! ---
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Mutex;
//!
//! use async_trait::async_trait;
//! use conveyor::error::Result;
//! use conveyor::prelude::*;
//!
//! struct Backlog(Mutex<Vec<Item>>);
//!
//! #[async_trait]
//! impl BatchProvider for Backlog {
//!     async fn batch(&self, size: usize) -> Result<Vec<Item>> {
//!         let mut backlog = self.0.lock().unwrap();
//!         let take = size.min(backlog.len());
//!         Ok(backlog.drain(..take).collect())
//!     }
//! }
//!
//! struct Shout;
//!
//! #[async_trait]
//! impl Transform for Shout {
//!     async fn transform(&self, item: Item) -> Outcome {
//!         Outcome::ok(item.id, item.payload.to_uppercase())
//!     }
//! }
//!
//! struct Stdout;
//!
//! #[async_trait]
//! impl Writer for Stdout {
//!     async fn write(&self, outcome: &Outcome) -> Result<()> {
//!         println!("{outcome}");
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let backlog = Backlog(Mutex::new(
//!         (0..1000).map(|id| Item::new(id, "hello")).collect(),
//!     ));
//!
//!     let mut driver = Driver::new(backlog, Shout, Stdout, Config::default());
//!     driver.start()?;
//!     driver.wait().await
//! }
//! ```
//!
//! ---
//!
//! ## Shutdown Contract
//!
//! - Exhaustion: an empty batch from the provider closes the source's stream;
//!   closure ripples downstream as each stage drains and its output closes in
//!   turn, until the sink fires completion.
//! - Fetch failure: stops the source stage only — the rest of the pipeline
//!   drains what was already fetched, completion still fires, and
//!   [`Driver::wait`] returns the provider's error afterwards.
//! - Transform failure: never escapes a worker; it is encoded in the
//!   [`Outcome`] and travels to the sink like any other result.
//! - Write failure: reported and dropped, no retry; completion signals drain,
//!   not success.
//! - Cancellation: every stage exits promptly at its next wait; queued items
//!   may be dropped, and the pipeline still converges on completion.
//!
//! ---
//!
//! ## Observability
//!
//! Enable tracing instrumentation with the default `tracing` feature.
//! `conveyor` emits structured events such as `conveyor.batch.fetch`,
//! `conveyor.batch.exhausted`, `conveyor.batch.failed`,
//! `conveyor.write.failed`, `conveyor.downstream.closed`,
//! `conveyor.stage.drained` and `conveyor.cancelled`. Disabling the feature
//! compiles the instrumentation out.
//!
//! ---
//!
//! [`CancelToken`]: pipeline::cancel::CancelToken
//! [`Driver`]: pipeline::driver::Driver
//! [`Item`]: item::Item
//! [`Outcome`]: item::Outcome
//! [`Transform`]: pool::Transform
//! [`Writer`]: sink::Writer
//! [`BatchProvider`]: source::batch::BatchProvider

pub mod error;
pub mod item;
pub mod pipeline;
pub mod pool;
pub mod sink;
pub mod source;

pub mod prelude {
    //! Convenient imports for most `conveyor` users.

    pub use crate::item::{Item, Outcome, Status};
    pub use crate::pipeline::cancel::CancelToken;
    pub use crate::pipeline::driver::{Config, Driver};
    pub use crate::pipeline::intake::Intake;
    pub use crate::pool::{Transform, WorkerPool};
    pub use crate::sink::{Sink, Writer};
    pub use crate::source::batch::{BatchProvider, BatchSource};
}
