#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use conveyor::error::{Error, Result};
use conveyor::item::{Item, Outcome};
use conveyor::pool::Transform;
use conveyor::sink::Writer;
use conveyor::source::batch::BatchProvider;

pub fn items(count: u64) -> Vec<Item> {
    (0..count)
        .map(|id| Item::new(id, format!("payload-{id}")))
        .collect()
}

/// Serves a fixed backlog in provider-sized batches, then reports exhaustion.
pub struct VecProvider {
    backlog: Mutex<VecDeque<Item>>,
}

impl VecProvider {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            backlog: Mutex::new(items.into()),
        }
    }
}

#[async_trait]
impl BatchProvider for VecProvider {
    async fn batch(&self, size: usize) -> Result<Vec<Item>> {
        let mut backlog = self.backlog.lock().unwrap();
        let take = size.min(backlog.len());
        Ok(backlog.drain(..take).collect())
    }
}

/// Serves a script of pre-cut batches, then fails every further call.
pub struct FailingProvider {
    batches: Mutex<VecDeque<Vec<Item>>>,
}

impl FailingProvider {
    pub fn new(batches: Vec<Vec<Item>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
        }
    }
}

#[async_trait]
impl BatchProvider for FailingProvider {
    async fn batch(&self, _size: usize) -> Result<Vec<Item>> {
        match self.batches.lock().unwrap().pop_front() {
            Some(batch) => Ok(batch),
            None => Err(Error::provider("backing store unavailable")),
        }
    }
}

pub struct EchoTransform;

#[async_trait]
impl Transform for EchoTransform {
    async fn transform(&self, item: Item) -> Outcome {
        Outcome::ok(item.id, item.payload)
    }
}

pub struct SlowTransform {
    pub delay: Duration,
}

#[async_trait]
impl Transform for SlowTransform {
    async fn transform(&self, item: Item) -> Outcome {
        tokio::time::sleep(self.delay).await;
        Outcome::ok(item.id, item.payload)
    }
}

/// Rejects odd ids, encoding the failure in the outcome.
pub struct FlakyTransform;

#[async_trait]
impl Transform for FlakyTransform {
    async fn transform(&self, item: Item) -> Outcome {
        if item.id % 2 == 1 {
            Outcome::failed(item.id, "odd id rejected")
        } else {
            Outcome::ok(item.id, item.payload)
        }
    }
}

pub struct CountingWriter {
    count: Arc<AtomicUsize>,
}

impl CountingWriter {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (
            Self {
                count: count.clone(),
            },
            count,
        )
    }
}

#[async_trait]
impl Writer for CountingWriter {
    async fn write(&self, _outcome: &Outcome) -> Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct CollectWriter {
    out: Arc<Mutex<Vec<Outcome>>>,
}

impl CollectWriter {
    pub fn new() -> (Self, Arc<Mutex<Vec<Outcome>>>) {
        let out = Arc::new(Mutex::new(Vec::new()));
        (Self { out: out.clone() }, out)
    }
}

#[async_trait]
impl Writer for CollectWriter {
    async fn write(&self, outcome: &Outcome) -> Result<()> {
        self.out.lock().unwrap().push(outcome.clone());
        Ok(())
    }
}

/// Fails writes for odd ids; counts attempts and successes separately.
pub struct FailingWriter {
    attempts: Arc<AtomicUsize>,
    successes: Arc<AtomicUsize>,
}

impl FailingWriter {
    pub fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let attempts = Arc::new(AtomicUsize::new(0));
        let successes = Arc::new(AtomicUsize::new(0));
        (
            Self {
                attempts: attempts.clone(),
                successes: successes.clone(),
            },
            attempts,
            successes,
        )
    }
}

#[async_trait]
impl Writer for FailingWriter {
    async fn write(&self, outcome: &Outcome) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if outcome.id % 2 == 1 {
            return Err(Error::write("record store rejected the outcome"));
        }
        self.successes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
