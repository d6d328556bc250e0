use std::fmt;

use serde::{Deserialize, Serialize};

/// A unit of input work with a stable identity and payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub payload: String,
}

impl Item {
    pub fn new(id: u64, payload: impl Into<String>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item #{} ({} bytes)", self.id, self.payload.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Failed,
}

/// The per-item processing result, carrying the identity of the [`Item`] it
/// was produced from.
///
/// A transform that fails must encode the failure here via
/// [`Outcome::failed`] rather than aborting its worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: u64,
    pub status: Status,
    pub error: Option<String>,
    pub body: String,
}

impl Outcome {
    pub fn ok(id: u64, body: impl Into<String>) -> Self {
        Self {
            id,
            status: Status::Ok,
            error: None,
            body: body.into(),
        }
    }

    pub fn failed(id: u64, error: impl Into<String>) -> Self {
        Self {
            id,
            status: Status::Failed,
            error: Some(error.into()),
            body: String::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(err) => write!(f, "outcome #{} {:?}: {err}", self.id, self.status),
            None => write!(f, "outcome #{} {:?}", self.id, self.status),
        }
    }
}
