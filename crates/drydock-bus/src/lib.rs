//! Message-bus abstraction for the Drydock build engine.
//!
//! The engine publishes job lifecycle snapshots and consumes build
//! requests through this trait, so the transport stays swappable. The
//! contract is deliberately small: at-least-once delivery, broadcast
//! semantics (every subscriber sees every message on its subject), and no
//! ordering guarantee between publishers. Consumers must tolerate
//! duplicates.

pub mod memory;

pub use memory::MemoryBus;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Well-known subjects the engine uses.
pub mod subjects {
    /// Inbound serialized build jobs.
    pub const INTAKE: &str = "builds.intake";
    /// Job snapshot on every status transition.
    pub const STATUS: &str = "builds.status";
    /// Final job snapshot, published once per job.
    pub const COMPLETE: &str = "builds.complete";
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("publish to {subject} failed: {message}")]
    Publish { subject: String, message: String },

    #[error("subscribe to {subject} failed: {message}")]
    Subscribe { subject: String, message: String },
}

/// A live subscription to one subject.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl Subscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self { receiver }
    }

    /// Wait for the next message. Returns `None` once the bus side closes.
    pub async fn next(&mut self) -> Option<Vec<u8>> {
        self.receiver.recv().await
    }

    /// Non-blocking poll, mostly useful in tests.
    pub fn try_next(&mut self) -> Option<Vec<u8>> {
        self.receiver.try_recv().ok()
    }
}

/// Transport-agnostic publish/subscribe bus with byte payloads.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), BusError>;

    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError>;
}
