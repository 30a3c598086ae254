//! In-process message bus.
//!
//! Suitable for a single-node deployment and for tests. Messages are
//! fanned out to every live subscriber of a subject; subscribers that
//! dropped their end are pruned on the next publish.

use crate::{BusError, MessageBus, Subscription};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Default)]
pub struct MemoryBus {
    topics: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Vec<u8>>>>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageBus for MemoryBus {
    async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), BusError> {
        let mut topics = self.topics.lock().map_err(|e| BusError::Publish {
            subject: subject.to_string(),
            message: e.to_string(),
        })?;

        let Some(senders) = topics.get_mut(subject) else {
            debug!(subject, "publish with no subscribers");
            return Ok(());
        };
        senders.retain(|tx| tx.send(payload.to_vec()).is_ok());
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut topics = self.topics.lock().map_err(|e| BusError::Subscribe {
            subject: subject.to_string(),
            message: e.to_string(),
        })?;
        topics.entry(subject.to_string()).or_default().push(tx);
        Ok(Subscription::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subjects;

    #[tokio::test]
    async fn delivers_to_every_subscriber() {
        let bus = MemoryBus::new();
        let mut a = bus.subscribe(subjects::STATUS).await.unwrap();
        let mut b = bus.subscribe(subjects::STATUS).await.unwrap();

        bus.publish(subjects::STATUS, b"hello").await.unwrap();

        assert_eq!(a.next().await.unwrap(), b"hello");
        assert_eq!(b.next().await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn subjects_are_isolated() {
        let bus = MemoryBus::new();
        let mut status = bus.subscribe(subjects::STATUS).await.unwrap();

        bus.publish(subjects::COMPLETE, b"done").await.unwrap();
        bus.publish(subjects::STATUS, b"running").await.unwrap();

        assert_eq!(status.next().await.unwrap(), b"running");
        assert!(status.try_next().is_none());
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let bus = MemoryBus::new();
        bus.publish(subjects::INTAKE, b"ignored").await.unwrap();
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let bus = MemoryBus::new();
        let sub = bus.subscribe(subjects::STATUS).await.unwrap();
        drop(sub);

        bus.publish(subjects::STATUS, b"one").await.unwrap();
        bus.publish(subjects::STATUS, b"two").await.unwrap();

        let topics = bus.topics.lock().unwrap();
        assert!(topics.get(subjects::STATUS).unwrap().is_empty());
    }
}
