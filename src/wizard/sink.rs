//! Outbound completion hand-off.
//!
//! The session hands the whole [`StepDataTree`] to a [`CompletionSink`]. A
//! [`TransformSink`] splits that into a pure transform to a domain payload
//! and an async [`PayloadPublisher`] that performs the I/O.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::tree::StepDataTree;
use crate::error::CompletionError;

/// Receives the final answers of a session.
#[async_trait]
pub trait CompletionSink: Send + Sync {
    async fn complete(&self, tree: &StepDataTree) -> Result<(), CompletionError>;
}

/// Delivers a domain payload somewhere (an API, a store, a queue).
#[async_trait]
pub trait PayloadPublisher<P>: Send + Sync {
    async fn publish(&self, payload: P) -> Result<(), CompletionError>;
}

/// Maps the tree with `transform`, then publishes the result.
pub struct TransformSink<P, F> {
    transform: F,
    publisher: Arc<dyn PayloadPublisher<P>>,
}

impl<P, F> TransformSink<P, F>
where
    F: Fn(&StepDataTree) -> Result<P, CompletionError> + Send + Sync,
{
    pub fn new(transform: F, publisher: Arc<dyn PayloadPublisher<P>>) -> Self {
        Self {
            transform,
            publisher,
        }
    }
}

#[async_trait]
impl<P, F> CompletionSink for TransformSink<P, F>
where
    P: Send + 'static,
    F: Fn(&StepDataTree) -> Result<P, CompletionError> + Send + Sync,
{
    async fn complete(&self, tree: &StepDataTree) -> Result<(), CompletionError> {
        let payload = (self.transform)(tree)?;
        self.publisher.publish(payload).await
    }
}

/// In-memory publisher that keeps every payload it receives.
///
/// Can be told to fail a number of upcoming publishes, to exercise the
/// recoverable completion-failure path.
pub struct MemoryPublisher<P> {
    published: RwLock<Vec<P>>,
    failures_remaining: AtomicU32,
}

impl<P> MemoryPublisher<P> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            published: RwLock::new(Vec::new()),
            failures_remaining: AtomicU32::new(0),
        })
    }

    /// Make the next `count` publishes fail.
    pub fn fail_next(&self, count: u32) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.published.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.published.read().await.is_empty()
    }
}

impl<P: Clone> MemoryPublisher<P> {
    pub async fn published(&self) -> Vec<P> {
        self.published.read().await.clone()
    }

    pub async fn last(&self) -> Option<P> {
        self.published.read().await.last().cloned()
    }
}

#[async_trait]
impl<P: Send + Sync> PayloadPublisher<P> for MemoryPublisher<P> {
    async fn publish(&self, payload: P) -> Result<(), CompletionError> {
        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            debug!("Memory publisher failing on request");
            return Err(CompletionError::rejected("publisher unavailable"));
        }

        let mut published = self.published.write().await;
        published.push(payload);
        info!(count = published.len(), "Payload published");
        Ok(())
    }
}

/// Identity transform: publish the tree itself.
pub fn tree_payload(tree: &StepDataTree) -> Result<StepDataTree, CompletionError> {
    Ok(tree.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transform_sink_publishes_transformed_payload() {
        let publisher = MemoryPublisher::<usize>::new();
        let sink = TransformSink::new(
            |tree: &StepDataTree| Ok(tree.len()),
            publisher.clone() as Arc<dyn PayloadPublisher<usize>>,
        );

        let tree = StepDataTree::initialize(&[]).unwrap();
        sink.complete(&tree).await.unwrap();
        assert_eq!(publisher.published().await, vec![0]);
    }

    #[tokio::test]
    async fn transform_errors_skip_publishing() {
        let publisher = MemoryPublisher::<usize>::new();
        let sink = TransformSink::new(
            |_: &StepDataTree| Err(CompletionError::transform("bad tree")),
            publisher.clone() as Arc<dyn PayloadPublisher<usize>>,
        );

        let tree = StepDataTree::initialize(&[]).unwrap();
        let err = sink.complete(&tree).await.unwrap_err();
        assert!(matches!(err, CompletionError::Transform { .. }));
        assert!(publisher.is_empty().await);
    }

    #[tokio::test]
    async fn memory_publisher_fails_requested_times() {
        let publisher = MemoryPublisher::<u8>::new();
        publisher.fail_next(2);

        assert!(publisher.publish(1).await.is_err());
        assert!(publisher.publish(2).await.is_err());
        publisher.publish(3).await.unwrap();

        assert_eq!(publisher.published().await, vec![3]);
        assert_eq!(publisher.last().await, Some(3));
    }
}
