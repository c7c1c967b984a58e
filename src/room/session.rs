use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::models::PresenceUser;

/// Identity used when the upgrade request carries no `user_email`.
pub const ANONYMOUS: &str = "Anonymous";

/// A text frame queued for one peer. Shared across all recipients of a broadcast.
pub type Frame = Arc<str>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("outbound queue for session {0} is full")]
    QueueFull(Uuid),
    #[error("session {0} is no longer reading its queue")]
    Closed(Uuid),
}

/// Registry-side handle of one live connection.
///
/// The socket itself stays with the connection task; the registry only ever
/// reaches it through the bounded `outbound` queue.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    id: Uuid,
    identity: String,
    outbound: mpsc::Sender<Frame>,
    evicted: Arc<Notify>,
}

impl SessionHandle {
    pub fn new(identity: impl Into<String>, outbound: mpsc::Sender<Frame>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity: identity.into(),
            outbound,
            evicted: Arc::new(Notify::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn user(&self) -> PresenceUser {
        PresenceUser {
            email: self.identity.clone(),
            id: self.id.to_string(),
        }
    }

    /// Non-blocking enqueue.
    pub fn deliver(&self, frame: Frame) -> Result<(), DeliveryError> {
        self.outbound.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull(self.id),
            TrySendError::Closed(_) => DeliveryError::Closed(self.id),
        })
    }

    /// Ask the owning connection task to shut down.
    pub fn evict(&self) {
        // notify_one keeps a permit if the task is not parked on `evicted()` yet
        self.evicted.notify_one();
    }

    /// Resolves once `evict` has been called.
    pub async fn evicted(&self) {
        self.evicted.notified().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_session_ids_are_unique() {
        let (tx, _rx) = mpsc::channel(4);
        let a = SessionHandle::new("a@x.com", tx.clone());
        let b = SessionHandle::new("a@x.com", tx);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.user().email, "a@x.com");
        assert_eq!(a.user().id, a.id().to_string());
    }

    #[tokio::test]
    async fn test_deliver_reports_full_and_closed() {
        let (tx, rx) = mpsc::channel(1);
        let session = SessionHandle::new("a@x.com", tx);

        session.deliver(Arc::from("one")).unwrap();
        assert_eq!(
            session.deliver(Arc::from("two")),
            Err(DeliveryError::QueueFull(session.id()))
        );

        drop(rx);
        assert_eq!(
            session.deliver(Arc::from("three")),
            Err(DeliveryError::Closed(session.id()))
        );
    }

    #[tokio::test]
    async fn test_eviction_before_wait_is_not_lost() {
        let (tx, _rx) = mpsc::channel(1);
        let session = SessionHandle::new("a@x.com", tx);
        session.clone().evict();

        tokio::time::timeout(Duration::from_secs(1), session.evicted())
            .await
            .expect("eviction signal should be retained");
    }
}
