//! Auth-state change notifications.
//!
//! Observers register with [`AuthEvents::subscribe`] and receive every
//! event published afterwards. Registration is tied to the returned
//! [`AuthSubscription`]: dropping it unregisters the observer, so a
//! consumer that goes away can never leak its slot.

use tokio::sync::broadcast;

use health_companion_core::UserId;

/// Events are dropped for subscribers lagging further behind than this.
const CHANNEL_CAPACITY: usize = 64;

/// A change in a user's authentication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user signed in through the sign-in form.
    SignedIn(UserId),
    /// A user signed out.
    SignedOut(UserId),
    /// A user deleted their account.
    AccountDeleted(UserId),
}

impl AuthEvent {
    /// The user the event is about.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        match self {
            Self::SignedIn(id) | Self::SignedOut(id) | Self::AccountDeleted(id) => *id,
        }
    }

    /// Short machine-readable name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "signed_in",
            Self::SignedOut(_) => "signed_out",
            Self::AccountDeleted(_) => "account_deleted",
        }
    }
}

/// Publisher side of the auth-state channel.
#[derive(Debug, Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

/// A live registration; dropping it unregisters the observer.
#[derive(Debug)]
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthEvent>,
}

impl AuthEvents {
    /// Create a channel with no observers.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Register an observer.
    #[must_use]
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live registrations.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Notify every live observer. Publishing with none registered is a no-op.
    pub fn publish(&self, event: AuthEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!(event = event.kind(), "No auth event subscribers");
        }
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSubscription {
    /// Wait for the next event.
    ///
    /// Returns `None` once the publisher is gone. Events missed because the
    /// subscriber lagged are skipped with a warning.
    pub async fn next(&mut self) -> Option<AuthEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Explicitly unregister. Equivalent to dropping the subscription.
    pub fn unsubscribe(self) {
        drop(self.receiver);
    }
}

/// Spawn a task that logs every auth event until the publisher is dropped.
pub fn spawn_audit_logger(events: &AuthEvents) -> tokio::task::JoinHandle<()> {
    let mut subscription = events.subscribe();
    tokio::spawn(async move {
        while let Some(event) = subscription.next().await {
            tracing::info!(
                event = event.kind(),
                user_id = %event.user_id(),
                "Auth state changed"
            );
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user_id() -> UserId {
        "6f1b3c7e-2a44-4d1e-9a4f-0c8e5b1d2e3f".parse().unwrap()
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_events() {
        let events = AuthEvents::new();
        let mut subscription = events.subscribe();

        events.publish(AuthEvent::SignedIn(user_id()));
        events.publish(AuthEvent::AccountDeleted(user_id()));

        assert_eq!(subscription.next().await, Some(AuthEvent::SignedIn(user_id())));
        assert_eq!(
            subscription.next().await,
            Some(AuthEvent::AccountDeleted(user_id()))
        );
    }

    #[test]
    fn test_drop_unregisters() {
        let events = AuthEvents::new();
        let first = events.subscribe();
        let second = events.subscribe();
        assert_eq!(events.subscriber_count(), 2);

        drop(first);
        assert_eq!(events.subscriber_count(), 1);

        second.unsubscribe();
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let events = AuthEvents::new();
        events.publish(AuthEvent::SignedOut(user_id()));
        assert_eq!(events.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_next_returns_none_when_publisher_dropped() {
        let events = AuthEvents::new();
        let mut subscription = events.subscribe();
        drop(events);
        assert_eq!(subscription.next().await, None);
    }

    #[test]
    fn test_event_accessors() {
        let event = AuthEvent::SignedOut(user_id());
        assert_eq!(event.kind(), "signed_out");
        assert_eq!(event.user_id(), user_id());
    }
}
