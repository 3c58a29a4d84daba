//! In-process session provider backed by a watch channel.

use tokio::sync::watch;

use crate::models::Session;
use crate::workflow::SessionProvider;

/// Holds the current session and notifies subscribers when it changes.
pub struct SessionWatch {
    sender: watch::Sender<Option<Session>>,
}

impl SessionWatch {
    pub fn new(initial: Option<Session>) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Publish a new session (sign-in, token refresh) or `None` (sign-out).
    ///
    /// Subscribers are only notified when the session actually changed.
    pub fn publish(&self, session: Option<Session>) {
        self.sender.send_if_modified(|current| {
            if *current == session {
                false
            } else {
                *current = session;
                true
            }
        });
    }
}

impl SessionProvider for SessionWatch {
    fn current_session(&self) -> Option<Session> {
        self.sender.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.sender.subscribe()
    }
}
