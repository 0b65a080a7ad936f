use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

/// The authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
}

/// Tokens backing a session. Debug output never includes the tokens.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user: User,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credentials {
    /// True if the ID token is expired or expires within `margin`.
    pub fn expires_within(&self, margin: Duration) -> bool {
        Utc::now() + margin >= self.expires_at
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Producer side of the session notifications.
///
/// Holds the current session; identical consecutive states are not re-sent.
pub struct SessionChannel {
    tx: watch::Sender<Option<User>>,
}

impl SessionChannel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Publish a session state. Returns whether it was a transition.
    pub fn publish(&self, user: Option<User>) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == user {
                false
            } else {
                *current = user;
                true
            }
        })
    }

    pub fn current(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> SessionListener {
        SessionListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for SessionChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer side of the session notifications
pub struct SessionListener {
    rx: watch::Receiver<Option<User>>,
}

impl SessionListener {
    /// Latest session state, marked as seen
    pub fn latest(&mut self) -> Option<User> {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next transition. Returns false once the producer is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
