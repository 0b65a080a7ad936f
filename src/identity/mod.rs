// Identity provider access
//
// The application only talks to the provider through the `IdentityProvider` trait:
// - errors: provider error codes and their localized messages
// - session: the user value, its credentials, and the watch-based session channel
// - store: optional on-disk persistence of the signed-in session
// - firebase: Firebase Authentication over the Identity Toolkit REST API
//
// Session changes are never returned to the caller as view updates. Operations only
// change the session value; whoever needs to react subscribes to the channel.

pub mod errors;
pub mod firebase;
pub mod session;
pub mod store;

use async_trait::async_trait;

pub use errors::{firebase_error_message, AuthError};
pub use firebase::FirebaseIdentity;
pub use session::{Credentials, SessionChannel, SessionListener, User};
pub use store::SessionStore;

use crate::error::Result;

/// Operations offered by the identity provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in with email and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<User>;

    /// Create an account and sign it in
    async fn sign_up(&self, email: &str, password: &str) -> Result<User>;

    /// End the current session
    async fn sign_out(&self) -> Result<()>;

    /// Bearer token of the current session, refreshed when close to expiry
    async fn id_token(&self) -> Result<Option<String>>;

    /// Current session value
    fn current_user(&self) -> Option<User>;

    /// Register for session notifications. The first read yields the current session.
    fn subscribe(&self) -> SessionListener;
}
