// Firebase Authentication over REST
// Endpoints: accounts:signInWithPassword, accounts:signUp (Identity Toolkit) and
// token (Secure Token) for refreshing ID tokens.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use super::errors::{AuthError, INTERNAL_ERROR};
use super::session::{Credentials, SessionChannel, SessionListener, User};
use super::store::SessionStore;
use super::IdentityProvider;
use crate::config::{FirebaseConfig, IdentitySettings};
use crate::error::{AppError, Result};

/// ID tokens expiring within this window are refreshed before use
const TOKEN_REFRESH_MARGIN_SECS: i64 = 30;

/// Used when the provider omits or garbles `expiresIn`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

pub struct FirebaseIdentity {
    client: Client,
    api_key: String,
    identity_toolkit_url: String,
    secure_token_url: String,
    credentials: Mutex<Option<Credentials>>,
    session: SessionChannel,
    store: Option<SessionStore>,
}

impl FirebaseIdentity {
    /// Validate the configuration, build the client, and restore a persisted session.
    pub async fn initialize(config: &FirebaseConfig, settings: &IdentitySettings) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AppError::Init("apiKey is missing from the configuration".to_string()));
        }
        if config.project_id.trim().is_empty() {
            return Err(AppError::Init("projectId is missing from the configuration".to_string()));
        }
        for endpoint in [&settings.identity_toolkit_url, &settings.secure_token_url] {
            Url::parse(endpoint)
                .map_err(|e| AppError::Init(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
        }

        let client = Client::builder()
            .user_agent(concat!("subfetch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Init(format!("Failed to create HTTP client: {}", e)))?;

        let store = settings
            .persist_session
            .then(|| SessionStore::new(&settings.session_file));

        let identity = Self {
            client,
            api_key: config.api_key.clone(),
            identity_toolkit_url: settings.identity_toolkit_url.trim_end_matches('/').to_string(),
            secure_token_url: settings.secure_token_url.trim_end_matches('/').to_string(),
            credentials: Mutex::new(None),
            session: SessionChannel::new(),
            store,
        };

        identity.restore().await;

        info!("Identity client initialized for project '{}'", config.project_id);
        Ok(identity)
    }

    async fn restore(&self) {
        let Some(store) = &self.store else {
            return;
        };

        let credentials = match store.load() {
            Ok(Some(credentials)) => credentials,
            Ok(None) => return,
            Err(e) => {
                warn!("Discarding unreadable stored session: {}", e);
                if let Err(e) = store.clear() {
                    warn!("Failed to remove stored session: {}", e);
                }
                return;
            }
        };

        if !credentials.expires_within(Self::refresh_margin()) {
            info!("Restored stored session for uid {}", credentials.user.uid);
            self.install(credentials);
            return;
        }

        match self.refresh(&credentials).await {
            Ok(fresh) => {
                info!("Restored and refreshed stored session for uid {}", fresh.user.uid);
                self.install(fresh);
            }
            Err(AppError::Auth(e)) if !e.is_network() => {
                info!("Stored session rejected by the provider ({}), signing out", e.code());
                if let Err(e) = self.end_session() {
                    warn!("Failed to remove stored session: {}", e);
                }
            }
            Err(e) => {
                warn!("Could not refresh stored session, keeping it: {}", e);
                self.install(credentials);
            }
        }
    }

    fn refresh_margin() -> Duration {
        Duration::seconds(TOKEN_REFRESH_MARGIN_SECS)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Credentials>> {
        self.credentials.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `credentials` the active session and persist it.
    fn install(&self, credentials: Credentials) {
        let user = credentials.user.clone();

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&credentials) {
                warn!("Failed to persist session: {}", e);
            }
        }

        *self.lock() = Some(credentials);
        self.session.publish(Some(user));
    }

    /// Drop the active session. The stored copy goes first so a failure leaves the
    /// session untouched.
    fn end_session(&self) -> Result<()> {
        if let Some(store) = &self.store {
            store.clear()?;
        }

        *self.lock() = None;
        self.session.publish(None);
        Ok(())
    }

    async fn password_request(&self, method: &str, email: &str, password: &str) -> Result<Credentials> {
        let url = format!("{}/{}", self.identity_toolkit_url, method);
        debug!("Sending identity request to: {}", url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| {
                warn!("Identity request failed: {}", e);
                AuthError::network()
            })?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await.into());
        }

        let body: PasswordResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse identity response: {}", e);
            AuthError::new(INTERNAL_ERROR)
        })?;

        Ok(Credentials {
            user: User {
                uid: body.local_id,
                email: body.email.or_else(|| Some(email.to_string())),
            },
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: expires_at(body.expires_in.as_deref()),
        })
    }

    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials> {
        let url = format!("{}/token", self.secure_token_url);
        debug!("Refreshing ID token for uid {}", credentials.user.uid);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", credentials.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!("Token refresh request failed: {}", e);
                AuthError::network()
            })?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await.into());
        }

        let body: RefreshResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse token refresh response: {}", e);
            AuthError::new(INTERNAL_ERROR)
        })?;

        Ok(Credentials {
            user: credentials.user.clone(),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: expires_at(body.expires_in.as_deref()),
        })
    }

    async fn rejection(response: Response) -> AuthError {
        let status = response.status();
        match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => {
                debug!("Provider rejected request ({}): {}", status, envelope.error.message);
                AuthError::from_rest_message(&envelope.error.message)
            }
            Err(e) => {
                warn!("Unreadable provider error ({}): {}", status, e);
                AuthError::new(INTERNAL_ERROR)
            }
        }
    }
}

fn expires_at(expires_in: Option<&str>) -> DateTime<Utc> {
    let seconds = expires_in
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    Utc::now() + Duration::seconds(seconds)
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        let credentials = self
            .password_request("accounts:signInWithPassword", email, password)
            .await?;
        let user = credentials.user.clone();
        self.install(credentials);
        info!("Signed in uid {}", user.uid);
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User> {
        let credentials = self.password_request("accounts:signUp", email, password).await?;
        let user = credentials.user.clone();
        self.install(credentials);
        info!("Created account uid {}", user.uid);
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        self.end_session()
            .map_err(|e| AppError::SignOut(format!("Failed to remove stored session: {}", e)))?;
        info!("Signed out");
        Ok(())
    }

    async fn id_token(&self) -> Result<Option<String>> {
        let current = self.lock().clone();
        let Some(credentials) = current else {
            return Ok(None);
        };

        if !credentials.expires_within(Self::refresh_margin()) {
            return Ok(Some(credentials.id_token));
        }

        match self.refresh(&credentials).await {
            Ok(fresh) => {
                let token = fresh.id_token.clone();
                self.install(fresh);
                Ok(Some(token))
            }
            Err(AppError::Auth(e)) if !e.is_network() => {
                info!("Session expired ({}), signing out", e.code());
                if let Err(clear_err) = self.end_session() {
                    warn!("Failed to remove stored session: {}", clear_err);
                }
                Err(e.into())
            }
            Err(e) => Err(e),
        }
    }

    fn current_user(&self) -> Option<User> {
        self.session.current()
    }

    fn subscribe(&self) -> SessionListener {
        self.session.subscribe()
    }
}
