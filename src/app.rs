use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::{ConfigLoader, ConfigSource, FirebaseConfig, Settings};
use crate::error::{AppError, Result};
use crate::identity::{firebase_error_message, FirebaseIdentity, IdentityProvider, SessionListener};
use crate::remote::{TranscriptClient, TranscriptRequest};
use crate::ui::{AuthForm, Downloads, ElementId, ErrorScope, ViewController, ViewState};

pub const CONFIG_MISSING_MESSAGE: &str =
    "Virhe: Firebase-konfiguraatiota ei löydy. Luo firebase_config.json tiedosto.";
pub const NOT_SIGNED_IN_MESSAGE: &str = "Sinun täytyy olla kirjautunut sisään";
pub const MISSING_CONTENT_MESSAGE: &str = "Transkriptio valmis, mutta sisältö puuttuu vastauksesta.";

/// Upper bound for `App::settle`
const SETTLE_TIMEOUT: Duration = Duration::from_millis(500);

/// Something the user did on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    ShowSignup,
    ShowLogin,
    TogglePassword(AuthForm),
    SubmitLogin,
    SubmitSignup,
    SubmitTranscript,
    Logout,
}

/// Resets a button's loading state when dropped
struct Loading<'a> {
    view: &'a ViewController,
    button: ElementId,
}

impl<'a> Loading<'a> {
    fn start(view: &'a ViewController, button: ElementId) -> Self {
        view.set_button_loading(button, true);
        Self { view, button }
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.view.set_button_loading(self.button, false);
    }
}

/// Composition root: owns the clients and the view
pub struct App {
    identity: Arc<dyn IdentityProvider>,
    transcripts: TranscriptClient,
    downloads: Downloads,
    view: ViewController,
    listener: JoinHandle<()>,
}

impl App {
    /// Load the configuration, initialize the identity client, then start listening
    /// for session changes. Stops at the first failure, leaving a banner on the
    /// login view.
    pub async fn start(source: &ConfigSource, settings: &Settings, view: ViewController) -> Result<Self> {
        let config = match ConfigLoader::load(source).await {
            Ok(config) => config,
            Err(e) => {
                error!("Error loading provider configuration: {}", e);
                view.show_error(ErrorScope::Login, CONFIG_MISSING_MESSAGE);
                return Err(e);
            }
        };

        let identity = match FirebaseIdentity::initialize(&config, &settings.identity).await {
            Ok(identity) => identity,
            Err(e) => {
                error!("Error initializing identity client: {}", e);
                view.show_error(
                    ErrorScope::Login,
                    &format!("Virhe Firebase-alustuksessa: {}", e),
                );
                return Err(e);
            }
        };

        Self::with_identity(&config, settings, Arc::new(identity), view)
    }

    /// Assemble the application around an already initialized identity provider.
    pub fn with_identity(
        config: &FirebaseConfig,
        settings: &Settings,
        identity: Arc<dyn IdentityProvider>,
        view: ViewController,
    ) -> Result<Self> {
        let transcripts = TranscriptClient::new(config, &settings.functions)?;
        let downloads = Downloads::new(&settings.ui.download_dir);
        let listener = spawn_session_listener(identity.subscribe(), view.clone());

        info!(
            "Application started, transcripts via {}, saving to {}",
            transcripts.endpoint(),
            downloads.dir().display()
        );
        Ok(Self {
            identity,
            transcripts,
            downloads,
            view,
            listener,
        })
    }

    pub fn view(&self) -> &ViewController {
        &self.view
    }

    pub fn transcript_endpoint(&self) -> &str {
        self.transcripts.endpoint()
    }

    /// Wait until the view has caught up with the current session.
    pub async fn settle(&self) {
        let signed_in = self.identity.current_user().is_some();
        let mut states = self.view.subscribe_state();
        let caught_up = tokio::time::timeout(
            SETTLE_TIMEOUT,
            states.wait_for(|state| (*state == ViewState::LoggedIn) == signed_in),
        )
        .await
        .is_ok();
        if !caught_up {
            debug!("View did not follow the session within {:?}", SETTLE_TIMEOUT);
        }
    }

    pub async fn dispatch(&self, event: UiEvent) {
        debug!("Dispatching {:?}", event);
        match event {
            UiEvent::ShowSignup => self.view.show_signup_form(),
            UiEvent::ShowLogin => self.view.show_login_form(),
            UiEvent::TogglePassword(form) => self.view.toggle_password_visibility(form),
            UiEvent::SubmitLogin => self.submit_auth(AuthForm::Login).await,
            UiEvent::SubmitSignup => self.submit_auth(AuthForm::Signup).await,
            UiEvent::SubmitTranscript => {
                if self.busy(ElementId::TranscriptButton) {
                    return;
                }
                let video_url = self.view.value(ElementId::YoutubeUrl);
                self.handle_transcript_submit(&video_url).await;
            }
            UiEvent::Logout => self.handle_logout().await,
        }
    }

    fn busy(&self, button: ElementId) -> bool {
        let busy = self.view.is_disabled(button);
        if busy {
            debug!("{} is busy, ignoring submit", button.as_str());
        }
        busy
    }

    async fn submit_auth(&self, form: AuthForm) {
        if self.busy(form.submit_button()) {
            return;
        }
        let email = self.view.value(form.email_input());
        let password = self.view.value(form.password_input());
        match form {
            AuthForm::Login => self.handle_login(&email, &password).await,
            AuthForm::Signup => self.handle_signup(&email, &password).await,
        }
    }

    pub async fn handle_login(&self, email: &str, password: &str) {
        let form = AuthForm::Login;
        let _loading = Loading::start(&self.view, form.submit_button());
        match self.identity.sign_in(email, password).await {
            // the session listener switches to the dashboard
            Ok(_) => info!("Login successful: {}", email),
            Err(e) => {
                error!("Login error: {}", e);
                self.view.show_error(form.error_scope(), &auth_message(&e));
            }
        }
    }

    pub async fn handle_signup(&self, email: &str, password: &str) {
        let form = AuthForm::Signup;
        let _loading = Loading::start(&self.view, form.submit_button());
        match self.identity.sign_up(email, password).await {
            Ok(_) => info!("Signup successful: {}", email),
            Err(e) => {
                error!("Signup error: {}", e);
                self.view.show_error(form.error_scope(), &auth_message(&e));
            }
        }
    }

    pub async fn handle_logout(&self) {
        match self.identity.sign_out().await {
            Ok(()) => {
                info!("Logout successful");
                self.view.show_auth_forms();
            }
            Err(e) => {
                error!("Logout error: {}", e);
                self.view.show_error(
                    ErrorScope::Transcript,
                    &format!("Uloskirjautuminen epäonnistui: {}", e),
                );
            }
        }
    }

    pub async fn handle_transcript_submit(&self, video_url: &str) {
        let _loading = Loading::start(&self.view, ElementId::TranscriptButton);

        self.view.hide(ElementId::TranscriptResult);
        self.view.hide(ElementId::TranscriptError);

        let request = TranscriptRequest::new(video_url, &self.view.value(ElementId::OutputBasename));

        match self.request_transcript(&request).await {
            Ok(message) => {
                self.view.show_success(ElementId::TranscriptResult, &message);
                // the basename is kept for the next request
                self.view.set_value(ElementId::YoutubeUrl, "");
            }
            Err(AppError::NoActiveSession) => {
                self.view.show_error(ErrorScope::Transcript, NOT_SIGNED_IN_MESSAGE);
            }
            Err(e) => {
                error!("Transcript error: {}", e);
                self.view.show_error(
                    ErrorScope::Transcript,
                    &format!("Virhe transkription luomisessa: {}", e),
                );
            }
        }
    }

    async fn request_transcript(&self, request: &TranscriptRequest) -> Result<String> {
        if self.identity.current_user().is_none() {
            return Err(AppError::NoActiveSession);
        }
        let token = self
            .identity
            .id_token()
            .await?
            .ok_or(AppError::NoActiveSession)?;
        debug!("Got ID token, calling transcript function");

        let result = self.transcripts.submit(&request.video_url, &token).await?;

        match result.sbv_content.as_deref() {
            Some(content) if !content.is_empty() => {
                let file_name = request.file_name();
                self.downloads.offer(&file_name, content).await?;
                Ok(format!(
                    "Transkriptio '{}' ladattu onnistuneesti tiedostoon {}!",
                    result.video_title.as_deref().unwrap_or(""),
                    file_name
                ))
            }
            _ => Ok(MISSING_CONTENT_MESSAGE.to_string()),
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn auth_message(error: &AppError) -> String {
    match error {
        AppError::Auth(e) => e.message(),
        other => firebase_error_message(&other.to_string()),
    }
}

/// The only subscriber of session changes: keeps the view in step with the session.
fn spawn_session_listener(mut listener: SessionListener, view: ViewController) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match listener.latest() {
                Some(user) => {
                    info!("User is signed in: {}", user.email.as_deref().unwrap_or(&user.uid));
                    view.apply_session(Some(&user));
                }
                None => {
                    info!("User is signed out");
                    view.apply_session(None);
                }
            }

            if !listener.changed().await {
                debug!("Session channel closed");
                break;
            }
        }
    })
}
