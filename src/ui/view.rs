use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use super::page::{ElementId, InputType, Page};
use crate::error::Result;
use crate::identity::User;

/// How long a banner stays up
pub const BANNER_TIMEOUT: Duration = Duration::from_secs(5);

const SHOW_PASSWORD_LABEL: &str = "Näytä salasana";
const HIDE_PASSWORD_LABEL: &str = "Piilota salasana";

/// Which of the three mutually exclusive views is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Logged out, login form
    Login,
    /// Logged out, signup form
    Signup,
    LoggedIn,
}

/// Forms whose errors get their own banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    Login,
    Signup,
    Transcript,
}

impl ErrorScope {
    /// The `{scope}-error` banner
    pub fn banner(self) -> ElementId {
        match self {
            ErrorScope::Login => ElementId::LoginError,
            ErrorScope::Signup => ElementId::SignupError,
            ErrorScope::Transcript => ElementId::TranscriptError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthForm {
    Login,
    Signup,
}

impl AuthForm {
    pub fn email_input(self) -> ElementId {
        match self {
            AuthForm::Login => ElementId::LoginEmail,
            AuthForm::Signup => ElementId::SignupEmail,
        }
    }

    pub fn password_input(self) -> ElementId {
        match self {
            AuthForm::Login => ElementId::LoginPassword,
            AuthForm::Signup => ElementId::SignupPassword,
        }
    }

    pub fn password_toggle(self) -> ElementId {
        match self {
            AuthForm::Login => ElementId::ToggleLoginPassword,
            AuthForm::Signup => ElementId::ToggleSignupPassword,
        }
    }

    pub fn submit_button(self) -> ElementId {
        match self {
            AuthForm::Login => ElementId::LoginButton,
            AuthForm::Signup => ElementId::SignupButton,
        }
    }

    pub fn error_scope(self) -> ErrorScope {
        match self {
            AuthForm::Login => ErrorScope::Login,
            AuthForm::Signup => ErrorScope::Signup,
        }
    }
}

/// Owns the page and decides what is visible on it.
///
/// Cloning gives another handle to the same page.
#[derive(Clone)]
pub struct ViewController {
    page: Arc<Mutex<Page>>,
    state: Arc<watch::Sender<ViewState>>,
}

impl ViewController {
    /// Validate the page and show the login view.
    pub fn bind(page: Page) -> Result<Self> {
        page.validate()?;

        let (state, _rx) = watch::channel(ViewState::Login);
        let view = Self {
            page: Arc::new(Mutex::new(page)),
            state: Arc::new(state),
        };
        view.apply(ViewState::Login);
        Ok(view)
    }

    fn page(&self) -> MutexGuard<'_, Page> {
        self.page.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the page as it is now
    pub fn snapshot(&self) -> Page {
        self.page().clone()
    }

    pub fn state(&self) -> ViewState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    fn apply(&self, state: ViewState) {
        {
            let mut page = self.page();
            page.update(ElementId::LoginView, |e| e.visible = state == ViewState::Login);
            page.update(ElementId::SignupView, |e| e.visible = state == ViewState::Signup);
            page.update(ElementId::Dashboard, |e| e.visible = state == ViewState::LoggedIn);
        }
        self.state.send_replace(state);
    }

    pub fn show_login_form(&self) {
        if self.state() == ViewState::LoggedIn {
            debug!("Ignoring login form request while signed in");
            return;
        }
        self.apply(ViewState::Login);
    }

    pub fn show_signup_form(&self) {
        if self.state() == ViewState::LoggedIn {
            debug!("Ignoring signup form request while signed in");
            return;
        }
        self.apply(ViewState::Signup);
    }

    pub fn show_dashboard(&self, user: &User) {
        let shown = user.email.clone().unwrap_or_else(|| user.uid.clone());
        self.page().update(ElementId::UserEmail, |e| e.text = shown);
        self.apply(ViewState::LoggedIn);
    }

    pub fn show_auth_forms(&self) {
        self.page().update(ElementId::UserEmail, |e| e.text.clear());
        self.apply(ViewState::Login);
    }

    /// Follow a session notification, whatever is shown now.
    pub fn apply_session(&self, user: Option<&User>) {
        match user {
            Some(user) => self.show_dashboard(user),
            None => self.show_auth_forms(),
        }
    }

    pub fn show_error(&self, scope: ErrorScope, message: &str) {
        self.show_banner(scope.banner(), message);
    }

    pub fn show_success(&self, id: ElementId, message: &str) {
        self.show_banner(id, message);
    }

    /// Show a banner and schedule its hide. The hide is never cancelled: showing
    /// the same banner again starts a second, independent timer.
    fn show_banner(&self, id: ElementId, message: &str) {
        self.page().update(id, |e| {
            e.text = message.to_string();
            e.visible = true;
        });

        let page = Arc::clone(&self.page);
        tokio::spawn(async move {
            tokio::time::sleep(BANNER_TIMEOUT).await;
            page.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .update(id, |e| e.visible = false);
        });
    }

    pub fn hide(&self, id: ElementId) {
        self.page().update(id, |e| e.visible = false);
    }

    pub fn set_button_loading(&self, id: ElementId, loading: bool) {
        self.page().update(id, |e| e.disabled = loading);
    }

    pub fn is_disabled(&self, id: ElementId) -> bool {
        self.page().get(id).is_some_and(|e| e.disabled)
    }

    pub fn toggle_password_visibility(&self, form: AuthForm) {
        let mut page = self.page();
        let reveal = page
            .get(form.password_input())
            .is_some_and(|e| e.input_type == InputType::Password);

        page.update(form.password_input(), |e| {
            e.input_type = if reveal { InputType::Text } else { InputType::Password };
        });
        page.update(form.password_toggle(), |e| {
            let label = if reveal { HIDE_PASSWORD_LABEL } else { SHOW_PASSWORD_LABEL };
            e.aria_label = Some(label.to_string());
        });
    }

    pub fn is_visible(&self, id: ElementId) -> bool {
        self.page().is_visible(id)
    }

    pub fn value(&self, id: ElementId) -> String {
        self.page().value(id).to_string()
    }

    pub fn set_value(&self, id: ElementId, value: &str) {
        self.page().update(id, |e| e.value = value.to_string());
    }

    pub fn text(&self, id: ElementId) -> String {
        self.page().text(id).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn view() -> ViewController {
        ViewController::bind(Page::standard()).unwrap()
    }

    fn user() -> User {
        User {
            uid: "uid-1".to_string(),
            email: Some("a@example.com".to_string()),
        }
    }

    fn assert_only_visible(view: &ViewController, shown: ElementId) {
        for id in [ElementId::LoginView, ElementId::SignupView, ElementId::Dashboard] {
            assert_eq!(view.is_visible(id), id == shown, "{}", id.as_str());
        }
    }

    #[test]
    fn test_bind_rejects_incomplete_page() {
        let result = ViewController::bind(Page::standard().without(ElementId::LogoutButton));
        assert!(matches!(result, Err(AppError::MissingElement("logout-btn"))));
    }

    #[test]
    fn test_initial_state_is_login() {
        let view = view();
        assert_eq!(view.state(), ViewState::Login);
        assert_only_visible(&view, ElementId::LoginView);
    }

    #[test]
    fn test_toggle_between_logged_out_forms() {
        let view = view();
        view.show_signup_form();
        assert_eq!(view.state(), ViewState::Signup);
        assert_only_visible(&view, ElementId::SignupView);

        view.show_login_form();
        assert_eq!(view.state(), ViewState::Login);
        assert_only_visible(&view, ElementId::LoginView);
    }

    #[test]
    fn test_session_forces_view_from_any_state() {
        let view = view();

        view.show_signup_form();
        view.apply_session(Some(&user()));
        assert_eq!(view.state(), ViewState::LoggedIn);
        assert_only_visible(&view, ElementId::Dashboard);
        assert_eq!(view.text(ElementId::UserEmail), "a@example.com");

        // redundant notification changes nothing
        view.apply_session(Some(&user()));
        assert_only_visible(&view, ElementId::Dashboard);

        view.apply_session(None);
        assert_eq!(view.state(), ViewState::Login);
        assert_only_visible(&view, ElementId::LoginView);
        assert_eq!(view.text(ElementId::UserEmail), "");

        view.show_signup_form();
        view.apply_session(None);
        assert_only_visible(&view, ElementId::LoginView);
    }

    #[test]
    fn test_form_toggles_ignored_while_signed_in() {
        let view = view();
        view.show_dashboard(&user());
        view.show_signup_form();
        assert_eq!(view.state(), ViewState::LoggedIn);
        assert_only_visible(&view, ElementId::Dashboard);
    }

    #[test]
    fn test_password_visibility_toggle() {
        let view = view();
        view.toggle_password_visibility(AuthForm::Login);

        let page = view.snapshot();
        assert_eq!(
            page.get(ElementId::LoginPassword).map(|e| e.input_type),
            Some(InputType::Text)
        );
        assert_eq!(
            page.get(ElementId::ToggleLoginPassword).and_then(|e| e.aria_label.clone()),
            Some("Piilota salasana".to_string())
        );
        assert_eq!(
            page.get(ElementId::SignupPassword).map(|e| e.input_type),
            Some(InputType::Password)
        );

        view.toggle_password_visibility(AuthForm::Login);
        let page = view.snapshot();
        assert_eq!(
            page.get(ElementId::LoginPassword).map(|e| e.input_type),
            Some(InputType::Password)
        );
        assert_eq!(
            page.get(ElementId::ToggleLoginPassword).and_then(|e| e.aria_label.clone()),
            Some("Näytä salasana".to_string())
        );
    }

    #[test]
    fn test_button_loading() {
        let view = view();
        view.set_button_loading(ElementId::TranscriptButton, true);
        assert!(view.is_disabled(ElementId::TranscriptButton));
        view.set_button_loading(ElementId::TranscriptButton, false);
        assert!(!view.is_disabled(ElementId::TranscriptButton));
    }

    #[tokio::test(start_paused = true)]
    async fn test_banner_hides_after_five_seconds() {
        let view = view();
        view.show_error(ErrorScope::Login, "Väärä salasana");
        assert!(view.is_visible(ElementId::LoginError));
        assert_eq!(view.text(ElementId::LoginError), "Väärä salasana");

        // state changes in between do not affect the timer
        view.show_signup_form();
        tokio::time::sleep(Duration::from_millis(4_999)).await;
        assert!(view.is_visible(ElementId::LoginError));

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!view.is_visible(ElementId::LoginError));
    }

    #[tokio::test(start_paused = true)]
    async fn test_redisplayed_banner_is_hidden_by_first_timer() {
        let view = view();
        view.show_success(ElementId::TranscriptResult, "first");

        tokio::time::sleep(Duration::from_secs(3)).await;
        view.show_success(ElementId::TranscriptResult, "second");
        assert_eq!(view.text(ElementId::TranscriptResult), "second");

        tokio::time::sleep(Duration::from_millis(2_001)).await;
        assert!(!view.is_visible(ElementId::TranscriptResult));

        view.show_success(ElementId::TranscriptResult, "third");
        tokio::time::sleep(Duration::from_millis(3_000)).await;
        // the second timer fires here, eight seconds after start
        assert!(!view.is_visible(ElementId::TranscriptResult));
    }

    #[tokio::test(start_paused = true)]
    async fn test_banners_are_independent() {
        let view = view();
        view.show_error(ErrorScope::Transcript, "oops");
        tokio::time::sleep(Duration::from_secs(2)).await;
        view.show_success(ElementId::TranscriptResult, "ok");

        tokio::time::sleep(Duration::from_millis(3_001)).await;
        assert!(!view.is_visible(ElementId::TranscriptError));
        assert!(view.is_visible(ElementId::TranscriptResult));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!view.is_visible(ElementId::TranscriptResult));
    }
}
