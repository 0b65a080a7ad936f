use std::collections::HashMap;

use crate::error::{AppError, Result};

/// Fixed identifiers of the page elements the controller binds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    LoginView,
    SignupView,
    Dashboard,
    ShowSignup,
    ShowLogin,
    LoginForm,
    SignupForm,
    TranscriptForm,
    LogoutButton,
    UserEmail,
    ToggleLoginPassword,
    ToggleSignupPassword,
    LoginEmail,
    LoginPassword,
    SignupEmail,
    SignupPassword,
    YoutubeUrl,
    OutputBasename,
    LoginButton,
    SignupButton,
    TranscriptButton,
    LoginError,
    SignupError,
    TranscriptError,
    TranscriptResult,
}

impl ElementId {
    pub const ALL: [ElementId; 25] = [
        ElementId::LoginView,
        ElementId::SignupView,
        ElementId::Dashboard,
        ElementId::ShowSignup,
        ElementId::ShowLogin,
        ElementId::LoginForm,
        ElementId::SignupForm,
        ElementId::TranscriptForm,
        ElementId::LogoutButton,
        ElementId::UserEmail,
        ElementId::ToggleLoginPassword,
        ElementId::ToggleSignupPassword,
        ElementId::LoginEmail,
        ElementId::LoginPassword,
        ElementId::SignupEmail,
        ElementId::SignupPassword,
        ElementId::YoutubeUrl,
        ElementId::OutputBasename,
        ElementId::LoginButton,
        ElementId::SignupButton,
        ElementId::TranscriptButton,
        ElementId::LoginError,
        ElementId::SignupError,
        ElementId::TranscriptError,
        ElementId::TranscriptResult,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ElementId::LoginView => "loginForm",
            ElementId::SignupView => "signupForm",
            ElementId::Dashboard => "dashboard",
            ElementId::ShowSignup => "showSignup",
            ElementId::ShowLogin => "showLogin",
            ElementId::LoginForm => "login-form",
            ElementId::SignupForm => "signup-form",
            ElementId::TranscriptForm => "transcript-form",
            ElementId::LogoutButton => "logout-btn",
            ElementId::UserEmail => "user-email",
            ElementId::ToggleLoginPassword => "toggle-login-password",
            ElementId::ToggleSignupPassword => "toggle-signup-password",
            ElementId::LoginEmail => "login-email",
            ElementId::LoginPassword => "login-password",
            ElementId::SignupEmail => "signup-email",
            ElementId::SignupPassword => "signup-password",
            ElementId::YoutubeUrl => "youtube-url",
            ElementId::OutputBasename => "output-basename",
            ElementId::LoginButton => "login-btn",
            ElementId::SignupButton => "signup-btn",
            ElementId::TranscriptButton => "transcript-btn",
            ElementId::LoginError => "login-error",
            ElementId::SignupError => "signup-error",
            ElementId::TranscriptError => "transcript-error",
            ElementId::TranscriptResult => "transcript-result",
        }
    }

    /// The output basename field is optional; everything else must exist.
    pub const fn is_required(self) -> bool {
        !matches!(self, ElementId::OutputBasename)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Text,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub visible: bool,
    pub text: String,
    pub value: String,
    /// Also marks a button as busy while its request runs
    pub disabled: bool,
    pub input_type: InputType,
    pub aria_label: Option<String>,
}

impl Element {
    pub fn new() -> Self {
        Self {
            visible: true,
            text: String::new(),
            value: String::new(),
            disabled: false,
            input_type: InputType::Text,
            aria_label: None,
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::new()
        }
    }

    pub fn password() -> Self {
        Self {
            input_type: InputType::Password,
            ..Self::new()
        }
    }

    pub fn labelled(label: &str) -> Self {
        Self {
            aria_label: Some(label.to_string()),
            ..Self::new()
        }
    }
}

impl Default for Element {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory page: every element the controller reads or writes, by identifier
#[derive(Debug, Clone, Default)]
pub struct Page {
    elements: HashMap<ElementId, Element>,
}

impl Page {
    /// The complete page with views and banners hidden.
    pub fn standard() -> Self {
        Self::from_elements(ElementId::ALL.into_iter().map(|id| {
            let element = match id {
                ElementId::LoginView
                | ElementId::SignupView
                | ElementId::Dashboard
                | ElementId::LoginError
                | ElementId::SignupError
                | ElementId::TranscriptError
                | ElementId::TranscriptResult => Element::hidden(),
                ElementId::LoginPassword | ElementId::SignupPassword => Element::password(),
                ElementId::ToggleLoginPassword | ElementId::ToggleSignupPassword => {
                    Element::labelled("Näytä salasana")
                }
                _ => Element::new(),
            };
            (id, element)
        }))
    }

    pub fn from_elements<I: IntoIterator<Item = (ElementId, Element)>>(elements: I) -> Self {
        Self {
            elements: elements.into_iter().collect(),
        }
    }

    pub fn without(mut self, id: ElementId) -> Self {
        self.elements.remove(&id);
        self
    }

    /// Fail on the first required element that is missing.
    pub fn validate(&self) -> Result<()> {
        match ElementId::ALL
            .into_iter()
            .find(|id| id.is_required() && !self.elements.contains_key(id))
        {
            Some(missing) => Err(AppError::MissingElement(missing.as_str())),
            None => Ok(()),
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Apply `f` to the element if it exists.
    pub fn update<F: FnOnce(&mut Element)>(&mut self, id: ElementId, f: F) {
        if let Some(element) = self.elements.get_mut(&id) {
            f(element);
        }
    }

    pub fn is_visible(&self, id: ElementId) -> bool {
        self.get(id).is_some_and(|e| e.visible)
    }

    pub fn value(&self, id: ElementId) -> &str {
        self.get(id).map(|e| e.value.as_str()).unwrap_or("")
    }

    pub fn text(&self, id: ElementId) -> &str {
        self.get(id).map(|e| e.text.as_str()).unwrap_or("")
    }
}
