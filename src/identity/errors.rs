use thiserror::Error;

pub const INVALID_EMAIL: &str = "auth/invalid-email";
pub const USER_DISABLED: &str = "auth/user-disabled";
pub const USER_NOT_FOUND: &str = "auth/user-not-found";
pub const WRONG_PASSWORD: &str = "auth/wrong-password";
pub const EMAIL_ALREADY_IN_USE: &str = "auth/email-already-in-use";
pub const WEAK_PASSWORD: &str = "auth/weak-password";
pub const OPERATION_NOT_ALLOWED: &str = "auth/operation-not-allowed";
pub const TOO_MANY_REQUESTS: &str = "auth/too-many-requests";
pub const NETWORK_REQUEST_FAILED: &str = "auth/network-request-failed";
pub const INVALID_CREDENTIAL: &str = "auth/invalid-credential";
pub const INTERNAL_ERROR: &str = "auth/internal-error";

/// Localized banner text for the provider codes users actually run into
const AUTH_ERROR_MESSAGES: [(&str, &str); 9] = [
    (INVALID_EMAIL, "Virheellinen sähköpostiosoite"),
    (USER_DISABLED, "Tämä käyttäjätili on poistettu käytöstä"),
    (USER_NOT_FOUND, "Käyttäjää ei löydy"),
    (WRONG_PASSWORD, "Väärä salasana"),
    (EMAIL_ALREADY_IN_USE, "Sähköpostiosoite on jo käytössä"),
    (WEAK_PASSWORD, "Salasanan tulee olla vähintään 6 merkkiä pitkä"),
    (OPERATION_NOT_ALLOWED, "Operaatio ei ole sallittu"),
    (TOO_MANY_REQUESTS, "Liian monta yritystä. Yritä myöhemmin uudelleen"),
    (NETWORK_REQUEST_FAILED, "Verkkovirhe. Tarkista internet-yhteys"),
];

/// Map a provider error code to the message shown to the user.
pub fn firebase_error_message(code: &str) -> String {
    AUTH_ERROR_MESSAGES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, message)| message.to_string())
        .unwrap_or_else(|| format!("Virhe: {}", code))
}

/// A failed identity operation, identified by its web SDK style code (`auth/...`)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}")]
pub struct AuthError {
    code: String,
}

impl AuthError {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    pub fn network() -> Self {
        Self::new(NETWORK_REQUEST_FAILED)
    }

    /// Translate an Identity Toolkit / Secure Token REST error message.
    ///
    /// Messages may carry detail after ` : `, e.g.
    /// `WEAK_PASSWORD : Password should be at least 6 characters`.
    pub fn from_rest_message(message: &str) -> Self {
        let key = message.split(" : ").next().unwrap_or(message).trim();
        let code = match key {
            "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => USER_NOT_FOUND,
            "INVALID_PASSWORD" => WRONG_PASSWORD,
            "USER_DISABLED" => USER_DISABLED,
            "INVALID_EMAIL" => INVALID_EMAIL,
            "EMAIL_EXISTS" => EMAIL_ALREADY_IN_USE,
            "WEAK_PASSWORD" => WEAK_PASSWORD,
            "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => OPERATION_NOT_ALLOWED,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => TOO_MANY_REQUESTS,
            "INVALID_LOGIN_CREDENTIALS" => INVALID_CREDENTIAL,
            "" => INTERNAL_ERROR,
            other => return Self::new(format!("auth/{}", other.to_lowercase().replace('_', "-"))),
        };
        Self::new(code)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_network(&self) -> bool {
        self.code == NETWORK_REQUEST_FAILED
    }

    pub fn message(&self) -> String {
        firebase_error_message(&self.code)
    }
}
