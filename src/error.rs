use thiserror::Error;

use crate::identity::AuthError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration unavailable: {0}")]
    ConfigUnavailable(String),

    #[error("{0}")]
    Init(String),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    SignOut(String),

    #[error("{0}")]
    RemoteCall(String),

    #[error("No active session")]
    NoActiveSession,

    #[error("Required page element '{0}' is missing")]
    MissingElement(&'static str),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
