use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::models::Session;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an account already exists for {0}")]
    EmailAlreadyInUse(String),
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("password must be at least {0} characters")]
    WeakPassword(usize),
    #[error("authentication service unavailable: {0}")]
    Unavailable(String),
}

/// Always holds the current session, or `None` when signed out.
pub type SessionFeed = watch::Receiver<Option<Session>>;

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
    fn watch_session(&self) -> SessionFeed;
}
