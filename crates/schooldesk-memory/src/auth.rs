use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use time::OffsetDateTime;
use tokio::sync::watch;
use uuid::Uuid;

use schooldesk_core::{AuthError, AuthProvider, Session, SessionFeed};

pub const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    uid: Arc<str>,
    email: Arc<str>,
    password_digest: [u8; 32],
}

fn digest(uid: &str, password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(uid.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

/// Email/password accounts held in memory, with a single signed-in session.
pub struct InMemoryAuthProvider {
    accounts: RwLock<HashMap<String, Account>>,
    session: watch::Sender<Option<Session>>,
    offline: AtomicBool,
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: RwLock::new(HashMap::new()),
            session,
            offline: AtomicBool::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    fn ensure_online(&self) -> Result<(), AuthError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AuthError::Unavailable("auth service is offline".to_string()));
        }
        Ok(())
    }

    fn start_session(&self, account: &Account) -> Session {
        let session = Session {
            uid: account.uid.to_string(),
            email: account.email.to_string(),
            signed_in_at: OffsetDateTime::now_utc(),
        };
        self.session.send_replace(Some(session.clone()));
        tracing::debug!(uid = %session.uid, "Session started");
        session
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AuthError::InvalidEmail(email)),
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.ensure_online()?;
        let key = normalize_email(email)?;

        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        let account = accounts.get(&key).ok_or(AuthError::InvalidCredentials)?;
        let presented = digest(&account.uid, password);
        if !bool::from(presented.as_slice().ct_eq(account.password_digest.as_slice())) {
            tracing::warn!(email = %key, "Rejected sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(self.start_session(account))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.ensure_online()?;
        let key = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(MIN_PASSWORD_LEN));
        }

        let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        if accounts.contains_key(&key) {
            return Err(AuthError::EmailAlreadyInUse(key));
        }

        let uid: Arc<str> = Arc::from(Uuid::new_v4().simple().to_string());
        let account = Account {
            password_digest: digest(&uid, password),
            email: Arc::from(key.as_str()),
            uid,
        };
        let session = self.start_session(&account);
        accounts.insert(key, account);
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.ensure_online()?;
        self.session.send_replace(None);
        tracing::debug!("Session ended");
        Ok(())
    }

    fn watch_session(&self) -> SessionFeed {
        self.session.subscribe()
    }
}
