use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};

use schooldesk_core::{AuthProvider, Session, SessionFeed};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<Session>,
    /// True until the auth provider has reported the session at least once.
    pub loading: bool,
}

/// Tracks the signed-in user through the auth provider's session feed and
/// forwards sign-in, sign-up and sign-out to it.
pub struct SessionManager {
    auth: Arc<dyn AuthProvider>,
    state: watch::Receiver<SessionState>,
    task: Option<JoinHandle<()>>,
}

impl SessionManager {
    /// Subscribes to session changes. Must be called inside a tokio runtime.
    pub fn start(auth: Arc<dyn AuthProvider>) -> Self {
        let (tx, rx) = watch::channel(SessionState {
            user: None,
            loading: true,
        });
        let task = tokio::spawn(track_session(auth.watch_session(), tx));
        Self {
            auth,
            state: rx,
            task: Some(task),
        }
    }

    pub fn current_user(&self) -> Option<Session> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Waits for the first session report.
    pub async fn ready(&self) -> SessionState {
        let mut rx = self.state.clone();
        let result = rx.wait_for(|state| !state.loading).await;
        match result {
            Ok(state) => (*state).clone(),
            Err(_) => self.state.borrow().clone(),
        }
    }

    /// Waits until the tracked user matches `signed_in`.
    pub async fn wait_signed_in(&self, signed_in: bool) -> Option<Session> {
        let mut rx = self.state.clone();
        let result = rx
            .wait_for(|state| !state.loading && state.user.is_some() == signed_in)
            .await;
        match result {
            Ok(state) => state.user.clone(),
            Err(_) => self.current_user(),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        self.auth.sign_in(email, password).await.map_err(|e| {
            tracing::warn!(error = %e, "Sign-in failed");
            AppError::from(e)
        })
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Session, AppError> {
        self.auth.sign_up(email, password).await.map_err(|e| {
            tracing::warn!(error = %e, "Sign-up failed");
            AppError::from(e)
        })
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.auth.sign_out().await.map_err(|e| {
            tracing::warn!(error = %e, "Sign-out failed");
            AppError::from(e)
        })
    }

    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Session subscription released");
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.close();
    }
}

async fn track_session(mut feed: SessionFeed, state: watch::Sender<SessionState>) {
    loop {
        let user = feed.borrow_and_update().clone();
        tracing::info!(uid = ?user.as_ref().map(|s| s.uid.clone()), "Session changed");
        state.send_replace(SessionState {
            user,
            loading: false,
        });
        if feed.changed().await.is_err() {
            break;
        }
    }
}
