//! Explicit session context threaded into the wizard, the submission gate, and the
//! resolver instead of an ambient "current user".

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::backend::{AuthProvider, BackendError};

/// Identifier assigned to the user by the hosted auth platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user_id: UserId,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl SessionInfo {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Callback invoked on login and logout.
pub type SessionCallback = Arc<dyn Fn(Option<SessionInfo>) + Send + Sync>;

/// Registration handle returned by [`AuthProvider::on_session_change`]; dropping it unregisters.
pub struct SessionSubscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl SessionSubscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for SessionSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSubscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// Shared, observable view of the current session.
///
/// Clones share the same underlying value, so an update pushed by the auth
/// listener is seen by every component holding a clone.
#[derive(Clone)]
pub struct SessionContext {
    current: Arc<watch::Sender<Option<SessionInfo>>>,
}

impl SessionContext {
    pub fn new(initial: Option<SessionInfo>) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            current: Arc::new(sender),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn authenticated(session: SessionInfo) -> Self {
        Self::new(Some(session))
    }

    /// Load the session from the auth platform and keep this context in sync with it.
    pub async fn attach<A>(auth: &A) -> Result<SessionBinding, BackendError>
    where
        A: AuthProvider + ?Sized,
    {
        let initial = auth.get_session().await?;
        let context = Self::new(initial);
        let listener = context.clone();
        let subscription = auth.on_session_change(Arc::new(move |session| {
            debug!(signed_in = session.is_some(), "session changed");
            listener.replace(session);
        }));

        Ok(SessionBinding {
            context,
            _subscription: subscription,
        })
    }

    /// The stored session, expired or not.
    pub fn current(&self) -> Option<SessionInfo> {
        self.current.borrow().clone()
    }

    /// The stored session if it has not expired yet.
    pub fn active(&self, now: DateTime<Utc>) -> Option<SessionInfo> {
        self.current().filter(|session| !session.is_expired(now))
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.current.borrow().as_ref().map(|session| session.user_id.clone())
    }

    pub fn replace(&self, session: Option<SessionInfo>) {
        self.current.send_replace(session);
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("user_id", &self.user_id())
            .finish()
    }
}

/// A [`SessionContext`] kept alive together with its auth listener.
///
/// Owned by the application root; dropping it unregisters the listener.
#[derive(Debug)]
pub struct SessionBinding {
    context: SessionContext,
    _subscription: SessionSubscription,
}

impl SessionBinding {
    pub fn context(&self) -> &SessionContext {
        &self.context
    }
}
