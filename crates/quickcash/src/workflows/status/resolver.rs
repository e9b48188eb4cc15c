use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::view::StatusView;
use crate::backend::{ApplicationStore, ApplicationSummary, AuthProvider, BackendError};
use crate::session::{SessionContext, SessionInfo};
use crate::workflows::FunnelRoute;

/// Outcome of the startup lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum Resolution {
    Unauthenticated,
    NoApplication,
    HasApplication { summary: ApplicationSummary },
}

impl Resolution {
    pub fn initial_route(&self) -> FunnelRoute {
        match self {
            Self::Unauthenticated => FunnelRoute::Login,
            Self::NoApplication => FunnelRoute::Application,
            Self::HasApplication { .. } => FunnelRoute::Status,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::NoApplication => "no_application",
            Self::HasApplication { .. } => "has_application",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl From<BackendError> for ResolveError {
    fn from(value: BackendError) -> Self {
        Self::BackendUnavailable(value.to_string())
    }
}

/// Why the status page has nothing to show.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("sign in to view your application status")]
    Unauthenticated,
    #[error("no loan application found")]
    NoApplication,
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// One-shot lookup of session validity and prior applications.
///
/// Each call queries the backend afresh; there is no polling or caching. The result
/// also refreshes the shared [`SessionContext`].
pub struct SessionStatusResolver<A, S> {
    auth: Arc<A>,
    store: Arc<S>,
    session: SessionContext,
}

impl<A, S> SessionStatusResolver<A, S>
where
    A: AuthProvider + 'static,
    S: ApplicationStore + 'static,
{
    pub fn new(auth: Arc<A>, store: Arc<S>, session: SessionContext) -> Self {
        Self {
            auth,
            store,
            session,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn resolve(&self) -> Result<Resolution, ResolveError> {
        let Some(session) = self.active_session().await? else {
            info!(resolution = "unauthenticated", "session resolved");
            return Ok(Resolution::Unauthenticated);
        };

        let newest = match self.store.find_applications(&session.user_id).await {
            Ok(applications) => applications.into_iter().next(),
            Err(BackendError::Unauthenticated) => {
                self.session.replace(None);
                info!(resolution = "unauthenticated", "session rejected by store");
                return Ok(Resolution::Unauthenticated);
            }
            Err(error) => return Err(error.into()),
        };

        let resolution = match newest {
            Some(summary) => Resolution::HasApplication { summary },
            None => Resolution::NoApplication,
        };
        info!(
            user_id = %session.user_id,
            resolution = resolution.label(),
            "session resolved"
        );
        Ok(resolution)
    }

    /// Route for the auth callback. Lookup failures fall back to the login page.
    pub async fn initial_route(&self) -> FunnelRoute {
        match self.resolve().await {
            Ok(resolution) => resolution.initial_route(),
            Err(error) => {
                warn!(%error, "could not resolve session, sending to login");
                FunnelRoute::Login
            }
        }
    }

    pub async fn status_view(&self) -> Result<StatusView, StatusError> {
        let summary = match self.resolve().await? {
            Resolution::Unauthenticated => return Err(StatusError::Unauthenticated),
            Resolution::NoApplication => return Err(StatusError::NoApplication),
            Resolution::HasApplication { summary } => summary,
        };

        let verification = self
            .store
            .fetch_verification_status(&summary.user_id)
            .await
            .map_err(ResolveError::from)?;
        Ok(StatusView::new(summary, verification))
    }

    async fn active_session(&self) -> Result<Option<SessionInfo>, ResolveError> {
        let session = match self.auth.get_session().await {
            Ok(session) => session,
            Err(BackendError::Unauthenticated) => None,
            Err(error) => return Err(error.into()),
        };
        self.session.replace(session);
        Ok(self.session.active(Utc::now()))
    }
}
