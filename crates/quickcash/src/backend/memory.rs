use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    ApplicationId, ApplicationStore, ApplicationSummary, AuthProvider, BackendError,
    LoanApplicationStatus, VerificationStatus,
};
use crate::session::{SessionCallback, SessionInfo, SessionSubscription, UserId};
use crate::workflows::intake::LoanApplicationDetails;

type Listeners = Mutex<BTreeMap<u64, SessionCallback>>;

/// Process-local stand-in for the hosted platform, with switches for injecting failures.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    session: Mutex<Option<SessionInfo>>,
    listeners: Arc<Listeners>,
    next_listener: AtomicU64,
    applications: Mutex<Vec<ApplicationSummary>>,
    verification: Mutex<HashMap<UserId, VerificationStatus>>,
    next_application: AtomicU64,
    create_calls: AtomicUsize,
    write_latency: Mutex<Duration>,
    faults: Mutex<Faults>,
}

#[derive(Default)]
struct Faults {
    session: Option<BackendError>,
    reads: Option<BackendError>,
    next_create: Option<BackendError>,
    verification_writes: Option<BackendError>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay applied to every `create_application` call.
    pub fn with_write_latency(self, latency: Duration) -> Self {
        *lock(&self.inner.write_latency) = latency;
        self
    }

    pub fn sign_in(&self, session: SessionInfo) {
        *lock(&self.inner.session) = Some(session.clone());
        self.notify(Some(session));
    }

    pub fn sign_out(&self) {
        *lock(&self.inner.session) = None;
        self.notify(None);
    }

    pub fn session_listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }

    pub fn fail_session_reads(&self, error: Option<BackendError>) {
        lock(&self.inner.faults).session = error;
    }

    pub fn fail_reads(&self, error: Option<BackendError>) {
        lock(&self.inner.faults).reads = error;
    }

    /// Fail the next `create_application` call only.
    pub fn fail_next_create(&self, error: BackendError) {
        lock(&self.inner.faults).next_create = Some(error);
    }

    pub fn fail_verification_writes(&self, error: Option<BackendError>) {
        lock(&self.inner.faults).verification_writes = error;
    }

    /// Number of `create_application` calls received, failed ones included.
    pub fn create_calls(&self) -> usize {
        self.inner.create_calls.load(Ordering::SeqCst)
    }

    pub fn applications(&self) -> Vec<ApplicationSummary> {
        lock(&self.inner.applications).clone()
    }

    pub fn verification_status(&self, user_id: &UserId) -> Option<VerificationStatus> {
        lock(&self.inner.verification).get(user_id).copied()
    }

    /// Insert an application directly, bypassing fault injection.
    pub fn seed_application(
        &self,
        user_id: &UserId,
        details: LoanApplicationDetails,
        status: LoanApplicationStatus,
        created_at: DateTime<Utc>,
    ) -> ApplicationId {
        let id = self.next_application_id();
        lock(&self.inner.applications).push(ApplicationSummary {
            id: id.clone(),
            user_id: user_id.clone(),
            details,
            status,
            created_at,
        });
        id
    }

    /// Move a stored application to a new review status; false when the id is unknown.
    pub fn set_application_status(
        &self,
        id: &ApplicationId,
        status: LoanApplicationStatus,
    ) -> bool {
        let mut applications = lock(&self.inner.applications);
        match applications.iter_mut().find(|summary| &summary.id == id) {
            Some(summary) => {
                summary.status = status;
                true
            }
            None => false,
        }
    }

    pub fn set_verification_status(&self, user_id: &UserId, status: VerificationStatus) {
        lock(&self.inner.verification).insert(user_id.clone(), status);
    }

    fn next_application_id(&self) -> ApplicationId {
        let id = self.inner.next_application.fetch_add(1, Ordering::Relaxed) + 1;
        ApplicationId(format!("loan-{id:06}"))
    }

    fn notify(&self, session: Option<SessionInfo>) {
        let callbacks: Vec<SessionCallback> =
            lock(&self.inner.listeners).values().cloned().collect();
        for callback in callbacks {
            callback(session.clone());
        }
    }

    fn read_fault(&self) -> Result<(), BackendError> {
        match &lock(&self.inner.faults).reads {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AuthProvider for InMemoryBackend {
    async fn get_session(&self) -> Result<Option<SessionInfo>, BackendError> {
        if let Some(error) = &lock(&self.inner.faults).session {
            return Err(error.clone());
        }
        Ok(lock(&self.inner.session).clone())
    }

    fn on_session_change(&self, callback: SessionCallback) -> SessionSubscription {
        let key = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.listeners).insert(key, callback);

        let listeners: Weak<Listeners> = Arc::downgrade(&self.inner.listeners);
        SessionSubscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                lock(&listeners).remove(&key);
            }
        })
    }
}

#[async_trait]
impl ApplicationStore for InMemoryBackend {
    async fn find_applications(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ApplicationSummary>, BackendError> {
        self.read_fault()?;
        let mut found: Vec<ApplicationSummary> = lock(&self.inner.applications)
            .iter()
            .rev()
            .filter(|summary| &summary.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn create_application(
        &self,
        user_id: &UserId,
        details: &LoanApplicationDetails,
    ) -> Result<ApplicationId, BackendError> {
        self.inner.create_calls.fetch_add(1, Ordering::SeqCst);

        let latency = *lock(&self.inner.write_latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if let Some(error) = lock(&self.inner.faults).next_create.take() {
            return Err(error);
        }

        if lock(&self.inner.session).is_none() {
            return Err(BackendError::Unauthenticated);
        }

        Ok(self.seed_application(
            user_id,
            details.clone(),
            LoanApplicationStatus::Pending,
            Utc::now(),
        ))
    }

    async fn upsert_verification_status(
        &self,
        user_id: &UserId,
        status: VerificationStatus,
    ) -> Result<(), BackendError> {
        if let Some(error) = &lock(&self.inner.faults).verification_writes {
            return Err(error.clone());
        }
        self.set_verification_status(user_id, status);
        Ok(())
    }

    async fn fetch_verification_status(
        &self,
        user_id: &UserId,
    ) -> Result<Option<VerificationStatus>, BackendError> {
        self.read_fault()?;
        Ok(self.verification_status(user_id))
    }
}
