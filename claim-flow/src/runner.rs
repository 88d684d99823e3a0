//! SessionRunner – convenience wrapper around the _load → mutate → save_
//! cycle every request against a claim session goes through.
//!
//! A mutation only reaches storage when it returns `Ok`, so a rejected step
//! submission never leaves a half-updated session behind. Each cycle holds
//! the session's lock, so concurrent requests against one session run one
//! after the other.
//!
//! ```rust,ignore
//! let runner = SessionRunner::new(Arc::new(InMemorySessionStorage::new()));
//! let session = runner.create().await?;
//! let next = runner
//!     .run(&session.id, |wizard| wizard.submit_step(step, record))
//!     .await?;
//! ```

use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info};

use crate::{
    controller::ClaimWizard,
    error::{Result, WizardError},
    storage::{Session, SessionLocks, SessionStorage},
    submission::{ClaimAttachment, ClaimSubmissionResponse, ClaimSubmitter},
};

#[derive(Clone)]
pub struct SessionRunner {
    storage: Arc<dyn SessionStorage>,
    locks: SessionLocks,
}

impl SessionRunner {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            locks: SessionLocks::new(),
        }
    }

    pub async fn create(&self) -> Result<Session> {
        let session = Session::new();
        self.storage.save(session.clone()).await?;
        info!(session_id = %session.id, "claim session created");
        Ok(session)
    }

    pub async fn load(&self, session_id: &str) -> Result<Session> {
        self.storage
            .get(session_id)
            .await?
            .ok_or_else(|| WizardError::SessionNotFound(session_id.to_string()))
    }

    /// Takes the session's lock and loads it; the guard must outlive the save
    async fn load_locked(&self, session_id: &str) -> Result<(OwnedMutexGuard<()>, Session)> {
        let guard = self.locks.acquire(session_id).await;
        match self.load(session_id).await {
            Ok(session) => Ok((guard, session)),
            Err(e) => {
                drop(guard);
                self.locks.forget(session_id);
                Err(e)
            }
        }
    }

    /// Applies `f` to the session's wizard and persists the result.
    ///
    /// A submitted claim is frozen: every change is rejected with
    /// `AlreadySubmitted` until the session is reset.
    pub async fn run<T, F>(&self, session_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut ClaimWizard) -> Result<T>,
    {
        let (_guard, mut session) = self.load_locked(session_id).await?;
        if session.is_submitted() {
            return Err(WizardError::AlreadySubmitted(session_id.to_string()));
        }

        let output = f(&mut session.wizard)?;
        session.touch();
        self.storage.save(session).await?;
        Ok(output)
    }

    /// Clears the wizard and any earlier receipt so a new claim can be filed
    pub async fn reset(&self, session_id: &str) -> Result<Session> {
        let (_guard, mut session) = self.load_locked(session_id).await?;
        session.reset();
        self.storage.save(session.clone()).await?;
        info!(session_id = %session_id, "claim session reset");
        Ok(session)
    }

    /// Sends the finished claim and records the receipt on the session.
    ///
    /// The session stays locked while the submitter runs, so a concurrent
    /// second submit waits and then fails with `AlreadySubmitted`.
    pub async fn submit(
        &self,
        session_id: &str,
        submitter: &dyn ClaimSubmitter,
        attachment: Option<ClaimAttachment>,
    ) -> Result<ClaimSubmissionResponse> {
        let (_guard, mut session) = self.load_locked(session_id).await?;
        if session.is_submitted() {
            return Err(WizardError::AlreadySubmitted(session_id.to_string()));
        }

        if let Some(attachment) = &attachment {
            attachment.ensure_uploaded()?;
        }
        let payload = session.wizard.build_payload(attachment)?;
        let response = submitter.submit(payload).await.inspect_err(|e| {
            error!(session_id = %session_id, error = %e, "claim submission failed");
        })?;

        info!(
            session_id = %session_id,
            claim_number = %response.claim_number,
            "claim submitted"
        );
        session.submission = Some(response.clone());
        session.touch();
        self.storage.save(session).await?;
        Ok(response)
    }

    pub async fn delete(&self, session_id: &str) -> Result<()> {
        let guard = self.locks.acquire(session_id).await;
        let removed = self.storage.delete(session_id).await?;
        drop(guard);
        self.locks.forget(session_id);

        if !removed {
            return Err(WizardError::SessionNotFound(session_id.to_string()));
        }
        Ok(())
    }
}
