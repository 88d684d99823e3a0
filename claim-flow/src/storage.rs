use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{controller::ClaimWizard, error::Result, submission::ClaimSubmissionResponse};

/// One claim filing session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub wizard: ClaimWizard,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Receipt of the final submission, once the claim has been sent
    pub submission: Option<ClaimSubmissionResponse>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            wizard: ClaimWizard::new(),
            created_at: now,
            updated_at: now,
            submission: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn is_submitted(&self) -> bool {
        self.submission.is_some()
    }

    /// Starts a fresh claim in the same session, dropping any earlier receipt
    pub fn reset(&mut self) {
        self.wizard.reset();
        self.submission = None;
        self.touch();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Persistence seam for claim sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    /// Returns `false` when no session with that id was stored
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Volatile session storage; everything is gone when the process exits.
#[derive(Default)]
pub struct InMemorySessionStorage {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.sessions.remove(id).is_some())
    }
}

/// One async mutex per session id.
///
/// Held for a whole load → mutate → save cycle, including the await on the
/// claim submitter, so two requests against the same session never
/// interleave. Locks are local to the process.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(session_id.to_string()).or_default().value().clone();
        lock.lock_owned().await
    }

    /// Drops the lock entry of a deleted or unknown session
    pub fn forget(&self, session_id: &str) {
        self.locks.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::WizardStep;

    #[tokio::test]
    async fn test_in_memory_storage_round_trip() {
        let storage = InMemorySessionStorage::new();
        let mut session = Session::with_id("session1");
        session.wizard.next();

        storage.save(session).await.unwrap();
        let retrieved = storage.get("session1").await.unwrap().unwrap();
        assert_eq!(retrieved.wizard.current_step(), WizardStep::PolicyDetails);
        assert_eq!(storage.len(), 1);

        assert!(storage.delete("session1").await.unwrap());
        assert!(!storage.delete("session1").await.unwrap());
        assert!(storage.get("session1").await.unwrap().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_session_reset_drops_receipt() {
        let mut session = Session::with_id("s");
        session.wizard.next();
        session.submission = Some(ClaimSubmissionResponse {
            claim_id: "claim_1".to_string(),
            claim_number: "CL-2024-000001".to_string(),
            status: crate::submission::ClaimStatus::Submitted,
            submitted_at: Utc::now(),
            estimated_processing_days: 7,
        });
        assert!(session.is_submitted());

        session.reset();
        assert!(!session.is_submitted());
        assert_eq!(session.wizard.current_step(), WizardStep::ClaimType);
    }

    #[tokio::test]
    async fn test_session_locks_serialise_holders() {
        let locks = SessionLocks::new();
        let guard = locks.acquire("s1").await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _guard = contender.acquire("s1").await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(!waiting.is_finished());

        // Other sessions are not blocked
        drop(locks.acquire("s2").await);

        drop(guard);
        waiting.await.unwrap();
    }

    #[test]
    fn test_session_serializes_wizard_state() {
        let session = Session::with_id("s");
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["wizard"]["current_step"], "claim-type");
        assert!(json["submission"].is_null());

        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back.wizard, session.wizard);
    }
}
