use async_trait::async_trait;
use chrono::{Datelike, Utc};
use claim_flow::{ClaimPayload, ClaimStatus, ClaimSubmissionResponse, ClaimSubmitter, Result};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// In-process sink for submitted claims, keyed by claim id
#[derive(Clone, Default)]
pub struct ClaimRegistry {
    claims: Arc<DashMap<String, ClaimPayload>>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, claim_id: &str) -> Option<ClaimPayload> {
        self.claims.get(claim_id).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

fn claim_number(year: i32, sequence: u32) -> String {
    format!("CL-{year}-{:06}", sequence % 1_000_000)
}

#[async_trait]
impl ClaimSubmitter for ClaimRegistry {
    async fn submit(&self, payload: ClaimPayload) -> Result<ClaimSubmissionResponse> {
        let now = Utc::now();
        let response = ClaimSubmissionResponse {
            claim_id: format!("claim_{}", Uuid::new_v4().simple()),
            claim_number: claim_number(now.year(), rand::random::<u32>()),
            status: ClaimStatus::Submitted,
            submitted_at: now,
            estimated_processing_days: rand::random_range(5..=14),
        };

        info!(
            claim_id = %response.claim_id,
            claim_number = %response.claim_number,
            attachments = payload.attachments.len(),
            "claim registered"
        );
        self.claims.insert(response.claim_id.clone(), payload);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim_flow::ClaimFormSnapshot;

    #[test]
    fn test_claim_number_format() {
        assert_eq!(claim_number(2024, 42), "CL-2024-000042");
        assert_eq!(claim_number(2025, 1_234_567), "CL-2025-234567");
    }

    #[tokio::test]
    async fn test_submit_stores_payload() {
        let registry = ClaimRegistry::new();
        let payload = ClaimPayload::new(ClaimFormSnapshot::default(), None);

        let response = registry.submit(payload.clone()).await.unwrap();

        assert!(response.claim_id.starts_with("claim_"));
        assert!(response.claim_number.starts_with("CL-"));
        assert!((5..=14).contains(&response.estimated_processing_days));
        assert_eq!(registry.get(&response.claim_id), Some(payload));
        assert_eq!(registry.len(), 1);
    }
}
