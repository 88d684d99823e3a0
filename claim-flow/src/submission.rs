use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, WizardError},
    store::ClaimFormSnapshot,
};

/// Lifecycle state reported for a claim; intake only ever produces `submitted`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Submitted,
}

/// A document uploaded ahead of submission, e.g. the generated review PDF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub file_id: String,
    pub file_name: String,
    pub file_url: String,
    pub uploaded_at: DateTime<Utc>,
}

impl ClaimAttachment {
    /// An attachment must point at a stored file before it is sent with a claim
    pub fn ensure_uploaded(&self) -> Result<()> {
        if self.file_id.trim().is_empty() || self.file_url.trim().is_empty() {
            return Err(WizardError::UploadFailed(format!(
                "{} has no stored file",
                self.file_name
            )));
        }
        Ok(())
    }
}

/// Everything sent to the claims endpoint on final submit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPayload {
    #[serde(flatten)]
    pub form_data: ClaimFormSnapshot,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<ClaimAttachment>,
    pub submitted_at: DateTime<Utc>,
    pub status: ClaimStatus,
}

impl ClaimPayload {
    pub fn new(form_data: ClaimFormSnapshot, attachment: Option<ClaimAttachment>) -> Self {
        Self {
            form_data,
            attachments: attachment.into_iter().collect(),
            submitted_at: Utc::now(),
            status: ClaimStatus::Submitted,
        }
    }
}

/// Receipt returned by the claims endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSubmissionResponse {
    pub claim_id: String,
    pub claim_number: String,
    pub status: ClaimStatus,
    pub submitted_at: DateTime<Utc>,
    pub estimated_processing_days: u32,
}

/// Destination of a finished claim
#[async_trait]
pub trait ClaimSubmitter: Send + Sync {
    async fn submit(&self, payload: ClaimPayload) -> Result<ClaimSubmissionResponse>;
}
