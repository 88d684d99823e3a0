use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::step::WizardStep;

/// A single failed validation rule, addressed by its dotted field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Every issue found while validating one record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{} field(s) failed validation", .issues.len())]
pub struct ValidationErrors {
    pub issues: Vec<FieldIssue>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn push(&mut self, issue: FieldIssue) {
        self.issues.push(issue);
    }

    /// Messages reported for a given field path
    pub fn messages_for(&self, path: &str) -> Vec<&str> {
        self.issues
            .iter()
            .filter(|issue| issue.path == path)
            .map(|issue| issue.message.as_str())
            .collect()
    }

    pub fn has_issue_for(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Unknown wizard step: {0}")]
    UnknownStep(String),

    #[error("Unknown incident type: {0}")]
    UnknownIncidentType(String),

    #[error("Unknown authentication form: {0}")]
    UnknownAuthForm(String),

    #[error("Cannot submit {requested} while {current} is the current step")]
    StepNotCurrent {
        requested: WizardStep,
        current: WizardStep,
    },

    #[error("Step {0} has not been completed yet")]
    StepNotCompleted(WizardStep),

    #[error("Claim is incomplete, outstanding steps: {0:?}")]
    IncompleteClaim(Vec<WizardStep>),

    #[error("Form data must be a JSON object")]
    NotAnObject,

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Claim already submitted for session {0}")]
    AlreadySubmitted(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Claim submission failed: {0}")]
    SubmissionFailed(String),
}

impl WizardError {
    /// The single message a form view shows for this failure
    pub fn user_message(&self) -> String {
        match self {
            WizardError::UploadFailed(_) => {
                "Failed to upload PDF document. Please try again.".to_string()
            }
            WizardError::SubmissionFailed(_) => {
                "Failed to submit claim data. Please check your information and try again."
                    .to_string()
            }
            WizardError::Validation(errors) => match errors.issues.first() {
                Some(issue) => issue.message.clone(),
                None => "Please check the highlighted fields.".to_string(),
            },
            WizardError::IncompleteClaim(_) => {
                "Please complete all steps before submitting your claim.".to_string()
            }
            WizardError::AlreadySubmitted(_) => "This claim has already been submitted.".to_string(),
            _ => "Failed to submit claim. Please try again.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WizardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_per_failure() {
        assert_eq!(
            WizardError::UploadFailed("Server error".into()).user_message(),
            "Failed to upload PDF document. Please try again."
        );
        assert_eq!(
            WizardError::SessionNotFound("s1".into()).user_message(),
            "Failed to submit claim. Please try again."
        );

        let errors = ValidationErrors {
            issues: vec![FieldIssue::new("policyNumber", "Policy number is required")],
        };
        assert_eq!(
            WizardError::from(errors).user_message(),
            "Policy number is required"
        );
    }

    #[test]
    fn test_validation_errors_display() {
        let errors = ValidationErrors {
            issues: vec![FieldIssue::new("a", "x"), FieldIssue::new("b", "y")],
        };
        assert_eq!(errors.to_string(), "2 field(s) failed validation");
    }
}
