use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WizardError;

/// One page of the claim intake flow.
///
/// Declaration order is the navigation order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    ClaimType,
    PolicyDetails,
    ClaimantDetails,
    IncidentType,
    IncidentDetails,
    ReviewDetails,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        WizardStep::ClaimType,
        WizardStep::PolicyDetails,
        WizardStep::ClaimantDetails,
        WizardStep::IncidentType,
        WizardStep::IncidentDetails,
        WizardStep::ReviewDetails,
    ];

    pub fn first() -> Self {
        Self::ALL[0]
    }

    pub fn last() -> Self {
        Self::ALL[Self::ALL.len() - 1]
    }

    /// Position in the fixed order
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WizardStep::ClaimType => "claim-type",
            WizardStep::PolicyDetails => "policy-details",
            WizardStep::ClaimantDetails => "claimant-details",
            WizardStep::IncidentType => "incident-type",
            WizardStep::IncidentDetails => "incident-details",
            WizardStep::ReviewDetails => "review-details",
        }
    }

    /// Title shown in the sidebar stepper
    pub fn label(self) -> &'static str {
        match self {
            WizardStep::ClaimType => "Claim Type",
            WizardStep::PolicyDetails => "Policy Details",
            WizardStep::ClaimantDetails => "Claimant Details",
            WizardStep::IncidentType => "Incident Type",
            WizardStep::IncidentDetails => "Incident Details",
            WizardStep::ReviewDetails => "Review & Submit",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardStep {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| WizardError::UnknownStep(s.to_string()))
    }
}
