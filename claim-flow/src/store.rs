use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::{incident::DYNAMIC_FIELD_KEYS, record::FormRecord, step::WizardStep};

/// Everything collected across the claim wizard, one record per step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimFormSnapshot {
    pub claim_type: FormRecord,
    pub policy_details: FormRecord,
    pub claimant_details: FormRecord,
    pub incident_type: FormRecord,
    pub incident_details: FormRecord,
    pub review_details: FormRecord,
}

impl ClaimFormSnapshot {
    pub fn get(&self, step: WizardStep) -> &FormRecord {
        match step {
            WizardStep::ClaimType => &self.claim_type,
            WizardStep::PolicyDetails => &self.policy_details,
            WizardStep::ClaimantDetails => &self.claimant_details,
            WizardStep::IncidentType => &self.incident_type,
            WizardStep::IncidentDetails => &self.incident_details,
            WizardStep::ReviewDetails => &self.review_details,
        }
    }
}

/// Wizard position, completion and per-step field values.
///
/// All operations are total: navigation clamps at either end of the step
/// order instead of failing, and callers that need to know why a move did
/// not happen ask `can_go_next` / `can_go_previous` first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimsFormState {
    current_step: WizardStep,
    completed_steps: BTreeSet<WizardStep>,
    step_data: BTreeMap<WizardStep, FormRecord>,
}

impl ClaimsFormState {
    pub fn new() -> Self {
        Self {
            current_step: WizardStep::first(),
            completed_steps: BTreeSet::new(),
            step_data: WizardStep::ALL
                .into_iter()
                .map(|step| (step, FormRecord::new()))
                .collect(),
        }
    }

    pub fn current_step(&self) -> WizardStep {
        self.current_step
    }

    /// Completed steps in wizard order
    pub fn completed_steps(&self) -> Vec<WizardStep> {
        self.completed_steps.iter().copied().collect()
    }

    pub fn is_step_completed(&self, step: WizardStep) -> bool {
        self.completed_steps.contains(&step)
    }

    /// Unconditional jump. Whether the jump is allowed is the caller's call.
    pub fn set_current_step(&mut self, step: WizardStep) {
        debug!(from = %self.current_step, to = %step, "set current step");
        self.current_step = step;
    }

    pub fn mark_step_as_completed(&mut self, step: WizardStep) {
        if self.completed_steps.insert(step) {
            debug!(step = %step, "step marked as completed");
        }
    }

    /// Shallow-merges `partial` into the step's record. No validation.
    pub fn set_form_data(&mut self, step: WizardStep, partial: FormRecord) {
        debug!(step = %step, fields = partial.len(), "merging form data");
        self.step_data.entry(step).or_default().merge(partial);
    }

    pub fn get_step_data(&self, step: WizardStep) -> FormRecord {
        self.step_data.get(&step).cloned().unwrap_or_default()
    }

    /// Borrowing variant of [`Self::get_step_data`]
    pub fn step_data(&self, step: WizardStep) -> Option<&FormRecord> {
        self.step_data.get(&step)
    }

    pub fn get_all_form_data(&self) -> ClaimFormSnapshot {
        ClaimFormSnapshot {
            claim_type: self.get_step_data(WizardStep::ClaimType),
            policy_details: self.get_step_data(WizardStep::PolicyDetails),
            claimant_details: self.get_step_data(WizardStep::ClaimantDetails),
            incident_type: self.get_step_data(WizardStep::IncidentType),
            incident_details: self.get_step_data(WizardStep::IncidentDetails),
            review_details: self.get_step_data(WizardStep::ReviewDetails),
        }
    }

    pub fn go_to_next_step(&mut self) {
        if let Some(next) = self.current_step.next() {
            self.set_current_step(next);
        }
    }

    pub fn go_to_previous_step(&mut self) {
        if let Some(previous) = self.current_step.previous() {
            self.set_current_step(previous);
        }
    }

    pub fn can_go_next(&self) -> bool {
        self.current_step.next().is_some()
    }

    pub fn can_go_previous(&self) -> bool {
        self.current_step.previous().is_some()
    }

    pub fn reset_form(&mut self) {
        debug!("resetting claim form");
        *self = Self::new();
    }

    /// Removes the incident-type specific keys from the incident details,
    /// leaving the common fields as they are.
    pub fn clear_incident_details_dynamic_fields(&mut self) {
        let removed = self
            .step_data
            .entry(WizardStep::IncidentDetails)
            .or_default()
            .retain_keys_not_in(DYNAMIC_FIELD_KEYS);
        debug!(removed, "cleared dynamic incident detail fields");
    }
}

impl Default for ClaimsFormState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn record(value: Value) -> FormRecord {
        FormRecord::try_from(value).unwrap()
    }

    #[test]
    fn test_initial_state_is_empty() {
        let state = ClaimsFormState::new();

        assert_eq!(state.current_step(), WizardStep::ClaimType);
        assert!(state.completed_steps().is_empty());
        for step in WizardStep::ALL {
            assert!(state.get_step_data(step).is_empty());
            assert!(state.step_data(step).is_some());
        }
        assert_eq!(state.get_all_form_data(), ClaimFormSnapshot::default());
    }

    #[test]
    fn test_set_form_data_is_a_shallow_merge() {
        let mut state = ClaimsFormState::new();
        state.set_form_data(
            WizardStep::PolicyDetails,
            record(json!({"policyNumber": "P-1", "productType": "travel"})),
        );
        state.set_form_data(
            WizardStep::PolicyDetails,
            record(json!({"policyNumber": "P-2", "coverageAmount": "5000"})),
        );

        assert_eq!(
            state.get_step_data(WizardStep::PolicyDetails),
            record(json!({
                "policyNumber": "P-2",
                "productType": "travel",
                "coverageAmount": "5000"
            }))
        );
        assert!(state.get_step_data(WizardStep::ClaimType).is_empty());
    }

    #[test]
    fn test_navigation_clamps_at_both_ends() {
        let mut state = ClaimsFormState::new();
        assert!(!state.can_go_previous());
        assert!(state.can_go_next());

        state.go_to_previous_step();
        assert_eq!(state.current_step(), WizardStep::ClaimType);

        for _ in 0..10 {
            state.go_to_next_step();
        }
        assert_eq!(state.current_step(), WizardStep::ReviewDetails);
        assert!(!state.can_go_next());
        assert!(state.can_go_previous());

        state.go_to_next_step();
        assert_eq!(state.current_step(), WizardStep::ReviewDetails);

        state.go_to_previous_step();
        assert_eq!(state.current_step(), WizardStep::IncidentDetails);
    }

    #[test]
    fn test_can_go_flags_for_every_position() {
        let mut state = ClaimsFormState::new();
        for step in WizardStep::ALL {
            state.set_current_step(step);
            assert_eq!(state.can_go_previous(), step != WizardStep::first());
            assert_eq!(state.can_go_next(), step != WizardStep::last());
        }
    }

    #[test]
    fn test_mark_step_as_completed_is_idempotent() {
        let mut state = ClaimsFormState::new();
        state.mark_step_as_completed(WizardStep::PolicyDetails);
        state.mark_step_as_completed(WizardStep::PolicyDetails);
        state.mark_step_as_completed(WizardStep::ClaimType);

        assert_eq!(
            state.completed_steps(),
            vec![WizardStep::ClaimType, WizardStep::PolicyDetails]
        );

        state.set_form_data(WizardStep::PolicyDetails, record(json!({"policyNumber": "X"})));
        assert_eq!(
            state.get_step_data(WizardStep::PolicyDetails).get_str("policyNumber"),
            Some("X")
        );
    }

    #[test]
    fn test_reset_form_restores_initial_state() {
        let mut state = ClaimsFormState::new();
        state.set_form_data(WizardStep::ClaimType, record(json!({"claimType": "travel"})));
        state.mark_step_as_completed(WizardStep::ClaimType);
        state.go_to_next_step();

        state.reset_form();

        assert_eq!(state, ClaimsFormState::new());
        assert_eq!(state.get_all_form_data(), ClaimFormSnapshot::default());
        assert!(state.completed_steps().is_empty());
    }

    #[test]
    fn test_clear_dynamic_fields_keeps_common_fields_untouched() {
        let mut state = ClaimsFormState::new();
        let common = json!({
            "incidentDate": "2024-03-01",
            "incidentLocation": "Lisbon",
            "witnesses": [{"name": "Ana", "contact": "ana@example.com"}],
        });
        state.set_form_data(WizardStep::IncidentDetails, record(common.clone()));
        state.set_form_data(
            WizardStep::IncidentDetails,
            record(json!({
                "flightNumber": "TP123",
                "baggageClaimNumber": "LIS-42",
                "itemsLost": "a blue suitcase",
                "purchaseReceipts": true,
            })),
        );

        state.clear_incident_details_dynamic_fields();

        assert_eq!(state.get_step_data(WizardStep::IncidentDetails), record(common));
    }

    #[test]
    fn test_claim_type_submission_scenario() {
        let mut state = ClaimsFormState::new();
        state.set_form_data(
            WizardStep::ClaimType,
            record(json!({"claimType": "travel", "description": "lost bag"})),
        );
        state.mark_step_as_completed(WizardStep::ClaimType);
        state.go_to_next_step();

        assert_eq!(state.current_step(), WizardStep::PolicyDetails);
        assert_eq!(state.completed_steps(), vec![WizardStep::ClaimType]);
        assert_eq!(
            state.get_step_data(WizardStep::ClaimType).get_str("claimType"),
            Some("travel")
        );
    }

    #[test]
    fn test_snapshot_uses_camel_case_step_keys() {
        let mut state = ClaimsFormState::new();
        state.set_form_data(WizardStep::IncidentType, record(json!({"incidentType": "others"})));

        let json = serde_json::to_value(state.get_all_form_data()).unwrap();
        assert_eq!(json["incidentType"]["incidentType"], "others");
        assert!(json["reviewDetails"].as_object().unwrap().is_empty());
    }
}
