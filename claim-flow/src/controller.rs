use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{Result, WizardError},
    forms::schema_for_step,
    incident::{self, IncidentType},
    record::FormRecord,
    schema::Schema,
    step::WizardStep,
    store::ClaimsFormState,
    submission::{ClaimAttachment, ClaimPayload},
};

/// Field of the incident-type step holding the selected tag
const INCIDENT_TYPE_FIELD: &str = "incidentType";

fn incident_tag(record: &FormRecord) -> Option<String> {
    record
        .get_str(INCIDENT_TYPE_FIELD)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
}

/// Single writer of a [`ClaimsFormState`].
///
/// Form views hand their values to the wizard at defined points: on blur
/// through [`ClaimWizard::update_fields`] and on submit through
/// [`ClaimWizard::submit_step`]. Nothing is synced implicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimWizard {
    state: ClaimsFormState,
}

impl ClaimWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: ClaimsFormState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ClaimsFormState {
        &self.state
    }

    pub fn into_state(self) -> ClaimsFormState {
        self.state
    }

    pub fn current_step(&self) -> WizardStep {
        self.state.current_step()
    }

    /// Raw incident type tag as entered on the incident-type step; an empty
    /// selection counts as none
    pub fn selected_incident_tag(&self) -> Option<String> {
        self.state
            .step_data(WizardStep::IncidentType)
            .and_then(incident_tag)
    }

    pub fn selected_incident_type(&self) -> Option<IncidentType> {
        IncidentType::from_tag(self.selected_incident_tag().as_deref())
    }

    /// Validation rules currently in force for the incident details step
    pub fn incident_details_schema(&self) -> Schema {
        incident::get_schema_for(self.selected_incident_type())
    }

    /// Merges values without validating them.
    ///
    /// Switching the incident type away from an earlier selection drops the
    /// type-specific incident details so they cannot leak into the new type.
    pub fn update_fields(&mut self, step: WizardStep, partial: FormRecord) {
        if step != WizardStep::IncidentType {
            self.state.set_form_data(step, partial);
            return;
        }

        let previous = self.selected_incident_tag();
        let selected = incident_tag(&partial);
        self.state.set_form_data(step, partial);

        if let (Some(previous), Some(selected)) = (previous, selected) {
            if previous != selected {
                info!(
                    from = %previous,
                    to = %selected,
                    "incident type changed, clearing type specific details"
                );
                self.state.clear_incident_details_dynamic_fields();
            }
        }
    }

    /// Validates and stores the current step, marks it completed and moves
    /// on. The review step stays current: final submission happens
    /// separately.
    ///
    /// On validation failure nothing is changed.
    pub fn submit_step(&mut self, step: WizardStep, record: FormRecord) -> Result<WizardStep> {
        let current = self.current_step();
        if step != current {
            return Err(WizardError::StepNotCurrent {
                requested: step,
                current,
            });
        }

        let incident_type = match step {
            WizardStep::IncidentDetails => self.selected_incident_type(),
            _ => None,
        };

        let mut candidate = self.state.get_step_data(step);
        candidate.merge(record.clone());
        if let Err(errors) = schema_for_step(step, incident_type).validate(&candidate) {
            debug!(step = %step, issues = errors.issues.len(), "step rejected");
            return Err(errors.into());
        }

        self.update_fields(step, record);
        self.state.mark_step_as_completed(step);
        if step != WizardStep::ReviewDetails {
            self.state.go_to_next_step();
        }

        info!(step = %step, next = %self.current_step(), "step submitted");
        Ok(self.current_step())
    }

    /// Jumps to a step the user already completed, or stays on the current one
    pub fn jump_to(&mut self, step: WizardStep) -> Result<WizardStep> {
        if step != self.current_step() && !self.state.is_step_completed(step) {
            return Err(WizardError::StepNotCompleted(step));
        }
        self.state.set_current_step(step);
        Ok(step)
    }

    pub fn next(&mut self) -> WizardStep {
        self.state.go_to_next_step();
        self.current_step()
    }

    pub fn previous(&mut self) -> WizardStep {
        self.state.go_to_previous_step();
        self.current_step()
    }

    pub fn reset(&mut self) {
        self.state.reset_form();
    }

    /// Steps still waiting to be completed, in wizard order
    pub fn outstanding_steps(&self) -> Vec<WizardStep> {
        WizardStep::ALL
            .into_iter()
            .filter(|step| !self.state.is_step_completed(*step))
            .collect()
    }

    pub fn build_payload(&self, attachment: Option<ClaimAttachment>) -> Result<ClaimPayload> {
        let outstanding = self.outstanding_steps();
        if !outstanding.is_empty() {
            return Err(WizardError::IncompleteClaim(outstanding));
        }
        Ok(ClaimPayload::new(self.state.get_all_form_data(), attachment))
    }
}
