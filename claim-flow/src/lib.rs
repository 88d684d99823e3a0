pub mod auth;
pub mod controller;
pub mod error;
pub mod forms;
pub mod incident;
pub mod record;
pub mod runner;
pub mod schema;
pub mod step;
pub mod storage;
pub mod store;
pub mod submission;

// Re-export commonly used types
pub use auth::{AuthForm, AuthFormStore, auth_schema};
pub use controller::ClaimWizard;
pub use error::{FieldIssue, Result, ValidationErrors, WizardError};
pub use forms::schema_for_step;
pub use incident::{DYNAMIC_FIELD_KEYS, IncidentType, get_schema_for, get_schema_for_tag};
pub use record::FormRecord;
pub use runner::SessionRunner;
pub use schema::{Check, FieldKind, FieldSpec, Schema};
pub use step::WizardStep;
pub use storage::{InMemorySessionStorage, Session, SessionLocks, SessionStorage};
pub use store::{ClaimFormSnapshot, ClaimsFormState};
pub use submission::{
    ClaimAttachment, ClaimPayload, ClaimStatus, ClaimSubmissionResponse, ClaimSubmitter,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_incident_type_switch_through_session() {
        let runner = SessionRunner::new(Arc::new(InMemorySessionStorage::new()));
        let session = runner.create().await.unwrap();

        runner
            .run(&session.id, |wizard| {
                wizard.update_fields(
                    WizardStep::IncidentType,
                    FormRecord::try_from(json!({"incidentType": "lost-baggage"}))?,
                );
                wizard.update_fields(
                    WizardStep::IncidentDetails,
                    FormRecord::try_from(json!({
                        "incidentDate": "2024-07-02",
                        "flightNumber": "LH400",
                        "baggageClaimNumber": "FRA-77",
                    }))?,
                );
                Ok(())
            })
            .await
            .unwrap();

        runner
            .run(&session.id, |wizard| {
                wizard.update_fields(
                    WizardStep::IncidentType,
                    FormRecord::try_from(json!({"incidentType": "medical-accident"}))?,
                );
                Ok(())
            })
            .await
            .unwrap();

        let stored = runner.load(&session.id).await.unwrap();
        let details = stored.wizard.state().get_step_data(WizardStep::IncidentDetails);
        assert!(!details.contains_key("flightNumber"));
        assert!(!details.contains_key("baggageClaimNumber"));
        assert_eq!(details.get_str("incidentDate"), Some("2024-07-02"));
    }

    #[test]
    fn test_schema_for_tag_matches_selected_type() {
        let schema = get_schema_for_tag(Some("travel-delay"));
        for field in ["flightNumber", "departureDate", "arrivalDate", "delayDuration"] {
            assert!(schema.is_required(field));
        }
        assert_eq!(
            get_schema_for_tag(Some("others")).required_fields(),
            get_schema_for(None).required_fields()
        );
    }
}
