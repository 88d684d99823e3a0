//! Validation schemas for each wizard step.

use crate::{
    incident::{self, IncidentType},
    schema::{FieldSpec, Schema},
    step::WizardStep,
};

pub fn claim_type_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::text("claimType").min(1, "Please select a claim type"))
        .field(FieldSpec::text("subType").optional())
        .field(FieldSpec::text("description").min(
            10,
            "Please provide a detailed description (minimum 10 characters)",
        ))
}

pub fn policy_details_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::text("policyNumber").min(1, "Policy number is required"))
        .field(FieldSpec::text("policyHolderName").min(1, "Policy holder name is required"))
        .field(FieldSpec::text("productType").min(1, "Please select a product type"))
        .field(FieldSpec::text("policyStartDate").min(1, "Policy start date is required"))
        .field(FieldSpec::text("policyEndDate").min(1, "Policy end date is required"))
        .field(FieldSpec::text("coverageAmount").min(1, "Coverage amount is required"))
}

fn address_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::text("line1").min(1, "Address line 1 is required"))
        .field(FieldSpec::text("line2").optional())
        .field(FieldSpec::text("city").min(1, "City is required"))
        .field(FieldSpec::text("postalCode").min(1, "Postal code is required"))
        .field(FieldSpec::text("country").min(1, "Country is required"))
}

pub fn claimant_details_schema() -> Schema {
    Schema::new()
        .field(
            FieldSpec::text("isPolicyHolder")
                .min(1, "Please specify if you are the policy holder"),
        )
        .field(FieldSpec::text("firstName").min(1, "First name is required"))
        .field(FieldSpec::text("lastName").min(1, "Last name is required"))
        .field(FieldSpec::text("email").email("Please enter a valid email address"))
        .field(FieldSpec::text("phoneNumber").min(1, "Phone number is required"))
        .field(FieldSpec::text("dateOfBirth").min(1, "Date of birth is required"))
        .field(FieldSpec::text("gender").min(1, "Please select gender"))
        .field(FieldSpec::text("relationship").optional())
        .field(FieldSpec::object("address", address_schema()))
}

pub fn incident_type_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::text("incidentType").one_of(
            IncidentType::ALL.map(IncidentType::as_str),
            "Please select an incident type",
        ))
        .field(FieldSpec::text("otherDescription").optional())
}

/// Rules shared by every incident, whatever its type
pub fn incident_details_base_schema() -> Schema {
    let witness = Schema::new()
        .field(FieldSpec::text("name").min(1, "Witness name is required"))
        .field(FieldSpec::text("contact").min(1, "Witness contact is required"));
    let attachment = Schema::new()
        .field(FieldSpec::text("name"))
        .field(FieldSpec::text("type"))
        .field(FieldSpec::number("size"));

    Schema::new()
        .field(FieldSpec::text("incidentDate").min(1, "Incident date is required"))
        .field(FieldSpec::text("incidentTime").min(1, "Incident time is required"))
        .field(FieldSpec::text("incidentLocation").min(1, "Incident location is required"))
        .field(FieldSpec::text("incidentDescription").min(
            20,
            "Please provide a detailed description (minimum 20 characters)",
        ))
        .field(FieldSpec::list("witnesses", witness).optional())
        .field(FieldSpec::text("policeReportNumber").optional())
        .field(FieldSpec::text("estimatedLoss").min(1, "Estimated loss amount is required"))
        .field(FieldSpec::list("attachments", attachment).optional())
}

pub fn review_details_schema() -> Schema {
    Schema::new()
        .field(
            FieldSpec::boolean("confirmAccuracy")
                .must_be_true("You must confirm that all information is accurate"),
        )
        .field(
            FieldSpec::boolean("termsAccepted")
                .must_be_true("You must accept the terms and conditions"),
        )
        .field(FieldSpec::text("additionalComments").optional())
}

/// Schema a step's record must satisfy before the step can be submitted
pub fn schema_for_step(step: WizardStep, incident_type: Option<IncidentType>) -> Schema {
    match step {
        WizardStep::ClaimType => claim_type_schema(),
        WizardStep::PolicyDetails => policy_details_schema(),
        WizardStep::ClaimantDetails => claimant_details_schema(),
        WizardStep::IncidentType => incident_type_schema(),
        WizardStep::IncidentDetails => incident::get_schema_for(incident_type),
        WizardStep::ReviewDetails => review_details_schema(),
    }
}
