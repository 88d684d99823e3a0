use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{
    error::WizardError,
    forms::incident_details_base_schema,
    schema::{FieldSpec, Schema},
};

/// Keys owned by some incident-type extension. They are cleared from the
/// incident details whenever the selected type changes.
pub const DYNAMIC_FIELD_KEYS: &[&str] = &[
    "flightNumber",
    "departureDate",
    "arrivalDate",
    "delayDuration",
    "cancellationReason",
    "medicalFacility",
    "diagnosisCode",
    "treatmentDate",
    "baggageClaimNumber",
    "itemsLost",
    "purchaseReceipts",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncidentType {
    TravelDelay,
    TravelMisconnection,
    TripCancellation,
    MedicalAccident,
    LostBaggage,
    Others,
}

impl IncidentType {
    pub const ALL: [IncidentType; 6] = [
        IncidentType::TravelDelay,
        IncidentType::TravelMisconnection,
        IncidentType::TripCancellation,
        IncidentType::MedicalAccident,
        IncidentType::LostBaggage,
        IncidentType::Others,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentType::TravelDelay => "travel-delay",
            IncidentType::TravelMisconnection => "travel-misconnection",
            IncidentType::TripCancellation => "trip-cancellation",
            IncidentType::MedicalAccident => "medical-accident",
            IncidentType::LostBaggage => "lost-baggage",
            IncidentType::Others => "others",
        }
    }

    /// Lenient lookup: absent or unrecognised tags give `None`
    pub fn from_tag(tag: Option<&str>) -> Option<Self> {
        tag.and_then(|t| t.parse().ok())
    }

    /// Labels of the extra fields this type requires on the incident details step
    pub fn required_field_labels(self) -> &'static [&'static str] {
        match self {
            IncidentType::TravelDelay => &[
                "Flight/Transport Number",
                "Scheduled Departure Date",
                "Actual Arrival Date",
                "Delay Duration",
            ],
            IncidentType::TravelMisconnection => {
                &["Initial Flight Number", "Connection Time Missed"]
            }
            IncidentType::TripCancellation => &["Cancellation Reason", "Original Departure Date"],
            IncidentType::MedicalAccident => &["Medical Facility Name", "Treatment Date"],
            IncidentType::LostBaggage => &[
                "Baggage Claim Number",
                "Flight Number",
                "Items Lost/Damaged Details",
            ],
            IncidentType::Others => &[],
        }
    }

    /// Rules this type adds on top of the base incident details schema
    pub fn extension_schema(self) -> Option<Schema> {
        let schema = match self {
            IncidentType::TravelDelay => Schema::new()
                .field(FieldSpec::text("flightNumber").min(1, "Flight/transport number is required"))
                .field(FieldSpec::text("departureDate").min(1, "Scheduled departure date is required"))
                .field(FieldSpec::text("arrivalDate").min(1, "Actual arrival date is required"))
                .field(FieldSpec::text("delayDuration").min(1, "Delay duration is required")),
            IncidentType::TravelMisconnection => Schema::new()
                .field(FieldSpec::text("flightNumber").min(1, "Initial flight number is required"))
                .field(FieldSpec::text("delayDuration").min(1, "Connection time missed is required")),
            IncidentType::TripCancellation => Schema::new()
                .field(FieldSpec::text("cancellationReason").min(1, "Cancellation reason is required"))
                .field(FieldSpec::text("departureDate").min(1, "Original departure date is required")),
            IncidentType::MedicalAccident => Schema::new()
                .field(FieldSpec::text("medicalFacility").min(1, "Medical facility name is required"))
                .field(FieldSpec::text("treatmentDate").min(1, "Treatment date is required"))
                .field(FieldSpec::text("diagnosisCode").optional()),
            IncidentType::LostBaggage => Schema::new()
                .field(FieldSpec::text("baggageClaimNumber").min(1, "Baggage claim number is required"))
                .field(FieldSpec::text("flightNumber").min(1, "Flight number is required"))
                .field(FieldSpec::text("itemsLost").min(
                    10,
                    "Please describe the lost or damaged items (minimum 10 characters)",
                ))
                .field(FieldSpec::boolean("purchaseReceipts").optional()),
            IncidentType::Others => return None,
        };
        Some(schema)
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentType {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| WizardError::UnknownIncidentType(s.to_string()))
    }
}

/// Incident details schema for the selected type: the base rules, AND the
/// type's extension when it has one.
pub fn get_schema_for(incident_type: Option<IncidentType>) -> Schema {
    let base = incident_details_base_schema();
    match incident_type.and_then(IncidentType::extension_schema) {
        Some(extension) => base.intersect(extension),
        None => base,
    }
}

/// Same as [`get_schema_for`], starting from a raw tag
pub fn get_schema_for_tag(tag: Option<&str>) -> Schema {
    get_schema_for(IncidentType::from_tag(tag))
}
