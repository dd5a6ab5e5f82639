//! Patient record models and translation helpers.
//!
//! Responsibilities:
//! - Define the patient record and its sub-records (allergies, regular medications, past
//!   conditions, contact details)
//! - Describe its editable fields as a [`RecordSchema`]
//! - Translate to and from the REST wire format

use crate::fields::{CollectionField, FieldError, FieldIssue, SubRecord};
use crate::schema::{missing_required, sub, FieldSpec, RecordSchema, SubFieldSpec};
use crate::wire;
use crate::{Record, RecordId, RecordKind, RecordsResult};
use chrono::{DateTime, NaiveDate, Utc};
use clinic_types::{optional_text, NonEmptyText};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Sub-records
// ============================================================================

/// A recorded allergy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allergy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergen_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifestation: Option<String>,
}

impl Allergy {
    pub const KEYS: &'static [&'static str] = &["allergenName", "manifestation"];
}

impl SubRecord for Allergy {
    fn set(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        let slot = match key {
            "allergenName" => &mut self.allergen_name,
            "manifestation" => &mut self.manifestation,
            _ => return Err(FieldError::unknown("allergy", key)),
        };
        *slot = optional_text(value);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<&str> {
        match key {
            "allergenName" => self.allergen_name.as_deref(),
            "manifestation" => self.manifestation.as_deref(),
            _ => None,
        }
    }

    fn keys(&self) -> &'static [&'static str] {
        Self::KEYS
    }
}

/// A medication the patient takes regularly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
}

impl Medication {
    pub const KEYS: &'static [&'static str] = &["medicationName", "dosage", "frequency"];
}

impl SubRecord for Medication {
    fn set(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        let slot = match key {
            "medicationName" => &mut self.medication_name,
            "dosage" => &mut self.dosage,
            "frequency" => &mut self.frequency,
            _ => return Err(FieldError::unknown("medication", key)),
        };
        *slot = optional_text(value);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<&str> {
        match key {
            "medicationName" => self.medication_name.as_deref(),
            "dosage" => self.dosage.as_deref(),
            "frequency" => self.frequency.as_deref(),
            _ => None,
        }
    }

    fn keys(&self) -> &'static [&'static str] {
        Self::KEYS
    }
}

/// A past medical condition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_name: Option<String>,
    /// Free text; clinics record anything from a year to a full date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosed_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Condition {
    pub const KEYS: &'static [&'static str] = &["conditionName", "diagnosedOn", "notes"];
}

impl SubRecord for Condition {
    fn set(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        let slot = match key {
            "conditionName" => &mut self.condition_name,
            "diagnosedOn" => &mut self.diagnosed_on,
            "notes" => &mut self.notes,
            _ => return Err(FieldError::unknown("condition", key)),
        };
        *slot = optional_text(value);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<&str> {
        match key {
            "conditionName" => self.condition_name.as_deref(),
            "diagnosedOn" => self.diagnosed_on.as_deref(),
            "notes" => self.notes.as_deref(),
            _ => None,
        }
    }

    fn keys(&self) -> &'static [&'static str] {
        Self::KEYS
    }
}

/// Contact details, edited as a singular nested object (`contact.phone`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Contact {
    pub const KEYS: &'static [&'static str] = &["phone", "email", "address"];
}

impl SubRecord for Contact {
    fn set(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        let slot = match key {
            "phone" => &mut self.phone,
            "email" => &mut self.email,
            "address" => &mut self.address,
            _ => return Err(FieldError::unknown("contact", key)),
        };
        *slot = optional_text(value);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<&str> {
        match key {
            "phone" => self.phone.as_deref(),
            "email" => self.email.as_deref(),
            "address" => self.address.as_deref(),
            _ => None,
        }
    }

    fn keys(&self) -> &'static [&'static str] {
        Self::KEYS
    }
}

// ============================================================================
// Patient record
// ============================================================================

/// A patient's demographic and background record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientRecord {
    pub id: Option<RecordId>,
    pub first_name: Option<NonEmptyText>,
    pub last_name: Option<NonEmptyText>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub contact: Contact,
    pub allergies: Vec<Allergy>,
    pub regular_medications: Vec<Medication>,
    pub past_conditions: Vec<Condition>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

const ALLERGY_FIELDS: &[SubFieldSpec] = &[
    sub("allergenName", "Allergen"),
    sub("manifestation", "Manifestation"),
];

const MEDICATION_FIELDS: &[SubFieldSpec] = &[
    sub("medicationName", "Medication"),
    sub("dosage", "Dosage"),
    sub("frequency", "Frequency"),
];

const CONDITION_FIELDS: &[SubFieldSpec] = &[
    sub("conditionName", "Condition"),
    sub("diagnosedOn", "Diagnosed"),
    sub("notes", "Notes"),
];

const CONTACT_FIELDS: &[SubFieldSpec] = &[
    sub("phone", "Phone"),
    sub("email", "Email"),
    sub("address", "Address"),
];

static PATIENT_SCHEMA: RecordSchema = RecordSchema {
    kind: RecordKind::Patient,
    fields: &[
        FieldSpec::required("firstName", "First name"),
        FieldSpec::required("lastName", "Last name"),
        FieldSpec::scalar("dateOfBirth", "Date of birth"),
        FieldSpec::scalar("gender", "Gender"),
        FieldSpec::nested("contact", "Contact", CONTACT_FIELDS),
        FieldSpec::collection("allergies", "Allergies", ALLERGY_FIELDS),
        FieldSpec::collection("regularMedications", "Regular medications", MEDICATION_FIELDS),
        FieldSpec::collection("pastConditions", "Past conditions", CONDITION_FIELDS),
    ],
};

impl Record for PatientRecord {
    const KIND: RecordKind = RecordKind::Patient;

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn schema() -> &'static RecordSchema {
        &PATIENT_SCHEMA
    }

    fn scalar(&self, key: &str) -> Option<String> {
        match key {
            "firstName" => self.first_name.as_ref().map(ToString::to_string),
            "lastName" => self.last_name.as_ref().map(ToString::to_string),
            "dateOfBirth" => wire::render_date(self.date_of_birth),
            "gender" => self.gender.clone(),
            _ => None,
        }
    }

    fn set_scalar(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        match key {
            "firstName" => self.first_name = NonEmptyText::new(value).ok(),
            "lastName" => self.last_name = NonEmptyText::new(value).ok(),
            "gender" => self.gender = optional_text(value),
            "dateOfBirth" => {
                self.date_of_birth = match optional_text(value) {
                    Some(raw) => Some(
                        wire::parse_date(&raw)
                            .ok_or_else(|| FieldError::invalid(key, "expected YYYY-MM-DD"))?,
                    ),
                    None => None,
                }
            }
            "_id" | "createdAt" | "updatedAt" => return Err(FieldError::read_only(key)),
            _ => return Err(FieldError::unknown("patient", key)),
        }
        Ok(())
    }

    fn nested(&self, name: &str) -> Option<&dyn SubRecord> {
        match name {
            "contact" => Some(&self.contact),
            _ => None,
        }
    }

    fn nested_mut(&mut self, name: &str) -> Option<&mut dyn SubRecord> {
        match name {
            "contact" => Some(&mut self.contact),
            _ => None,
        }
    }

    fn collection(&self, name: &str) -> Option<&dyn CollectionField> {
        match name {
            "allergies" => Some(&self.allergies),
            "regularMedications" => Some(&self.regular_medications),
            "pastConditions" => Some(&self.past_conditions),
            _ => None,
        }
    }

    fn collection_mut(&mut self, name: &str) -> Option<&mut dyn CollectionField> {
        match name {
            "allergies" => Some(&mut self.allergies),
            "regularMedications" => Some(&mut self.regular_medications),
            "pastConditions" => Some(&mut self.past_conditions),
            _ => None,
        }
    }

    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = missing_required(self);
        if let Some(email) = self.contact.email.as_deref() {
            if !email.contains('@') {
                issues.push(FieldIssue::new("contact.email", "Email address is not valid"));
            }
        }
        issues
    }

    fn from_wire_value(value: Value) -> RecordsResult<Self> {
        let wire: PatientWire = wire::decode(value, "Patient")?;
        Ok(Self {
            id: wire::parse_id(wire.id)?,
            first_name: wire.first_name,
            last_name: wire.last_name,
            date_of_birth: wire::parse_wire_date(wire.date_of_birth.as_deref(), "dateOfBirth")?,
            gender: wire.gender,
            contact: wire.contact.unwrap_or_default(),
            allergies: wire.allergies,
            regular_medications: wire.regular_medications,
            past_conditions: wire.past_conditions,
            created_at: wire::parse_timestamp(wire.created_at.as_deref(), "createdAt"),
            updated_at: wire::parse_timestamp(wire.updated_at.as_deref(), "updatedAt"),
        })
    }

    fn to_wire_value(&self) -> RecordsResult<Value> {
        let wire = PatientWire {
            id: self.id.as_ref().map(ToString::to_string),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_of_birth: wire::render_date(self.date_of_birth),
            gender: self.gender.clone(),
            contact: (!self.contact.is_blank()).then(|| self.contact.clone()),
            allergies: self.allergies.clone(),
            regular_medications: self.regular_medications.clone(),
            past_conditions: self.past_conditions.clone(),
            created_at: wire::render_timestamp(self.created_at),
            updated_at: wire::render_timestamp(self.updated_at),
        };
        wire::encode(&wire, "patient")
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

/// Wire representation of a patient as exchanged with the REST API.
///
/// Unknown keys (such as the server's `__v` version counter) are ignored.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct PatientWire {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_name: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_name: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contact: Option<Contact>,
    #[serde(default)]
    allergies: Vec<Allergy>,
    #[serde(default)]
    regular_medications: Vec<Medication>,
    #[serde(default)]
    past_conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
}
