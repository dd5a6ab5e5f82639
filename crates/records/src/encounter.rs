//! Encounter record models and translation helpers.
//!
//! An encounter is one clinical visit: the complaint, findings, the tests and procedures
//! ordered during it, and a follow-up care plan.

use crate::fields::{CollectionField, FieldError, FieldIssue, SubRecord};
use crate::schema::{missing_required, sub, FieldSpec, RecordSchema, SubFieldSpec};
use crate::wire;
use crate::{Record, RecordId, RecordKind, RecordsResult};
use chrono::{DateTime, NaiveDate, Utc};
use clinic_types::{optional_text, NonEmptyText};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A test ordered during an encounter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOrder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl TestOrder {
    pub const KEYS: &'static [&'static str] = &["testName", "result"];
}

impl SubRecord for TestOrder {
    fn set(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        let slot = match key {
            "testName" => &mut self.test_name,
            "result" => &mut self.result,
            _ => return Err(FieldError::unknown("test", key)),
        };
        *slot = optional_text(value);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<&str> {
        match key {
            "testName" => self.test_name.as_deref(),
            "result" => self.result.as_deref(),
            _ => None,
        }
    }

    fn keys(&self) -> &'static [&'static str] {
        Self::KEYS
    }
}

/// A procedure performed during an encounter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Procedure {
    pub const KEYS: &'static [&'static str] = &["procedureName", "notes"];
}

impl SubRecord for Procedure {
    fn set(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        let slot = match key {
            "procedureName" => &mut self.procedure_name,
            "notes" => &mut self.notes,
            _ => return Err(FieldError::unknown("procedure", key)),
        };
        *slot = optional_text(value);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<&str> {
        match key {
            "procedureName" => self.procedure_name.as_deref(),
            "notes" => self.notes.as_deref(),
            _ => None,
        }
    }

    fn keys(&self) -> &'static [&'static str] {
        Self::KEYS
    }
}

/// Follow-up care plan, edited as a nested object (`followUpCarePlan.category`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarePlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Stored as `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<String>,
}

impl CarePlan {
    pub const KEYS: &'static [&'static str] = &["category", "instructions", "followUpDate"];

    pub fn follow_up_date(&self) -> Option<NaiveDate> {
        self.follow_up_date.as_deref().and_then(wire::parse_date)
    }
}

impl SubRecord for CarePlan {
    fn set(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        match key {
            "category" => self.category = optional_text(value),
            "instructions" => self.instructions = optional_text(value),
            "followUpDate" => {
                self.follow_up_date = match optional_text(value) {
                    Some(raw) => {
                        let date = wire::parse_date(&raw)
                            .ok_or_else(|| FieldError::invalid(key, "expected YYYY-MM-DD"))?;
                        wire::render_date(Some(date))
                    }
                    None => None,
                }
            }
            _ => return Err(FieldError::unknown("care plan", key)),
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Option<&str> {
        match key {
            "category" => self.category.as_deref(),
            "instructions" => self.instructions.as_deref(),
            "followUpDate" => self.follow_up_date.as_deref(),
            _ => None,
        }
    }

    fn keys(&self) -> &'static [&'static str] {
        Self::KEYS
    }
}

/// One clinical visit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncounterRecord {
    pub id: Option<RecordId>,
    pub patient_id: Option<RecordId>,
    pub encounter_date: Option<NaiveDate>,
    pub chief_complaint: Option<NonEmptyText>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub tests: Vec<TestOrder>,
    pub procedures: Vec<Procedure>,
    pub follow_up_care_plan: CarePlan,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

const TEST_FIELDS: &[SubFieldSpec] = &[sub("testName", "Test"), sub("result", "Result")];

const PROCEDURE_FIELDS: &[SubFieldSpec] =
    &[sub("procedureName", "Procedure"), sub("notes", "Notes")];

const CARE_PLAN_FIELDS: &[SubFieldSpec] = &[
    sub("category", "Category"),
    sub("instructions", "Instructions"),
    sub("followUpDate", "Follow-up date"),
];

static ENCOUNTER_SCHEMA: RecordSchema = RecordSchema {
    kind: RecordKind::Encounter,
    fields: &[
        FieldSpec::required("patientId", "Patient"),
        FieldSpec::scalar("encounterDate", "Encounter date"),
        FieldSpec::required("chiefComplaint", "Chief complaint"),
        FieldSpec::scalar("diagnosis", "Diagnosis"),
        FieldSpec::scalar("notes", "Notes"),
        FieldSpec::collection("tests", "Tests", TEST_FIELDS),
        FieldSpec::collection("procedures", "Procedures", PROCEDURE_FIELDS),
        FieldSpec::nested("followUpCarePlan", "Follow-up care plan", CARE_PLAN_FIELDS),
    ],
};

impl Record for EncounterRecord {
    const KIND: RecordKind = RecordKind::Encounter;

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn schema() -> &'static RecordSchema {
        &ENCOUNTER_SCHEMA
    }

    fn scalar(&self, key: &str) -> Option<String> {
        match key {
            "patientId" => self.patient_id.as_ref().map(ToString::to_string),
            "encounterDate" => wire::render_date(self.encounter_date),
            "chiefComplaint" => self.chief_complaint.as_ref().map(ToString::to_string),
            "diagnosis" => self.diagnosis.clone(),
            "notes" => self.notes.clone(),
            _ => None,
        }
    }

    fn set_scalar(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        match key {
            "patientId" => {
                self.patient_id = optional_text(value)
                    .map(|raw| RecordId::parse(&raw))
                    .transpose()
                    .map_err(|e| FieldError::invalid(key, e.to_string()))?;
            }
            "encounterDate" => {
                self.encounter_date = match optional_text(value) {
                    Some(raw) => Some(
                        wire::parse_date(&raw)
                            .ok_or_else(|| FieldError::invalid(key, "expected YYYY-MM-DD"))?,
                    ),
                    None => None,
                }
            }
            "chiefComplaint" => self.chief_complaint = NonEmptyText::new(value).ok(),
            "diagnosis" => self.diagnosis = optional_text(value),
            "notes" => self.notes = optional_text(value),
            "_id" | "createdAt" | "updatedAt" => return Err(FieldError::read_only(key)),
            _ => return Err(FieldError::unknown("encounter", key)),
        }
        Ok(())
    }

    fn nested(&self, name: &str) -> Option<&dyn SubRecord> {
        match name {
            "followUpCarePlan" => Some(&self.follow_up_care_plan),
            _ => None,
        }
    }

    fn nested_mut(&mut self, name: &str) -> Option<&mut dyn SubRecord> {
        match name {
            "followUpCarePlan" => Some(&mut self.follow_up_care_plan),
            _ => None,
        }
    }

    fn collection(&self, name: &str) -> Option<&dyn CollectionField> {
        match name {
            "tests" => Some(&self.tests),
            "procedures" => Some(&self.procedures),
            _ => None,
        }
    }

    fn collection_mut(&mut self, name: &str) -> Option<&mut dyn CollectionField> {
        match name {
            "tests" => Some(&mut self.tests),
            "procedures" => Some(&mut self.procedures),
            _ => None,
        }
    }

    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = missing_required(self);
        if let (Some(visit), Some(follow_up)) = (
            self.encounter_date,
            self.follow_up_care_plan.follow_up_date(),
        ) {
            if follow_up < visit {
                issues.push(FieldIssue::new(
                    "followUpCarePlan.followUpDate",
                    "Follow-up date cannot be before the encounter",
                ));
            }
        }
        issues
    }

    fn from_wire_value(value: Value) -> RecordsResult<Self> {
        let wire: EncounterWire = wire::decode(value, "Encounter")?;
        Ok(Self {
            id: wire::parse_id(wire.id)?,
            patient_id: wire::parse_id(wire.patient_id)?,
            encounter_date: wire::parse_wire_date(wire.encounter_date.as_deref(), "encounterDate")?,
            chief_complaint: wire.chief_complaint,
            diagnosis: wire.diagnosis,
            notes: wire.notes,
            tests: wire.tests,
            procedures: wire.procedures,
            follow_up_care_plan: wire.follow_up_care_plan.unwrap_or_default(),
            created_at: wire::parse_timestamp(wire.created_at.as_deref(), "createdAt"),
            updated_at: wire::parse_timestamp(wire.updated_at.as_deref(), "updatedAt"),
        })
    }

    fn to_wire_value(&self) -> RecordsResult<Value> {
        let wire = EncounterWire {
            id: self.id.as_ref().map(ToString::to_string),
            patient_id: self.patient_id.as_ref().map(ToString::to_string),
            encounter_date: wire::render_date(self.encounter_date),
            chief_complaint: self.chief_complaint.clone(),
            diagnosis: self.diagnosis.clone(),
            notes: self.notes.clone(),
            tests: self.tests.clone(),
            procedures: self.procedures.clone(),
            follow_up_care_plan: (!self.follow_up_care_plan.is_blank())
                .then(|| self.follow_up_care_plan.clone()),
            created_at: wire::render_timestamp(self.created_at),
            updated_at: wire::render_timestamp(self.updated_at),
        };
        wire::encode(&wire, "encounter")
    }
}

/// Wire representation of an encounter.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct EncounterWire {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encounter_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chief_complaint: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(default)]
    tests: Vec<TestOrder>,
    #[serde(default)]
    procedures: Vec<Procedure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    follow_up_care_plan: Option<CarePlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
}
