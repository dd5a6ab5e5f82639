//! Prescription record models and translation helpers.
//!
//! A prescription's creation timestamp is its `dateIssued`; the edit window is measured from
//! it.

use crate::fields::{CollectionField, FieldError, FieldIssue, SubRecord};
use crate::schema::{missing_required, sub, FieldSpec, RecordSchema, SubFieldSpec};
use crate::wire;
use crate::{Record, RecordId, RecordKind, RecordsResult};
use chrono::{DateTime, Utc};
use clinic_types::{is_blank, optional_text};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One drug line on a prescription.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescribedDrug {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drug_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl PrescribedDrug {
    pub const KEYS: &'static [&'static str] =
        &["drugName", "dosage", "frequency", "duration", "instructions"];
}

impl SubRecord for PrescribedDrug {
    fn set(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        let slot = match key {
            "drugName" => &mut self.drug_name,
            "dosage" => &mut self.dosage,
            "frequency" => &mut self.frequency,
            "duration" => &mut self.duration,
            "instructions" => &mut self.instructions,
            _ => return Err(FieldError::unknown("prescribed drug", key)),
        };
        *slot = optional_text(value);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<&str> {
        match key {
            "drugName" => self.drug_name.as_deref(),
            "dosage" => self.dosage.as_deref(),
            "frequency" => self.frequency.as_deref(),
            "duration" => self.duration.as_deref(),
            "instructions" => self.instructions.as_deref(),
            _ => None,
        }
    }

    fn keys(&self) -> &'static [&'static str] {
        Self::KEYS
    }
}

/// A prescription issued to a patient.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrescriptionRecord {
    pub id: Option<RecordId>,
    pub patient_id: Option<RecordId>,
    pub prescriber: Option<String>,
    /// Set by the server when the prescription is first saved.
    pub date_issued: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub medications: Vec<PrescribedDrug>,
    pub updated_at: Option<DateTime<Utc>>,
}

const DRUG_FIELDS: &[SubFieldSpec] = &[
    sub("drugName", "Drug"),
    sub("dosage", "Dosage"),
    sub("frequency", "Frequency"),
    sub("duration", "Duration"),
    sub("instructions", "Instructions"),
];

static PRESCRIPTION_SCHEMA: RecordSchema = RecordSchema {
    kind: RecordKind::Prescription,
    fields: &[
        FieldSpec::required("patientId", "Patient"),
        FieldSpec::scalar("prescriber", "Prescriber"),
        FieldSpec::scalar("notes", "Notes"),
        FieldSpec::collection("medications", "Medications", DRUG_FIELDS),
    ],
};

impl Record for PrescriptionRecord {
    const KIND: RecordKind = RecordKind::Prescription;

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.date_issued
    }

    fn schema() -> &'static RecordSchema {
        &PRESCRIPTION_SCHEMA
    }

    fn scalar(&self, key: &str) -> Option<String> {
        match key {
            "patientId" => self.patient_id.as_ref().map(ToString::to_string),
            "prescriber" => self.prescriber.clone(),
            "dateIssued" => wire::render_timestamp(self.date_issued),
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
            "prescriber" => self.prescriber = optional_text(value),
            "notes" => self.notes = optional_text(value),
            "_id" | "dateIssued" | "updatedAt" => return Err(FieldError::read_only(key)),
            _ => return Err(FieldError::unknown("prescription", key)),
        }
        Ok(())
    }

    fn nested(&self, _name: &str) -> Option<&dyn SubRecord> {
        None
    }

    fn nested_mut(&mut self, _name: &str) -> Option<&mut dyn SubRecord> {
        None
    }

    fn collection(&self, name: &str) -> Option<&dyn CollectionField> {
        match name {
            "medications" => Some(&self.medications),
            _ => None,
        }
    }

    fn collection_mut(&mut self, name: &str) -> Option<&mut dyn CollectionField> {
        match name {
            "medications" => Some(&mut self.medications),
            _ => None,
        }
    }

    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = missing_required(self);
        let filled: Vec<_> = self.medications.iter().filter(|m| !m.is_blank()).collect();
        if filled.is_empty() {
            issues.push(FieldIssue::new(
                "medications",
                "At least one medication is required",
            ));
        }
        for (index, drug) in self.medications.iter().enumerate() {
            if !drug.is_blank() && is_blank(drug.drug_name.as_deref()) {
                issues.push(FieldIssue::new(
                    format!("medications.{index}.drugName"),
                    "Drug name is required",
                ));
            }
        }
        issues
    }

    fn from_wire_value(value: Value) -> RecordsResult<Self> {
        let wire: PrescriptionWire = wire::decode(value, "Prescription")?;
        Ok(Self {
            id: wire::parse_id(wire.id)?,
            patient_id: wire::parse_id(wire.patient_id)?,
            prescriber: wire.prescriber,
            date_issued: wire::parse_timestamp(wire.date_issued.as_deref(), "dateIssued"),
            notes: wire.notes,
            medications: wire.medications,
            updated_at: wire::parse_timestamp(wire.updated_at.as_deref(), "updatedAt"),
        })
    }

    fn to_wire_value(&self) -> RecordsResult<Value> {
        let wire = PrescriptionWire {
            id: self.id.as_ref().map(ToString::to_string),
            patient_id: self.patient_id.as_ref().map(ToString::to_string),
            prescriber: self.prescriber.clone(),
            date_issued: wire::render_timestamp(self.date_issued),
            notes: self.notes.clone(),
            medications: self.medications.clone(),
            updated_at: wire::render_timestamp(self.updated_at),
        };
        wire::encode(&wire, "prescription")
    }
}

/// Wire representation of a prescription.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrescriptionWire {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prescriber: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_issued: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(default)]
    medications: Vec<PrescribedDrug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
}
