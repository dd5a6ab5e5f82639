//! Generic edits over a record's collections, nested objects and scalars.
//!
//! Field names are the wire names a form emits. The record's schema decides whether a name is a
//! collection, a nested object or a scalar; the record's accessors reach the typed storage.
//! Out-of-range positions are ignored (logged at debug level) rather than reported, because a
//! form can race a removal with an update of the same row.

use crate::{CoreError, CoreResult};
use records::{CollectionField, FieldKind, FieldSpec, Record, SubRecord};
use std::fmt;
use std::str::FromStr;

fn field_spec<R: Record>(field: &str) -> CoreResult<&'static FieldSpec> {
    R::schema()
        .field(field)
        .ok_or_else(|| CoreError::UnknownField {
            kind: R::KIND,
            field: field.to_owned(),
        })
}

fn wrong_kind(field: &str, expected: &'static str) -> CoreError {
    CoreError::WrongFieldKind {
        field: field.to_owned(),
        expected,
    }
}

fn collection_mut<'a, R: Record>(
    record: &'a mut R,
    field: &str,
) -> CoreResult<&'a mut dyn CollectionField> {
    if !field_spec::<R>(field)?.is_collection() {
        return Err(wrong_kind(field, "collection"));
    }
    record
        .collection_mut(field)
        .ok_or_else(|| CoreError::UnknownField {
            kind: R::KIND,
            field: field.to_owned(),
        })
}

fn nested_mut<'a, R: Record>(record: &'a mut R, field: &str) -> CoreResult<&'a mut dyn SubRecord> {
    if !matches!(field_spec::<R>(field)?.kind, FieldKind::Nested(_)) {
        return Err(wrong_kind(field, "nested"));
    }
    record
        .nested_mut(field)
        .ok_or_else(|| CoreError::UnknownField {
            kind: R::KIND,
            field: field.to_owned(),
        })
}

/// Appends a blank sub-record to the collection `field`. Returns its position.
pub fn add_entry<R: Record>(record: &mut R, field: &str) -> CoreResult<usize> {
    let collection = collection_mut(record, field)?;
    collection.push_blank();
    Ok(collection.len() - 1)
}

/// Removes the sub-record at `index` from the collection `field`, keeping the order of the
/// rest. Returns `false` when `index` is out of range.
pub fn remove_entry<R: Record>(record: &mut R, field: &str, index: usize) -> CoreResult<bool> {
    let collection = collection_mut(record, field)?;
    let removed = collection.remove(index);
    if !removed {
        tracing::debug!(
            kind = %R::KIND,
            field,
            index,
            len = collection.len(),
            "ignoring removal of out-of-range entry"
        );
    }
    Ok(removed)
}

/// Sets one sub-field.
///
/// With `Some(index)`, `field` must be a collection and the entry at `index` is updated; an
/// out-of-range index is ignored. With `None`, `field` must be a nested object.
pub fn update_field<R: Record>(
    record: &mut R,
    field: &str,
    index: Option<usize>,
    key: &str,
    value: &str,
) -> CoreResult<()> {
    match index {
        Some(index) => {
            let collection = collection_mut(record, field)?;
            let len = collection.len();
            match collection.entry_mut(index) {
                Some(entry) => entry.set(key, value)?,
                None => tracing::debug!(
                    kind = %R::KIND,
                    field,
                    index,
                    len,
                    "ignoring update of out-of-range entry"
                ),
            }
        }
        None => nested_mut(record, field)?.set(key, value)?,
    }
    Ok(())
}

/// Sets a top-level path from raw form input.
///
/// `"parent.child"` updates sub-field `child` of the nested object `parent`; any other path is
/// a scalar update.
pub fn set_field<R: Record>(record: &mut R, path: &str, value: &str) -> CoreResult<()> {
    if let Some((parent, child)) = path.split_once('.') {
        return update_field(record, parent, None, child, value);
    }

    if let Some(spec) = R::schema().field(path) {
        if spec.kind != FieldKind::Scalar {
            return Err(wrong_kind(path, "scalar"));
        }
    }
    record.set_scalar(path, value)?;
    Ok(())
}

/// One scripted edit, as typed on the command line.
///
/// Syntax:
/// - `add:<collection>`
/// - `remove:<collection>:<index>`
/// - `<collection>.<index>.<key>=<value>`
/// - `<nested>.<key>=<value>` or `<scalar>=<value>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOp {
    Add {
        field: String,
    },
    Remove {
        field: String,
        index: usize,
    },
    UpdateEntry {
        field: String,
        index: usize,
        key: String,
        value: String,
    },
    Set {
        path: String,
        value: String,
    },
}

impl EditOp {
    pub fn apply<R: Record>(&self, record: &mut R) -> CoreResult<()> {
        match self {
            Self::Add { field } => add_entry(record, field).map(|_| ()),
            Self::Remove { field, index } => remove_entry(record, field, *index).map(|_| ()),
            Self::UpdateEntry {
                field,
                index,
                key,
                value,
            } => update_field(record, field, Some(*index), key, value),
            Self::Set { path, value } => set_field(record, path, value),
        }
    }
}

fn parse_index(raw: &str, op: &str) -> CoreResult<usize> {
    raw.parse::<usize>()
        .map_err(|_| CoreError::InvalidInput(format!("invalid entry index '{raw}' in '{op}'")))
}

impl FromStr for EditOp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(field) = s.strip_prefix("add:") {
            if field.is_empty() {
                return Err(CoreError::InvalidInput(format!("missing field in '{s}'")));
            }
            return Ok(Self::Add {
                field: field.to_owned(),
            });
        }

        if let Some(rest) = s.strip_prefix("remove:") {
            let (field, index) = rest.rsplit_once(':').ok_or_else(|| {
                CoreError::InvalidInput(format!("expected remove:<field>:<index>, got '{s}'"))
            })?;
            return Ok(Self::Remove {
                field: field.to_owned(),
                index: parse_index(index, s)?,
            });
        }

        let (path, value) = s.split_once('=').ok_or_else(|| {
            CoreError::InvalidInput(format!("expected <field>=<value>, got '{s}'"))
        })?;
        if path.is_empty() {
            return Err(CoreError::InvalidInput(format!("missing field in '{s}'")));
        }

        let parts: Vec<&str> = path.split('.').collect();
        match parts.as_slice() {
            [field, index, key] => Ok(Self::UpdateEntry {
                field: (*field).to_owned(),
                index: parse_index(index, s)?,
                key: (*key).to_owned(),
                value: value.to_owned(),
            }),
            [_] | [_, _] => Ok(Self::Set {
                path: path.to_owned(),
                value: value.to_owned(),
            }),
            _ => Err(CoreError::InvalidInput(format!(
                "field path '{path}' is too deep"
            ))),
        }
    }
}

impl fmt::Display for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add { field } => write!(f, "add:{field}"),
            Self::Remove { field, index } => write!(f, "remove:{field}:{index}"),
            Self::UpdateEntry {
                field,
                index,
                key,
                value,
            } => write!(f, "{field}.{index}.{key}={value}"),
            Self::Set { path, value } => write!(f, "{path}={value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use records::{EncounterRecord, FieldError, PatientRecord, PrescriptionRecord};

    fn allergen_names(record: &PatientRecord) -> Vec<Option<&str>> {
        record
            .allergies
            .iter()
            .map(|a| a.allergen_name.as_deref())
            .collect()
    }

    #[test]
    fn add_entry_appends_blank_sub_record() {
        let mut record = PatientRecord::default();
        assert_eq!(add_entry(&mut record, "allergies").unwrap(), 0);
        assert_eq!(add_entry(&mut record, "allergies").unwrap(), 1);
        assert_eq!(record.allergies.len(), 2);
        assert!(record.allergies.iter().all(|a| a.is_blank()));
    }

    #[test]
    fn add_entry_rejects_unknown_and_non_collection_fields() {
        let mut record = PatientRecord::default();
        assert!(matches!(
            add_entry(&mut record, "vaccinations"),
            Err(CoreError::UnknownField { .. })
        ));
        assert!(matches!(
            add_entry(&mut record, "contact"),
            Err(CoreError::WrongFieldKind { expected: "collection", .. })
        ));
        assert!(matches!(
            add_entry(&mut record, "firstName"),
            Err(CoreError::WrongFieldKind { .. })
        ));
    }

    #[test]
    fn remove_entry_preserves_order() {
        let mut record = PatientRecord::default();
        for name in ["A", "B", "C"] {
            let index = add_entry(&mut record, "allergies").unwrap();
            update_field(&mut record, "allergies", Some(index), "allergenName", name).unwrap();
        }

        assert!(remove_entry(&mut record, "allergies", 1).unwrap());
        assert_eq!(allergen_names(&record), vec![Some("A"), Some("C")]);
    }

    #[test]
    fn update_field_touches_only_the_indexed_entry() {
        let mut record = PatientRecord::default();
        add_entry(&mut record, "regularMedications").unwrap();
        add_entry(&mut record, "regularMedications").unwrap();

        update_field(&mut record, "regularMedications", Some(0), "dosage", "500mg").unwrap();
        update_field(&mut record, "regularMedications", Some(1), "dosage", "250mg").unwrap();

        let dosages: Vec<_> = record
            .regular_medications
            .iter()
            .map(|m| m.dosage.as_deref())
            .collect();
        assert_eq!(dosages, vec![Some("500mg"), Some("250mg")]);
        assert_eq!(record.regular_medications[0].medication_name, None);
    }

    #[test]
    fn remove_entry_out_of_range_is_a_no_op() {
        let mut record = PatientRecord::default();
        add_entry(&mut record, "allergies").unwrap();
        let before = record.clone();

        assert!(!remove_entry(&mut record, "allergies", 5).unwrap());
        assert_eq!(record, before);
    }

    #[test]
    fn update_field_out_of_range_is_a_no_op() {
        let mut record = PatientRecord::default();
        add_entry(&mut record, "allergies").unwrap();
        let before = record.clone();

        update_field(&mut record, "allergies", Some(3), "allergenName", "Latex").unwrap();
        assert_eq!(record, before);
    }

    #[test]
    fn update_field_rejects_unknown_sub_field() {
        let mut record = PatientRecord::default();
        add_entry(&mut record, "allergies").unwrap();
        let err = update_field(&mut record, "allergies", Some(0), "severity", "high")
            .expect_err("unknown key");
        assert!(matches!(err, CoreError::Field(FieldError::UnknownKey { .. })));
    }

    #[test]
    fn update_field_without_index_targets_nested_object() {
        let mut record = EncounterRecord::default();
        update_field(&mut record, "followUpCarePlan", None, "instructions", "Rest").unwrap();
        assert_eq!(
            record.follow_up_care_plan.instructions.as_deref(),
            Some("Rest")
        );

        assert!(matches!(
            update_field(&mut record, "tests", None, "testName", "CBC"),
            Err(CoreError::WrongFieldKind { expected: "nested", .. })
        ));
    }

    #[test]
    fn set_field_routes_dot_paths_to_nested_objects() {
        let mut record = PatientRecord::default();
        set_field(&mut record, "contact.phone", "555-0100").unwrap();
        set_field(&mut record, "firstName", "Ada").unwrap();

        assert_eq!(record.contact.phone.as_deref(), Some("555-0100"));
        assert_eq!(record.scalar("firstName").as_deref(), Some("Ada"));
    }

    #[test]
    fn set_field_rejects_server_assigned_and_structured_fields() {
        let mut record = PrescriptionRecord::default();
        assert!(matches!(
            set_field(&mut record, "dateIssued", "2026-01-01T00:00:00Z"),
            Err(CoreError::Field(FieldError::ReadOnly { .. }))
        ));
        assert!(matches!(
            set_field(&mut record, "medications", "x"),
            Err(CoreError::WrongFieldKind { expected: "scalar", .. })
        ));
    }

    #[test]
    fn edit_ops_parse_from_command_line_syntax() {
        assert_eq!(
            "add:allergies".parse::<EditOp>().unwrap(),
            EditOp::Add {
                field: "allergies".into()
            }
        );
        assert_eq!(
            "remove:allergies:2".parse::<EditOp>().unwrap(),
            EditOp::Remove {
                field: "allergies".into(),
                index: 2
            }
        );
        assert_eq!(
            "allergies.0.allergenName=Pollen, grass".parse::<EditOp>().unwrap(),
            EditOp::UpdateEntry {
                field: "allergies".into(),
                index: 0,
                key: "allergenName".into(),
                value: "Pollen, grass".into()
            }
        );
        assert_eq!(
            "contact.email=a=b@example.com".parse::<EditOp>().unwrap(),
            EditOp::Set {
                path: "contact.email".into(),
                value: "a=b@example.com".into()
            }
        );
        assert_eq!(
            "notes=".parse::<EditOp>().unwrap(),
            EditOp::Set {
                path: "notes".into(),
                value: String::new()
            }
        );
    }

    #[test]
    fn malformed_edit_ops_are_rejected() {
        for input in ["add:", "remove:allergies", "remove:allergies:x", "notes", "=x", "a.b.c.d=1", "a.x.b=1"] {
            assert!(
                matches!(input.parse::<EditOp>(), Err(CoreError::InvalidInput(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn edit_ops_apply_in_sequence() {
        let mut record = PatientRecord::default();
        for op in [
            "firstName=Ada",
            "add:allergies",
            "allergies.0.allergenName=Penicillin",
            "add:allergies",
            "remove:allergies:1",
        ] {
            op.parse::<EditOp>().unwrap().apply(&mut record).unwrap();
        }
        assert_eq!(record.scalar("firstName").as_deref(), Some("Ada"));
        assert_eq!(allergen_names(&record), vec![Some("Penicillin")]);
    }
}
