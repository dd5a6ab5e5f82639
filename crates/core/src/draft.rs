//! Committed record plus an optional working copy.

use records::Record;

/// Holds the last committed record and, while editing, an independent draft of it.
///
/// The draft is always a deep clone: mutating it never touches the committed record, and a
/// refresh of the committed record replaces the draft rather than merging into it.
#[derive(Clone, Debug, Default)]
pub struct DraftStore<R: Record> {
    committed: Option<R>,
    draft: Option<R>,
}

impl<R: Record> DraftStore<R> {
    /// Creates a store for an existing record, or an empty one for a record not yet created.
    pub fn new(committed: Option<R>) -> Self {
        Self {
            committed,
            draft: None,
        }
    }

    pub fn committed(&self) -> Option<&R> {
        self.committed.as_ref()
    }

    pub fn draft(&self) -> Option<&R> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut R> {
        self.draft.as_mut()
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    /// Opens a draft as a deep copy of the committed record, or an empty template when nothing
    /// has been committed yet. An already open draft is replaced.
    pub fn begin_edit(&mut self) -> &mut R {
        let draft = self.committed.clone().unwrap_or_default();
        self.draft.insert(draft)
    }

    /// Discards the draft. The committed record is untouched.
    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    /// Replaces the committed record after an external refresh.
    ///
    /// An open draft is re-cloned from the new record; edits made to it are lost.
    pub fn replace_committed(&mut self, record: R) {
        if self.draft.is_some() {
            self.draft = Some(record.clone());
        }
        self.committed = Some(record);
    }

    /// Installs the record returned by persistence and closes the draft.
    pub(crate) fn commit(&mut self, record: R) -> &R {
        self.draft = None;
        self.committed.insert(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use records::{PatientRecord, SubRecord};

    fn patient(first: &str) -> PatientRecord {
        let mut record = PatientRecord::default();
        record.set_scalar("firstName", first).unwrap();
        record.set_scalar("lastName", "Okafor").unwrap();
        record
    }

    #[test]
    fn begin_edit_clones_committed() {
        let mut store = DraftStore::new(Some(patient("Ada")));
        let draft = store.begin_edit();
        draft.set_scalar("firstName", "Grace").unwrap();

        assert_eq!(store.committed().unwrap().scalar("firstName").as_deref(), Some("Ada"));
        assert_eq!(store.draft().unwrap().scalar("firstName").as_deref(), Some("Grace"));
    }

    #[test]
    fn draft_collections_do_not_alias_committed() {
        let mut committed = patient("Ada");
        committed.allergies.push(Default::default());
        committed.allergies[0].set("allergenName", "Penicillin").unwrap();

        let mut store = DraftStore::new(Some(committed.clone()));
        let draft = store.begin_edit();
        draft.allergies[0].set("allergenName", "Latex").unwrap();
        draft.allergies.push(Default::default());

        assert_eq!(store.committed(), Some(&committed));
    }

    #[test]
    fn begin_edit_without_committed_uses_empty_template() {
        let mut store = DraftStore::<PatientRecord>::new(None);
        let draft = store.begin_edit();
        assert_eq!(draft, &PatientRecord::default());
        assert!(store.is_editing());
    }

    #[test]
    fn cancel_edit_restores_committed_view() {
        let mut store = DraftStore::new(Some(patient("Ada")));
        store.begin_edit().set_scalar("firstName", "Grace").unwrap();
        store.cancel_edit();

        assert!(!store.is_editing());
        assert!(store.draft().is_none());
        assert_eq!(store.committed(), Some(&patient("Ada")));
    }

    #[test]
    fn replace_committed_reclones_open_draft() {
        let mut store = DraftStore::new(Some(patient("Ada")));
        store.begin_edit().set_scalar("firstName", "Grace").unwrap();

        store.replace_committed(patient("Chidi"));
        assert_eq!(store.draft(), Some(&patient("Chidi")));
        assert_eq!(store.committed(), Some(&patient("Chidi")));
    }

    #[test]
    fn replace_committed_leaves_closed_draft_closed() {
        let mut store = DraftStore::new(Some(patient("Ada")));
        store.replace_committed(patient("Chidi"));
        assert!(!store.is_editing());
    }

    #[test]
    fn commit_installs_record_and_closes_draft() {
        let mut store = DraftStore::new(Some(patient("Ada")));
        store.begin_edit();
        store.commit(patient("Grace"));
        assert!(!store.is_editing());
        assert_eq!(store.committed(), Some(&patient("Grace")));
    }
}
