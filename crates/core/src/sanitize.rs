//! Submission sanitizer: drops blank collection rows before a record is sent.

use records::Record;

/// Returns a copy of `record` with every blank sub-record removed from the named collections.
///
/// The input is never modified. Names that are not collections of `R` are skipped.
pub fn sanitize<R: Record>(record: &R, fields: &[&str]) -> R {
    let mut cleaned = record.clone();
    for &field in fields {
        match cleaned.collection_mut(field) {
            Some(collection) => {
                let dropped = collection.retain_filled();
                if dropped > 0 {
                    tracing::debug!(kind = %R::KIND, field, dropped, "dropped blank entries");
                }
            }
            None => tracing::debug!(kind = %R::KIND, field, "not a collection, skipping"),
        }
    }
    cleaned
}

/// [`sanitize`] over every collection in the record's schema.
pub fn sanitize_all<R: Record>(record: &R) -> R {
    sanitize(record, &R::schema().collection_names())
}
