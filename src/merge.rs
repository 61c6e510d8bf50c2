//! Incremental Merge
//!
//! Appends streamed records into the raw buffer, dropping duplicates by
//! identity key. The buffer is append-only for the life of a viewing
//! session; a record is never updated in place.

use crate::telemetry::RawRecord;

/// Merge one incoming record into the buffer.
///
/// Returns `true` if the record was appended, `false` if a record with the
/// same identity key was already present (the incoming copy is discarded,
/// not merged). A linear scan per record is fine at session scale.
pub fn merge(buffer: &mut Vec<RawRecord>, record: RawRecord) -> bool {
    if buffer.iter().any(|existing| existing.same_identity(&record)) {
        tracing::trace!(
            parameter = %record.parameter,
            tm_received_time = record.tm_received_time,
            "duplicate record dropped"
        );
        return false;
    }
    buffer.push(record);
    true
}

/// Merge a batch, returning how many records were actually appended.
pub fn merge_all(buffer: &mut Vec<RawRecord>, records: impl IntoIterator<Item = RawRecord>) -> usize {
    records
        .into_iter()
        .filter(|record| merge(buffer, record.clone()))
        .count()
}
