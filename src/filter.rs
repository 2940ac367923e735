use crate::domain::{LengthRange, SeqRecord};

/// Keeps records whose length lies in `range`, in their original order.
pub fn filter_by_length(records: Vec<SeqRecord>, range: LengthRange) -> Vec<SeqRecord> {
    if range.is_empty() {
        return Vec::new();
    }
    records
        .into_iter()
        .filter(|record| range.contains(record.length))
        .collect()
}
