use kira_taxon_survey::domain::{LengthRange, SeqRecord};
use kira_taxon_survey::filter::filter_by_length;

fn sample() -> Vec<SeqRecord> {
    vec![
        SeqRecord::new("A1", 50, "short"),
        SeqRecord::new("A2", 150, "middle"),
        SeqRecord::new("A3", 300, "long"),
        SeqRecord::new("A4", 100, "lower edge"),
        SeqRecord::new("A5", 200, "upper edge"),
        SeqRecord::new("A6", 0, "empty"),
    ]
}

fn ids(records: &[SeqRecord]) -> Vec<&str> {
    records.iter().map(|record| record.id.as_str()).collect()
}

#[test]
fn keeps_inclusive_bounds_in_fetch_order() {
    let filtered = filter_by_length(sample(), LengthRange::new(100, 200));
    assert_eq!(ids(&filtered), vec!["A2", "A4", "A5"]);
}

#[test]
fn result_is_exactly_the_matching_subsequence() {
    let range = LengthRange::new(0, 150);
    let expected: Vec<SeqRecord> = sample()
        .into_iter()
        .filter(|record| record.length <= 150)
        .collect();
    assert_eq!(filter_by_length(sample(), range), expected);
}

#[test]
fn filtering_is_idempotent() {
    for (lo, hi) in [(100, 200), (0, 0), (-5, 1_000), (301, 400)] {
        let range = LengthRange::new(lo, hi);
        let once = filter_by_length(sample(), range);
        let twice = filter_by_length(once.clone(), range);
        assert_eq!(once, twice, "range [{lo}, {hi}]");
    }
}

#[test]
fn empty_input_and_inverted_range_yield_nothing() {
    assert!(filter_by_length(Vec::new(), LengthRange::new(0, 10)).is_empty());
    assert!(filter_by_length(sample(), LengthRange::new(200, 100)).is_empty());
}
