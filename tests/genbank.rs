use std::fs;

use kira_taxon_survey::domain::SeqRecord;
use kira_taxon_survey::genbank::parse_page;

mod common;

#[test]
fn parse_fixture_page() {
    let raw = fs::read_to_string("tests/fixtures/nucleotide_page.gb").unwrap();
    let records = parse_page(&raw, 0).unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(
        records[0],
        SeqRecord::new(
            "MW123456.1",
            120,
            "Danio rerio isolate ZF-3 cytochrome b (cytb) gene, partial cds; mitochondrial"
        )
    );
    assert_eq!(records[1].id, "OK000042.2");
    assert_eq!(records[1].length, 75);
    assert_eq!(records[2].id, "AB999001");
    assert_eq!(records[2].length, 64);
}

#[test]
fn contig_entry_uses_locus_length() {
    let raw = fs::read_to_string("tests/fixtures/contig_entry.gb").unwrap();
    let records = parse_page(&raw, 0).unwrap();

    assert_eq!(
        records,
        vec![SeqRecord::new(
            "NW000001.3",
            207_666,
            "Danio rerio strain Tuebingen unplaced genomic scaffold"
        )]
    );
}

#[test]
fn empty_page_has_no_records() {
    assert!(parse_page("", 500).unwrap().is_empty());
}

#[test]
fn generated_entries_round_through_parser() {
    let page = [
        common::genbank_entry("A1", 50, "first."),
        common::genbank_entry("A2", 150, "second"),
    ]
    .concat();
    let records = parse_page(&page, 0).unwrap();
    assert_eq!(
        records,
        vec![
            SeqRecord::new("A1", 50, "first"),
            SeqRecord::new("A2", 150, "second"),
        ]
    );
}
