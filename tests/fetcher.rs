use kira_taxon_survey::domain::{SearchResult, Session, SessionHandle};
use kira_taxon_survey::fetcher::{PAGE_CAP, PagedFetcher, Paging};

mod common;

use common::{FetchCall, MockEntrez, genbank_entry};

fn active_session(total_count: usize) -> Session {
    Session::Active(SearchResult {
        taxid: "9606".parse().unwrap(),
        organism_name: "Homo sapiens".to_string(),
        total_count,
        handle: SessionHandle {
            web_env: "MCID_mock".to_string(),
            query_key: "1".to_string(),
        },
    })
}

#[test]
fn single_page_request_is_capped_at_page_limit() {
    let client = MockEntrez::with_pages(5_000, vec![]);
    let fetcher = PagedFetcher::new(&client, Paging::SinglePage);

    fetcher.fetch_all(&active_session(5_000), 1_000);

    assert_eq!(client.fetch_calls(), vec![FetchCall { start: 0, max: 500 }]);
}

#[test]
fn exhaustive_paging_never_exceeds_page_limit() {
    let client = MockEntrez::with_pages(5_000, vec![]);
    let fetcher = PagedFetcher::new(&client, Paging::Exhaustive);

    fetcher.fetch_all(&active_session(5_000), 1_000);

    let calls = client.fetch_calls();
    assert_eq!(
        calls,
        vec![
            FetchCall { start: 0, max: 500 },
            FetchCall { start: 500, max: 500 },
        ]
    );
    assert!(calls.iter().all(|call| call.max <= PAGE_CAP));
}

#[test]
fn no_session_fetches_nothing() {
    let client = MockEntrez::with_pages(3, vec![Some(genbank_entry("A1", 50, "x"))]);
    let fetcher = PagedFetcher::new(&client, Paging::Exhaustive);

    let records = fetcher.fetch_all(&Session::NoSession, 200);

    assert!(records.is_empty());
    assert!(client.fetch_calls().is_empty());
}

#[test]
fn failing_page_is_skipped_and_later_pages_still_count() {
    let client = MockEntrez::with_pages(
        1_200,
        vec![
            Some(genbank_entry("A1", 50, "first page")),
            None,
            Some(genbank_entry("A3", 300, "third page")),
        ],
    );
    let fetcher = PagedFetcher::new(&client, Paging::Exhaustive);

    let records = fetcher.fetch_all(&active_session(1_200), 1_200);

    let ids: Vec<_> = records.iter().map(|record| record.id.as_str()).collect();
    assert_eq!(ids, vec!["A1", "A3"]);
    assert_eq!(client.fetch_calls().len(), 3);
}

#[test]
fn malformed_page_contributes_nothing() {
    let client = MockEntrez::with_pages(
        1_200,
        vec![
            Some(genbank_entry("A1", 50, "first page")),
            Some("LOCUS       broken\nDEFINITION  x\n".to_string()),
            Some(genbank_entry("A3", 300, "third page")),
        ],
    );
    let fetcher = PagedFetcher::new(&client, Paging::Exhaustive);

    let records = fetcher.fetch_all(&active_session(1_200), 1_200);

    let ids: Vec<_> = records.iter().map(|record| record.id.as_str()).collect();
    assert_eq!(ids, vec!["A1", "A3"]);
    assert_eq!(client.fetch_calls().len(), 3);
}

#[test]
fn pages_accumulate_in_fetch_order() {
    let first = [genbank_entry("B2", 20, "b"), genbank_entry("B1", 10, "a")].concat();
    let client = MockEntrez::with_pages(600, vec![Some(first), Some(genbank_entry("B3", 5, "c"))]);
    let fetcher = PagedFetcher::new(&client, Paging::Exhaustive);

    let records = fetcher.fetch_all(&active_session(600), 600);

    let ids: Vec<_> = records.iter().map(|record| record.id.as_str()).collect();
    assert_eq!(ids, vec!["B2", "B1", "B3"]);
    assert_eq!(
        client.fetch_calls(),
        vec![
            FetchCall { start: 0, max: 500 },
            FetchCall { start: 500, max: 100 },
        ]
    );
}
