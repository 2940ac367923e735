use tracing::{debug, info, warn};

use crate::domain::{SeqRecord, Session};
use crate::genbank::parse_page;
use crate::ncbi::{EntrezClient, NUCLEOTIDE_DB, PageRequest};

/// NCBI refuses `retmax` above this for GenBank text.
pub const PAGE_CAP: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Paging {
    /// One request at offset 0, whatever the result set size.
    SinglePage,
    /// Walk offsets until `max_records` or the result count is reached.
    #[default]
    Exhaustive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    pub start: usize,
    pub size: usize,
}

pub fn plan_pages(total_count: usize, max_records: usize, paging: Paging) -> Vec<PageSpan> {
    let batch = max_records.min(PAGE_CAP);
    if batch == 0 {
        return Vec::new();
    }
    match paging {
        Paging::SinglePage => vec![PageSpan {
            start: 0,
            size: batch,
        }],
        Paging::Exhaustive => {
            let target = max_records.min(total_count);
            (0..target)
                .step_by(batch)
                .map(|start| PageSpan {
                    start,
                    size: batch.min(target - start),
                })
                .collect()
        }
    }
}

pub struct PagedFetcher<'a, C: EntrezClient> {
    client: &'a C,
    paging: Paging,
}

impl<'a, C: EntrezClient> PagedFetcher<'a, C> {
    pub fn new(client: &'a C, paging: Paging) -> Self {
        Self { client, paging }
    }

    /// Accumulates up to `max_records` records from the session's result set.
    /// Never fails: a missing session yields nothing, and a page that cannot be
    /// fetched or parsed contributes nothing while later pages still run.
    pub fn fetch_all(&self, session: &Session, max_records: usize) -> Vec<SeqRecord> {
        let search = match session.active() {
            Ok(search) => search,
            Err(err) => {
                warn!(error = %err, "fetch skipped");
                return Vec::new();
            }
        };

        let pages = plan_pages(search.total_count, max_records, self.paging);
        debug!(pages = pages.len(), paging = ?self.paging, "planned fetch");

        let mut records = Vec::new();
        for span in pages {
            let request = PageRequest {
                handle: &search.handle,
                start: span.start,
                max: span.size,
            };
            let batch = self
                .client
                .fetch_page(NUCLEOTIDE_DB, request)
                .and_then(|payload| parse_page(&payload, span.start));
            match batch {
                Ok(batch) => {
                    debug!(start = span.start, received = batch.len(), "page fetched");
                    records.extend(batch);
                }
                Err(err) => {
                    warn!(start = span.start, size = span.size, error = %err, "page dropped");
                }
            }
        }

        info!(taxid = %search.taxid, fetched = records.len(), "fetch finished");
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_page_ignores_total_count() {
        assert_eq!(
            plan_pages(10_000, 1000, Paging::SinglePage),
            vec![PageSpan { start: 0, size: 500 }]
        );
        assert_eq!(
            plan_pages(3, 200, Paging::SinglePage),
            vec![PageSpan { start: 0, size: 200 }]
        );
    }

    #[test]
    fn exhaustive_stops_at_smaller_of_cap_and_count() {
        assert_eq!(
            plan_pages(1200, 1100, Paging::Exhaustive),
            vec![
                PageSpan { start: 0, size: 500 },
                PageSpan { start: 500, size: 500 },
                PageSpan { start: 1000, size: 100 },
            ]
        );
        assert_eq!(
            plan_pages(3, 200, Paging::Exhaustive),
            vec![PageSpan { start: 0, size: 3 }]
        );
        assert!(plan_pages(0, 200, Paging::Exhaustive).is_empty());
        assert!(plan_pages(50, 0, Paging::SinglePage).is_empty());
    }
}
