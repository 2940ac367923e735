#![allow(dead_code)]

use std::sync::Mutex;

use kira_taxon_survey::domain::TaxId;
use kira_taxon_survey::error::KiraError;
use kira_taxon_survey::ncbi::{EntrezClient, EsearchReply, PageRequest};
use kira_taxon_survey::workflow::{ProgressEvent, ProgressSink};

/// Minimal GenBank flat-file entry without a VERSION line, so the record id
/// is the accession itself.
pub fn genbank_entry(accession: &str, length: usize, definition: &str) -> String {
    let mut out = format!(
        "LOCUS       {accession:<16}{length:>12} bp    DNA     linear   PRI 01-JAN-2024\n\
         DEFINITION  {definition}\n\
         ACCESSION   {accession}\n\
         KEYWORDS    .\n\
         SOURCE      Homo sapiens (human)\n  ORGANISM  Homo sapiens\n\
         FEATURES             Location/Qualifiers\n     source          1..{length}\n\
         ORIGIN\n"
    );
    let residues: Vec<u8> = b"acgt".iter().copied().cycle().take(length).collect();
    for (line, chunk) in residues.chunks(60).enumerate() {
        let groups = chunk
            .chunks(10)
            .map(|group| String::from_utf8_lossy(group).into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!("{:>9} {groups}\n", line * 60 + 1));
    }
    out.push_str("//\n");
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchCall {
    pub start: usize,
    pub max: usize,
}

/// Scripted Entrez service. Pages are served in request order; a `None`
/// page answers with a transport error.
pub struct MockEntrez {
    pub organism: Result<String, String>,
    pub count: usize,
    pub search_error: Option<String>,
    pub pages: Vec<Option<String>>,
    pub lookups: Mutex<Vec<String>>,
    pub searches: Mutex<Vec<String>>,
    pub fetches: Mutex<Vec<FetchCall>>,
}

impl MockEntrez {
    pub fn with_pages(count: usize, pages: Vec<Option<String>>) -> Self {
        Self {
            organism: Ok("Homo sapiens".to_string()),
            count,
            search_error: None,
            pages,
            lookups: Mutex::new(Vec::new()),
            searches: Mutex::new(Vec::new()),
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn fetch_calls(&self) -> Vec<FetchCall> {
        self.fetches.lock().unwrap().clone()
    }
}

impl EntrezClient for MockEntrez {
    fn lookup_organism(&self, taxid: &TaxId) -> Result<String, KiraError> {
        self.lookups.lock().unwrap().push(taxid.to_string());
        self.organism
            .clone()
            .map_err(|message| KiraError::TaxonLookup {
                taxid: taxid.to_string(),
                message,
            })
    }

    fn search(&self, _db: &str, term: &str) -> Result<EsearchReply, KiraError> {
        self.searches.lock().unwrap().push(term.to_string());
        if let Some(message) = &self.search_error {
            return Err(KiraError::NcbiStatus {
                status: 503,
                message: message.clone(),
            });
        }
        Ok(EsearchReply {
            count: self.count,
            web_env: Some("MCID_mock".to_string()),
            query_key: Some("1".to_string()),
        })
    }

    fn fetch_page(&self, _db: &str, page: PageRequest<'_>) -> Result<String, KiraError> {
        let mut fetches = self.fetches.lock().unwrap();
        let index = fetches.len();
        fetches.push(FetchCall {
            start: page.start,
            max: page.max,
        });
        match self.pages.get(index) {
            Some(Some(payload)) => Ok(payload.clone()),
            Some(None) => Err(KiraError::NcbiHttp("connection reset".to_string())),
            None => Ok(String::new()),
        }
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    pub events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|event| event.message.clone())
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn event(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}
