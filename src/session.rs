use tracing::{info, warn};

use crate::domain::{SearchOutcome, SearchResult, SessionHandle, TaxId};
use crate::error::KiraError;
use crate::ncbi::{EntrezClient, NUCLEOTIDE_DB};

/// Owns the Entrez client for a run and performs the search phase.
pub struct RemoteSession<C: EntrezClient> {
    client: C,
}

impl<C: EntrezClient> RemoteSession<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Resolves the organism, then searches nucleotide records under it with
    /// the history server on. Zero hits is `NotFound`, not an error.
    pub fn search(&self, taxid: &TaxId) -> Result<SearchOutcome, KiraError> {
        info!(%taxid, "searching nucleotide records");
        if !taxid.is_numeric() {
            return Err(KiraError::TaxonLookup {
                taxid: taxid.to_string(),
                message: "not a numeric taxonomy id".to_string(),
            });
        }
        let organism_name = self.client.lookup_organism(taxid)?;
        info!(%taxid, organism = %organism_name, "resolved organism");

        let reply = self.client.search(NUCLEOTIDE_DB, &taxid.organism_term())?;
        info!(%taxid, count = reply.count, "search finished");
        if reply.count == 0 {
            return Ok(SearchOutcome::NotFound { organism_name });
        }

        let (Some(web_env), Some(query_key)) = (reply.web_env, reply.query_key) else {
            warn!(%taxid, "search reply carries no history tokens");
            return Err(KiraError::NcbiPayload(
                "esearch reply is missing WebEnv or QueryKey".to_string(),
            ));
        };

        Ok(SearchOutcome::Found(SearchResult {
            taxid: taxid.clone(),
            organism_name,
            total_count: reply.count,
            handle: SessionHandle { web_env, query_key },
        }))
    }
}
