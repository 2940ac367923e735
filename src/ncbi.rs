use std::sync::LazyLock;
use std::thread;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::config::EntrezConfig;
use crate::domain::{SessionHandle, TaxId};
use crate::error::KiraError;

pub const NUCLEOTIDE_DB: &str = "nucleotide";

/// Reply of `esearch` with the history server enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsearchReply {
    pub count: usize,
    pub web_env: Option<String>,
    pub query_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<'a> {
    pub handle: &'a SessionHandle,
    pub start: usize,
    pub max: usize,
}

/// The three E-utilities calls the survey needs.
pub trait EntrezClient: Send + Sync {
    fn lookup_organism(&self, taxid: &TaxId) -> Result<String, KiraError>;
    fn search(&self, db: &str, term: &str) -> Result<EsearchReply, KiraError>;
    /// Raw GenBank flat-file text for one page of the cached result set.
    fn fetch_page(&self, db: &str, page: PageRequest<'_>) -> Result<String, KiraError>;
}

impl<C: EntrezClient + ?Sized> EntrezClient for &C {
    fn lookup_organism(&self, taxid: &TaxId) -> Result<String, KiraError> {
        (**self).lookup_organism(taxid)
    }

    fn search(&self, db: &str, term: &str) -> Result<EsearchReply, KiraError> {
        (**self).search(db, term)
    }

    fn fetch_page(&self, db: &str, page: PageRequest<'_>) -> Result<String, KiraError> {
        (**self).fetch_page(db, page)
    }
}

#[derive(Clone)]
pub struct EntrezHttpClient {
    client: Client,
    config: EntrezConfig,
}

impl EntrezHttpClient {
    pub fn new(config: EntrezConfig) -> Result<Self, KiraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-ts/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KiraError::NcbiHttp(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| KiraError::NcbiHttp(err.to_string()))?;

        Ok(Self { client, config })
    }

    fn get_text(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String, KiraError> {
        let url = format!("{}/{endpoint}", self.config.base_url);
        let identity = self.config.identity_params();
        let response = self.send_with_retries(|| {
            self.client
                .get(&url)
                .query(params)
                .query(&identity)
        })?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "NCBI request failed".to_string());
            return Err(KiraError::NcbiStatus { status, message });
        }
        response
            .text()
            .map_err(|err| KiraError::NcbiHttp(err.to_string()))
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, KiraError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 400;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        tracing::debug!(status, attempt, "retrying NCBI request");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        tracing::debug!(error = %err, attempt, "retrying NCBI request");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(KiraError::NcbiHttp(err.to_string()));
                }
            }
        }
    }
}

impl EntrezClient for EntrezHttpClient {
    fn lookup_organism(&self, taxid: &TaxId) -> Result<String, KiraError> {
        let xml = self
            .get_text(
                "efetch.fcgi",
                &[
                    ("db", "taxonomy".to_string()),
                    ("id", taxid.as_str().to_string()),
                    ("retmode", "xml".to_string()),
                ],
            )
            .map_err(|err| KiraError::TaxonLookup {
                taxid: taxid.to_string(),
                message: err.to_string(),
            })?;
        parse_taxonomy_name(&xml).map_err(|message| KiraError::TaxonLookup {
            taxid: taxid.to_string(),
            message,
        })
    }

    fn search(&self, db: &str, term: &str) -> Result<EsearchReply, KiraError> {
        let body = self.get_text(
            "esearch.fcgi",
            &[
                ("db", db.to_string()),
                ("term", term.to_string()),
                ("usehistory", "y".to_string()),
                ("retmax", "0".to_string()),
                ("retmode", "json".to_string()),
            ],
        )?;
        let payload: Value =
            serde_json::from_str(&body).map_err(|err| KiraError::NcbiPayload(err.to_string()))?;
        parse_esearch(&payload)
    }

    fn fetch_page(&self, db: &str, page: PageRequest<'_>) -> Result<String, KiraError> {
        self.get_text(
            "efetch.fcgi",
            &[
                ("db", db.to_string()),
                ("rettype", "gb".to_string()),
                ("retmode", "text".to_string()),
                ("retstart", page.start.to_string()),
                ("retmax", page.max.to_string()),
                ("WebEnv", page.handle.web_env.clone()),
                ("query_key", page.handle.query_key.clone()),
            ],
        )
    }
}

static SCIENTIFIC_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<ScientificName>([^<]*)</ScientificName>").unwrap());
static ERROR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<ERROR>([^<]*)</ERROR>").unwrap());

/// First `<ScientificName>` of a taxonomy `efetch` document; later ones belong
/// to the lineage.
pub fn parse_taxonomy_name(xml: &str) -> Result<String, String> {
    if let Some(cap) = ERROR_RE.captures(xml) {
        return Err(decode_xml_entities(cap[1].trim()));
    }
    SCIENTIFIC_NAME_RE
        .captures(xml)
        .map(|cap| decode_xml_entities(cap[1].trim()))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| "taxon not found".to_string())
}

pub fn parse_esearch(payload: &Value) -> Result<EsearchReply, KiraError> {
    if let Some(message) = payload["error"].as_str() {
        return Err(KiraError::NcbiPayload(message.to_string()));
    }
    let result = &payload["esearchresult"];
    if let Some(message) = result["ERROR"].as_str() {
        return Err(KiraError::NcbiPayload(message.to_string()));
    }
    let count = match &result["count"] {
        Value::String(raw) => raw.parse::<usize>().ok(),
        Value::Number(num) => num.as_u64().map(|n| n as usize),
        _ => None,
    }
    .ok_or_else(|| KiraError::NcbiPayload("esearch reply has no count".to_string()))?;

    let text = |key: &str| {
        result[key]
            .as_str()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    Ok(EsearchReply {
        count,
        web_env: text("webenv"),
        query_key: text("querykey"),
    })
}

fn decode_xml_entities(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_name_ignores_lineage() {
        let xml = r#"<TaxaSet><Taxon><TaxId>9606</TaxId>
            <ScientificName>Homo sapiens</ScientificName>
            <LineageEx><Taxon><ScientificName>cellular organisms</ScientificName></Taxon></LineageEx>
            </Taxon></TaxaSet>"#;
        assert_eq!(parse_taxonomy_name(xml).unwrap(), "Homo sapiens");
    }

    #[test]
    fn taxonomy_error_payload() {
        let xml = "<eFetchResult><ERROR>ID list is empty! Possibly it has no correct IDs.</ERROR></eFetchResult>";
        let err = parse_taxonomy_name(xml).unwrap_err();
        assert!(err.starts_with("ID list is empty"));
        assert_eq!(parse_taxonomy_name("<TaxaSet></TaxaSet>").unwrap_err(), "taxon not found");
    }
}
