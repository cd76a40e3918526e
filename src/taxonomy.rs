use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::TaxonId;
use crate::error::EmlError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonRecord {
    pub id: TaxonId,
    pub rank: String,
    pub unit_names: Vec<String>,
    pub english_name: Option<String>,
    pub code: String,
}

impl TaxonRecord {
    /// Unit names joined into the composite scientific name.
    pub fn scientific_name(&self) -> String {
        self.unit_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Resolves taxon ids to taxonomic records.
///
/// Implementations may return fewer records than requested; ids without a
/// match are simply absent from the result.
pub trait TaxonomyClient: Send + Sync {
    fn lookup(&self, ids: &[TaxonId]) -> Result<Vec<TaxonRecord>, EmlError>;
}

impl<T: TaxonomyClient + ?Sized> TaxonomyClient for Box<T> {
    fn lookup(&self, ids: &[TaxonId]) -> Result<Vec<TaxonRecord>, EmlError> {
        (**self).lookup(ids)
    }
}

/// Client used when no taxonomy service is configured. Matches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTaxonomyClient;

impl TaxonomyClient for OfflineTaxonomyClient {
    fn lookup(&self, ids: &[TaxonId]) -> Result<Vec<TaxonRecord>, EmlError> {
        if !ids.is_empty() {
            warn!(
                requested = ids.len(),
                "no taxonomy service configured; taxonomic coverage omitted"
            );
        }
        Ok(Vec::new())
    }
}

#[derive(Clone)]
pub struct TaxonomyHttpClient {
    client: Client,
    base_url: String,
}

impl TaxonomyHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EmlError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("emlc/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| EmlError::TaxonomyHttp(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| EmlError::TaxonomyHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn species_url(&self, ids: &[TaxonId]) -> String {
        let ids = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        format!("{}/taxonomy/species?ids={ids}", self.base_url)
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, EmlError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            match make_req().send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        debug!(status, attempt, "retrying taxonomy request");
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        std::thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        debug!(error = %err, attempt, "retrying taxonomy request");
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        std::thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(EmlError::TaxonomyHttp(err.to_string()));
                }
            }
        }
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, EmlError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "taxonomy request failed".to_string());
        Err(EmlError::TaxonomyStatus { status, message })
    }
}

impl TaxonomyClient for TaxonomyHttpClient {
    fn lookup(&self, ids: &[TaxonId]) -> Result<Vec<TaxonRecord>, EmlError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.species_url(ids);
        let response = self.send_with_retries(|| self.client.get(&url))?;
        let response = Self::handle_status(response)?;
        let raw: Value = response
            .json()
            .map_err(|err| EmlError::TaxonomyHttp(err.to_string()))?;
        extract_taxon_records(&raw)
    }
}

/// Maps a taxonomy search response into records.
///
/// Accepts either a bare array or an object with a `hits` array. Each hit
/// may wrap its fields in `_source` with the id in `_id`. Hits lacking an id
/// or code are skipped; a body with no hits array at all is an error.
pub fn extract_taxon_records(raw: &Value) -> Result<Vec<TaxonRecord>, EmlError> {
    let hits = raw
        .as_array()
        .or_else(|| raw.get("hits").and_then(|v| v.as_array()))
        .or_else(|| {
            raw.get("hits")
                .and_then(|v| v.get("hits"))
                .and_then(|v| v.as_array())
        });
    let Some(hits) = hits else {
        warn!("taxonomy response had no hits array");
        return Err(EmlError::TaxonomyHttp(
            "unexpected taxonomy response shape".to_string(),
        ));
    };

    Ok(hits
        .iter()
        .filter_map(|hit| {
            let record = extract_taxon_record(hit);
            if record.is_none() {
                debug!(hit = %hit, "skipping malformed taxonomy hit");
            }
            record
        })
        .collect())
}

fn extract_taxon_record(hit: &Value) -> Option<TaxonRecord> {
    let source = hit.get("_source").unwrap_or(hit);
    let id = hit
        .get("_id")
        .or_else(|| source.get("id"))
        .and_then(|v| match v {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.parse().ok(),
            _ => None,
        })?;
    let code = source.get("code").and_then(|v| v.as_str())?.to_string();
    let text = |key: &str| {
        source
            .get(key)
            .and_then(|v| v.as_str())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let unit_names = ["unit_name1", "unit_name2", "unit_name3"]
        .into_iter()
        .filter_map(text)
        .collect();

    Some(TaxonRecord {
        id: TaxonId::new(id),
        rank: text("tty_name").unwrap_or_default(),
        unit_names,
        english_name: text("english_name"),
        code,
    })
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
