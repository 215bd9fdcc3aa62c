//! # Result Merger
//!
//! Attaches records fetched from another service to the rows of a page.
//!
//! The distinct values of `local_key` across the page are sent in one
//! `GET {endpoint}?ids[0]=a&ids[1]=b` request, the indexed form PHP and
//! Laravel services decode into an `ids` array. Each remote record is matched to
//! rows through its `remote_key` field and stored under `result_key`; rows
//! without a match get `null`.
//!
//! Enrichment never fails a request. If the transport errors or the body is
//! not a list of records, the page is returned exactly as it was.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::config::EnrichmentConfig;
use crate::errors::{DataTableError, Result};
use crate::filtering::filters::is_zero;
use crate::pagination::{PageResponse, PageResult};

/// Fetches related records for a set of ids.
#[async_trait]
pub trait EnrichmentTransport: Send + Sync {
    async fn fetch(&self, endpoint: &str, ids: &[String]) -> Result<Value>;
}

/// [`EnrichmentTransport`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    headers: HeaderMap,
}

impl HttpTransport {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            headers: HeaderMap::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &EnrichmentConfig) -> Self {
        Self::new(config.timeout)
    }

    /// Headers sent with every request, typically the caller's credentials.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

#[async_trait]
impl EnrichmentTransport for HttpTransport {
    async fn fetch(&self, endpoint: &str, ids: &[String]) -> Result<Value> {
        let query: Vec<(String, &str)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (format!("ids[{i}]"), id.as_str()))
            .collect();

        let response = self
            .client
            .get(endpoint)
            .headers(self.headers.clone())
            .query(&query)
            .send()
            .await
            .map_err(|e| DataTableError::remote_enrichment(format!("request failed: {e}")))?
            .error_for_status()
            .map_err(|e| DataTableError::remote_enrichment(format!("bad status: {e}")))?;

        response
            .json::<Value>()
            .await
            .map_err(|e| DataTableError::remote_enrichment(format!("invalid body: {e}")))
    }
}

/// String form used to compare local and remote ids, so `7` matches `"7"`.
///
/// `null`, `false`, `""`, `0`, `"0"` and nested values have no key.
fn canonical_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() && s != "0" => Some(s.clone()),
        Value::Number(n) if !is_zero(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Distinct row keys in first-seen order.
fn collect_ids(rows: &[Value], local_key: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| row.get(local_key).and_then(canonical_key))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Index remote records by `remote_key`. Later records win on duplicates.
fn index_remote(body: Value, remote_key: &str) -> Result<HashMap<String, Value>> {
    let records: Vec<Value> = match body {
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        other => {
            return Err(DataTableError::remote_enrichment(format!(
                "expected a list of records, got {other}"
            )));
        }
    };

    let mut index = HashMap::with_capacity(records.len());
    for record in records {
        if !record.is_object() {
            continue;
        }
        let Some(key) = record.get(remote_key).and_then(canonical_key) else {
            continue;
        };
        index.insert(key, record);
    }
    Ok(index)
}

fn attach(rows: &mut [Value], local_key: &str, result_key: &str, index: &HashMap<String, Value>) {
    for row in rows.iter_mut() {
        let Value::Object(fields) = row else {
            continue;
        };
        let matched = fields
            .get(local_key)
            .and_then(canonical_key)
            .and_then(|id| index.get(&id).cloned())
            .unwrap_or(Value::Null);
        fields.insert(result_key.to_string(), matched);
    }
}

/// Enrich rows in place. Rows are only touched once the remote side answered
/// with something usable.
async fn merge_rows<T>(rows: &mut [Value], transport: &T, config: &EnrichmentConfig)
where
    T: EnrichmentTransport + ?Sized,
{
    if rows.is_empty() || config.local_key.is_empty() {
        return;
    }

    let ids = collect_ids(rows, &config.local_key);
    if ids.is_empty() {
        attach(rows, &config.local_key, &config.result_key, &HashMap::new());
        return;
    }

    let index = match transport.fetch(&config.endpoint, &ids).await {
        Ok(body) => index_remote(body, &config.remote_key),
        Err(err) => Err(err),
    };

    match index {
        Ok(index) => {
            tracing::debug!(
                endpoint = %config.endpoint,
                requested = ids.len(),
                received = index.len(),
                "Merged remote records"
            );
            attach(rows, &config.local_key, &config.result_key, &index);
        }
        Err(err) => {
            tracing::warn!(
                endpoint = %config.endpoint,
                error = %err,
                "Enrichment failed, returning page without related records"
            );
        }
    }
}

/// Attach remote records to every row of a custom-mode page.
pub async fn merge_response_data<T>(
    mut page: PageResult<Value>,
    transport: &T,
    config: &EnrichmentConfig,
) -> PageResult<Value>
where
    T: EnrichmentTransport + ?Sized,
{
    merge_rows(&mut page.data, transport, config).await;
    page
}

/// [`merge_response_data`] for either envelope.
pub async fn merge_page_response<T>(
    mut page: PageResponse<Value>,
    transport: &T,
    config: &EnrichmentConfig,
) -> PageResponse<Value>
where
    T: EnrichmentTransport + ?Sized,
{
    let rows = match &mut page {
        PageResponse::Custom(p) => &mut p.data,
        PageResponse::Standard(p) => &mut p.data,
    };
    merge_rows(rows, transport, config).await;
    page
}
