// src/airtable.rs

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::config::Config;
use crate::error::AppError;

/// Thin client for the Airtable records REST API.
///
/// One instance is shared through the app state; `reqwest::Client` is
/// internally pooled so cloning is cheap.
#[derive(Clone)]
pub struct AirtableClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

/// A record as returned by Airtable.
#[derive(Debug, Clone, Deserialize)]
pub struct AirtableRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    records: Vec<AirtableRecord>,
}

#[derive(Serialize)]
struct CreateRequest {
    records: Vec<CreateRecord>,
    /// Lets Airtable coerce values to the column type (e.g. "123" into a
    /// number column), matching how the form always submits strings.
    typecast: bool,
}

#[derive(Serialize)]
struct CreateRecord {
    fields: Map<String, Value>,
}

impl AirtableClient {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let mut base_url = Url::parse(&config.airtable_api_url).map_err(|e| {
            AppError::Config(format!(
                "AIRTABLE_API_URL is not a valid URL: {e}"
            ))
        })?;
        base_url
            .path_segments_mut()
            .map_err(|_| AppError::Config("AIRTABLE_API_URL cannot be a base".into()))?
            .pop_if_empty()
            .push(&config.airtable_base_id);

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: config.airtable_api_key.clone(),
        })
    }

    /// URL for a table, with the table name percent-encoded (names often
    /// contain spaces or accents).
    fn table_url(&self, table: &str) -> Url {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .expect("base url validated at construction")
            .push(table);
        url
    }

    /// Lists the first page of records, sorted by the given fields.
    pub async fn list_records(
        &self,
        table: &str,
        sort: &[(&str, &str)],
    ) -> Result<Vec<AirtableRecord>, AppError> {
        let mut url = self.table_url(table);
        {
            let mut query = url.query_pairs_mut();
            for (i, (field, direction)) in sort.iter().enumerate() {
                query.append_pair(&format!("sort[{i}][field]"), field);
                query.append_pair(&format!("sort[{i}][direction]"), direction);
            }
        }

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(upstream_message(status, &body)));
        }

        let page: RecordPage = response.json().await?;
        Ok(page.records)
    }

    /// Creates records in one call and returns their ids, in order.
    /// The caller is responsible for staying under the 10-record batch
    /// limit.
    pub async fn create_records(
        &self,
        table: &str,
        batch: Vec<Map<String, Value>>,
    ) -> Result<Vec<String>, AppError> {
        let body = CreateRequest {
            records: batch
                .into_iter()
                .map(|fields| CreateRecord { fields })
                .collect(),
            typecast: true,
        };

        let response = self
            .http
            .post(self.table_url(table))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(upstream_message(status, &text)));
        }

        let page: RecordPage = response.json().await?;
        Ok(page.records.into_iter().map(|r| r.id).collect())
    }

    /// Creates a single record and returns its id.
    pub async fn create_record(
        &self,
        table: &str,
        fields: Map<String, Value>,
    ) -> Result<String, AppError> {
        let ids = self.create_records(table, vec![fields]).await?;
        ids.into_iter().next().ok_or_else(|| {
            AppError::Upstream("Airtable returned no record id".to_string())
        })
    }
}

/// Pulls the human-readable message out of an Airtable error body, which
/// is either `{"error": {"message": ...}}` or `{"error": "..."}`.
fn upstream_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        let err = v.get("error")?;
        err.get("message")
            .and_then(Value::as_str)
            .or_else(|| err.as_str())
            .map(str::to_string)
    });
    message.unwrap_or_else(|| format!("Airtable responded with status {status}"))
}
