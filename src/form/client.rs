// src/form/client.rs

use std::fmt;

use serde_json::Value;
use url::Url;

use crate::models::answer::{SubmissionPayload, SubmissionReceipt};
use crate::models::question::QuestionDefinition;

/// Failures the form session turns into status-line text. All of them are
/// display-only: the session state survives every variant.
#[derive(Debug)]
pub enum FormError {
    /// Transport failure (DNS, refused connection, timeout).
    Network(String),
    /// Catalog endpoint answered with a non-success status.
    Http(u16),
    /// Response body had an unexpected shape: not a question array (nor
    /// `{questions, ...}`), or a success body missing the receipt fields.
    Malformed,
    /// The server refused the submission and provided a message.
    Rejected(String),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::Network(detail) => write!(f, "network error: {detail}"),
            FormError::Http(status) => write!(f, "HTTP error! status: {status}"),
            FormError::Malformed => write!(f, "unexpected catalog structure"),
            FormError::Rejected(message) => write!(f, "submission rejected: {message}"),
        }
    }
}

impl std::error::Error for FormError {}

/// HTTP side of the form: fetches the question catalog and posts the
/// final payload to the configured endpoints.
#[derive(Debug, Clone)]
pub struct FormClient {
    http: reqwest::Client,
    questions_url: Url,
    submit_url: Url,
}

impl FormClient {
    pub fn new(questions_url: Url, submit_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            questions_url,
            submit_url,
        }
    }

    pub fn from_endpoints(
        questions_url: &str,
        submit_url: &str,
    ) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(questions_url)?, Url::parse(submit_url)?))
    }

    /// Fetches and parses the question catalog. Later catalog revisions
    /// wrap the array in `{questions, intros}`; both shapes are accepted.
    pub async fn fetch_questions(&self) -> Result<Vec<QuestionDefinition>, FormError> {
        let response = self
            .http
            .get(self.questions_url.clone())
            .send()
            .await
            .map_err(|e| FormError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FormError::Http(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|_| FormError::Malformed)?;

        let items = match &body {
            Value::Array(items) => items.as_slice(),
            Value::Object(map) => match map.get("questions") {
                Some(Value::Array(items)) => items.as_slice(),
                _ => return Err(FormError::Malformed),
            },
            _ => return Err(FormError::Malformed),
        };

        let questions = items
            .iter()
            .filter_map(|item| {
                serde_json::from_value::<QuestionDefinition>(item.clone())
                    .map_err(|e| tracing::warn!("Skipping unreadable question: {}", e))
                    .ok()
            })
            .collect();
        Ok(questions)
    }

    /// Posts the submission payload. A success response parses into the
    /// typed receipt; a non-success response surfaces the server's
    /// `{message}` (or a generic fallback) as `Rejected`.
    pub async fn send(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, FormError> {
        let response = self
            .http
            .post(self.submit_url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| FormError::Network(e.to_string()))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            serde_json::from_value(body).map_err(|_| FormError::Malformed)
        } else {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Une erreur inconnue est survenue.")
                .to_string();
            Err(FormError::Rejected(message))
        }
    }
}
