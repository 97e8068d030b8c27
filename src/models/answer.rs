// src/models/answer.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::question::QuestionDefinition;

/// Identity fields collected on the static supplier/product step. They are
/// written to their own tables and skipped when creating Answer records.
pub const SUPPLIER_FIELDS: [&str; 5] = [
    "prenom_fournisseur",
    "nom_fournisseur",
    "email_fournisseur",
    "entreprise_fournisseur",
    "siret_fournisseur",
];

pub const PRODUCT_FIELDS: [&str; 2] = ["nom_produit", "description_produit"];

/// Stamped by the client at submit time; never stored as an Answer record.
pub const TIMESTAMP_FIELD: &str = "timestamp_soumission";

/// True for every answer key handled by the Supplier/Product creation
/// steps rather than the Answers table.
pub fn is_fixed_field(key: &str) -> bool {
    key == TIMESTAMP_FIELD
        || SUPPLIER_FIELDS.contains(&key)
        || PRODUCT_FIELDS.contains(&key)
}

/// An answer is a single string, or an ordered sequence for checkbox
/// groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Many(Vec<String>),
}

impl AnswerValue {
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::Many(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }

    /// Flattens the value to the single string stored in the Answers
    /// table and shown in the summary.
    pub fn joined(&self) -> String {
        match self {
            AnswerValue::Text(s) => s.clone(),
            AnswerValue::Many(items) => items.join(", "),
        }
    }

}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        AnswerValue::Text(s.to_string())
    }
}

/// Flat mapping from indicator key to answer value, built one step at a
/// time. BTreeMap keeps iteration deterministic across runs.
pub type AnswerMap = BTreeMap<String, AnswerValue>;

/// The wire format sent once, at final submit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(alias = "formData")]
    pub answers: AnswerMap,
    #[serde(
        rename = "questionDefinitions",
        alias = "dynamicQuestions",
        default
    )]
    pub question_definitions: Vec<QuestionDefinition>,
}

/// Successful submission response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub message: String,
    pub supplier_id: String,
    pub product_id: String,
    pub score_id: String,
    pub total_usage_cost_a: f64,
    pub total_usage_cost_b: f64,
}
