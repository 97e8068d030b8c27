// src/config.rs

use crate::error::AppError;
use dotenvy::dotenv;
use std::env;

/// Airtable batch API accepts at most 10 records per create call.
pub const AIRTABLE_BATCH_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Airtable REST endpoint. Overridable so tests can point at a mock.
    pub airtable_api_url: String,
    pub airtable_api_key: String,
    pub airtable_base_id: String,

    /// Table names are optional at startup: a missing one surfaces as a
    /// configuration error on the request that needs it, not at boot.
    pub questions_table: Option<String>,
    pub supplier_table: Option<String>,
    pub product_table: Option<String>,
    pub answers_table: Option<String>,
    pub score_table: Option<String>,

    /// Origin allowed by the CORS layer (the storefront embedding the form).
    pub allowed_origin: String,

    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let airtable_api_url = env::var("AIRTABLE_API_URL")
            .unwrap_or_else(|_| "https://api.airtable.com/v0".to_string());

        let airtable_api_key = env::var("AIRTABLE_API_KEY")
            .expect("AIRTABLE_API_KEY must be set");

        let airtable_base_id = env::var("AIRTABLE_BASE_ID")
            .expect("AIRTABLE_BASE_ID must be set");

        let allowed_origin = env::var("ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            airtable_api_url,
            airtable_api_key,
            airtable_base_id,
            questions_table: env::var("AIRTABLE_QUESTIONS_TABLE_NAME").ok(),
            supplier_table: env::var("AIRTABLE_SUPPLIER_TABLE_NAME").ok(),
            product_table: env::var("AIRTABLE_PRODUCT_TABLE_NAME").ok(),
            answers_table: env::var("AIRTABLE_ANSWERS_TABLE_NAME").ok(),
            score_table: env::var("AIRTABLE_SCORE_TABLE_NAME").ok(),
            allowed_origin,
            rust_log,
        }
    }

}

/// Resolves a table name or fails with a configuration error naming
/// the missing variable (logged server-side only).
pub fn require_table<'a>(
    name: &'a Option<String>,
    env_var: &str,
) -> Result<&'a str, AppError> {
    name.as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Config(format!("{} is not set", env_var)))
}
