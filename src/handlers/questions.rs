// src/handlers/questions.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::Value;

use crate::{
    config::require_table,
    error::AppError,
    models::question::{QuestionDefinition, normalize_catalog},
    state::AppState,
};

/// Serves the question catalog that drives both form rendering and score
/// computation.
///
/// Records come back from Airtable with the raw column names
/// (`ID_questions`, `etape_questions`, `Titre_questions`, ...); lenient
/// deserialization on `QuestionDefinition` normalizes them, and
/// `normalize_catalog` drops anything missing an essential field before
/// sorting by (stage, order).
pub async fn get_questions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let table = require_table(
        &state.config.questions_table,
        "AIRTABLE_QUESTIONS_TABLE_NAME",
    )?;

    let records = state
        .airtable
        .list_records(table, &[("etape_questions", "asc"), ("ordre", "asc")])
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch question records: {}", e);
            e
        })?;

    let raw: Vec<QuestionDefinition> = records
        .into_iter()
        .filter_map(|record| {
            serde_json::from_value::<QuestionDefinition>(Value::Object(record.fields))
                .map_err(|e| {
                    tracing::warn!(record_id = %record.id, "Unreadable question record: {}", e)
                })
                .ok()
        })
        .collect();

    let catalog = normalize_catalog(raw);
    tracing::info!(count = catalog.len(), "Serving question catalog");

    Ok(Json(catalog))
}
