// src/handlers/submission.rs

use std::collections::HashMap;

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::{Map, Value, json};

use crate::{
    config::{AIRTABLE_BATCH_LIMIT, require_table},
    error::AppError,
    models::answer::{
        AnswerMap, PRODUCT_FIELDS, SUPPLIER_FIELDS, SubmissionPayload, is_fixed_field,
    },
    models::question::QuestionDefinition,
    models::score::ScoreSheet,
    scoring,
    state::AppState,
};

/// Receives the final form payload and persists it as one Supplier, one
/// Product, a batch of Answers and one Score record, strictly in that
/// order. Any create failure aborts the remaining steps; records already
/// written are not rolled back (a known, logged gap).
pub async fn submit_form(
    State(state): State<AppState>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    // The body is parsed by hand so shape failures produce the structured
    // `{message}` error the form displays, before any external I/O.
    let payload: SubmissionPayload = serde_json::from_str(&body).map_err(|e| {
        tracing::warn!("Rejecting unparseable submission body: {}", e);
        AppError::BadRequest("Le JSON n'a pas pu être parsé.".to_string())
    })?;

    if payload.answers.is_empty() {
        return Err(AppError::BadRequest(
            "Données du formulaire manquantes.".to_string(),
        ));
    }
    if payload.question_definitions.is_empty() {
        tracing::warn!(
            "Submission carries no question definitions; answers cannot be \
             linked and the score will be all-zero"
        );
    }

    // All table names are resolved before the first write so a
    // configuration gap cannot leave a partial record set behind.
    let config = &state.config;
    let supplier_table = require_table(&config.supplier_table, "AIRTABLE_SUPPLIER_TABLE_NAME")?;
    let product_table = require_table(&config.product_table, "AIRTABLE_PRODUCT_TABLE_NAME")?;
    let answers_table = require_table(&config.answers_table, "AIRTABLE_ANSWERS_TABLE_NAME")?;
    let score_table = require_table(&config.score_table, "AIRTABLE_SCORE_TABLE_NAME")?;

    // 1. Supplier record from the fixed identity fields.
    let supplier_id = state
        .airtable
        .create_record(supplier_table, identity_fields(&payload.answers, &SUPPLIER_FIELDS))
        .await?;
    tracing::info!(%supplier_id, "Supplier record created");

    // 2. Product record, linked to the supplier.
    let mut product_fields = identity_fields(&payload.answers, &PRODUCT_FIELDS);
    product_fields.insert("ID_fournisseur".to_string(), json!([supplier_id]));
    let product_id = state
        .airtable
        .create_record(product_table, product_fields)
        .await?;
    tracing::info!(%product_id, "Product record created");

    // 3. Indicator totals and usage costs. Never fails; bad inputs
    // degrade to zero contributions.
    let sheet = scoring::compute(&payload.answers, &payload.question_definitions);

    // 4. One Answer record per non-blank, catalog-matched entry, in
    // batches bounded by the Airtable API limit.
    let answer_records =
        answer_records(&payload.answers, &payload.question_definitions, &product_id);
    let answer_count = answer_records.len();
    for batch in answer_records.chunks(AIRTABLE_BATCH_LIMIT) {
        state
            .airtable
            .create_records(answers_table, batch.to_vec())
            .await?;
    }
    tracing::info!(count = answer_count, "Answer records created");

    // 5. Score record aggregating everything computed above.
    let score_id = state
        .airtable
        .create_record(score_table, score_fields(&sheet, &product_id))
        .await?;
    tracing::info!(%score_id, "Score record created");

    Ok(Json(json!({
        "message": "Informations (Fournisseur, Produit, Réponses, Score) envoyées avec succès !",
        "supplierId": supplier_id,
        "productId": product_id,
        "scoreId": score_id,
        "totalUsageCostA": sheet.total_usage_cost_a,
        "totalUsageCostB": sheet.total_usage_cost_b,
    })))
}

/// Copies the present identity fields out of the answers map. Absent
/// fields are omitted rather than written as empty strings.
fn identity_fields(answers: &AnswerMap, keys: &[&str]) -> Map<String, Value> {
    let mut fields = Map::new();
    for key in keys {
        if let Some(value) = answers.get(*key) {
            fields.insert(key.to_string(), Value::String(value.joined()));
        }
    }
    fields
}

/// Builds the Answers-table rows: every non-fixed, non-blank answer with a
/// usable matching definition, linked to the product and its question.
fn answer_records(
    answers: &AnswerMap,
    definitions: &[QuestionDefinition],
    product_id: &str,
) -> Vec<Map<String, Value>> {
    let lookup: HashMap<&str, &QuestionDefinition> = definitions
        .iter()
        .filter(|q| !q.indicator.is_empty())
        .map(|q| (q.indicator.as_str(), q))
        .collect();

    let mut records = Vec::new();
    for (key, value) in answers {
        if is_fixed_field(key) {
            continue;
        }
        let Some(def) = lookup.get(key.as_str()).filter(|d| !d.id.is_empty()) else {
            tracing::warn!(key = %key, "No question id for this answer; not stored");
            continue;
        };
        if value.is_blank() {
            tracing::warn!(key = %key, "Blank answer; not stored");
            continue;
        }

        let mut fields = Map::new();
        fields.insert("ID_produit".to_string(), json!([product_id]));
        fields.insert("ID_questions".to_string(), json!([def.id]));
        fields.insert("Réponse".to_string(), Value::String(value.joined()));
        records.push(fields);
    }
    records
}

/// Flattens the score sheet into the Score-table row: the fourteen
/// category totals, the distinguished measures and the usage costs.
fn score_fields(sheet: &ScoreSheet, product_id: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("ID_produit".to_string(), json!([product_id]));

    for (category, total) in sheet.indicators() {
        fields.insert(category.to_string(), json!(total));
    }
    for (key, measure) in &sheet.measures {
        fields.insert(
            key.clone(),
            serde_json::to_value(measure).unwrap_or(Value::Null),
        );
    }
    fields.insert("CoutUsageA".to_string(), json!(sheet.total_usage_cost_a));
    fields.insert("CoutUsageB".to_string(), json!(sheet.total_usage_cost_b));
    fields
}
