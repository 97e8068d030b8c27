// src/models/question.rs

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::utils::num::number_from_value;

/// The closed set of input kinds a question can render as.
///
/// Kept as a tagged variant (not a free string) so an unhandled kind is a
/// visible gap with an explicit fallback case instead of a silent branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    SingleLineText,
    Email,
    Number,
    MultilineText,
    SingleSelect,
    Checkbox,
    Date,
    Unknown(String),
}

impl InputKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "singleLineText" => InputKind::SingleLineText,
            "email" => InputKind::Email,
            "number" => InputKind::Number,
            "multilineText" => InputKind::MultilineText,
            // Both tags appear across catalog revisions.
            "singleSelect" | "radio" => InputKind::SingleSelect,
            "checkbox" | "multiSelect" => InputKind::Checkbox,
            "date" => InputKind::Date,
            other => InputKind::Unknown(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            InputKind::SingleLineText => "singleLineText",
            InputKind::Email => "email",
            InputKind::Number => "number",
            InputKind::MultilineText => "multilineText",
            InputKind::SingleSelect => "singleSelect",
            InputKind::Checkbox => "checkbox",
            InputKind::Date => "date",
            InputKind::Unknown(tag) => tag,
        }
    }
}

/// One form question, as served by the catalog endpoint and echoed back in
/// the submission payload.
///
/// Deserialization is deliberately lenient: field names and scalar types
/// vary across catalog revisions (numbers arrive as numeric strings,
/// options as a comma-joined string), so everything is normalized on
/// ingestion and nothing short of invalid JSON fails the whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDefinition {
    #[serde(
        rename = "id_question",
        alias = "ID_questions",
        default,
        deserialize_with = "de_lenient_string"
    )]
    pub id: String,

    /// Groups questions into one rendered form step; ordering key.
    #[serde(
        rename = "etape",
        alias = "etape_questions",
        default,
        deserialize_with = "de_lenient_int"
    )]
    pub stage: Option<i64>,

    /// The key used both as rendered input name and in the answers map.
    #[serde(
        rename = "indicateur_questions",
        default,
        deserialize_with = "de_lenient_string"
    )]
    pub indicator: String,

    #[serde(
        rename = "titre",
        alias = "Titre_questions",
        default,
        deserialize_with = "de_lenient_string"
    )]
    pub title: String,

    #[serde(
        rename = "type_questions",
        default,
        deserialize_with = "de_input_kind",
        serialize_with = "ser_input_kind"
    )]
    pub input_kind: Option<InputKind>,

    #[serde(default, deserialize_with = "de_options")]
    pub options: Vec<String>,

    #[serde(default, deserialize_with = "de_lenient_string")]
    pub description: String,

    #[serde(rename = "obligatoire", default, deserialize_with = "de_lenient_bool")]
    pub required: bool,

    /// Weight multiplied into numeric answers for categorized questions.
    /// Non-numeric catalog input degrades to None; the calculator logs it.
    #[serde(
        rename = "coeff_questions",
        alias = "coef_questions",
        default,
        deserialize_with = "de_lenient_f64"
    )]
    pub coefficient: Option<f64>,

    /// Score category tag (e.g. "EmatA"). Unknown tags round-trip as-is.
    #[serde(
        rename = "categorie_questions",
        default,
        deserialize_with = "de_lenient_string"
    )]
    pub category: String,

    /// Tie-break ordering within a stage.
    #[serde(rename = "ordre", default, deserialize_with = "de_lenient_order")]
    pub order: i64,

    /// Unit price for usage-cost derivation. Water questions reuse the
    /// same field; it is a generic "unit price", not energy-specific.
    #[serde(
        rename = "prix_energie",
        alias = "unitEnergyPrice",
        default,
        deserialize_with = "de_lenient_f64"
    )]
    pub unit_energy_price: Option<f64>,
}

impl QuestionDefinition {
    /// A definition is renderable/linkable only when all of its essential
    /// fields are present.
    pub fn is_usable(&self) -> bool {
        !self.id.is_empty()
            && !self.indicator.is_empty()
            && !self.title.is_empty()
            && self.input_kind.is_some()
            && self.stage.is_some()
    }
}

/// Drops unusable definitions (logged, never fatal) and sorts the rest by
/// (stage, order) ascending, numerically.
pub fn normalize_catalog(raw: Vec<QuestionDefinition>) -> Vec<QuestionDefinition> {
    let mut catalog: Vec<QuestionDefinition> = raw
        .into_iter()
        .filter(|q| {
            if q.is_usable() {
                true
            } else {
                tracing::warn!(
                    indicator = %q.indicator,
                    title = %q.title,
                    "Dropping question with missing essential fields"
                );
                false
            }
        })
        .collect();

    catalog.sort_by_key(|q| (q.stage.unwrap_or(0), q.order));
    catalog
}

fn de_lenient_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn de_lenient_int<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(lenient_int(&value))
}

fn de_lenient_order<'de, D>(de: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(lenient_int(&value).unwrap_or(0))
}

fn lenient_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

fn de_lenient_f64<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(number_from_value(&value))
}

fn de_lenient_bool<'de, D>(de: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(matches!(value, Value::Bool(true)))
}

fn de_input_kind<'de, D>(de: D) -> Result<Option<InputKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(InputKind::from_tag(s.trim())),
        _ => None,
    })
}

fn ser_input_kind<S>(kind: &Option<InputKind>, ser: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match kind {
        Some(k) => ser.serialize_str(k.as_tag()),
        None => ser.serialize_none(),
    }
}

/// Options arrive either as a JSON array or as the raw comma-joined
/// Airtable cell value.
fn de_options<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(split_options(&value))
}

pub(crate) fn split_options(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(joined) => joined
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn from_json(value: Value) -> QuestionDefinition {
        serde_json::from_value(value).expect("question should deserialize")
    }

    #[test]
    fn test_deserialize_normalizes_numeric_strings() {
        let q = from_json(json!({
            "id_question": "recq1",
            "etape": "2",
            "indicateur_questions": "MasseA",
            "titre": "Masse du produit A",
            "type_questions": "number",
            "coeff_questions": "1.5",
            "ordre": "3"
        }));

        assert_eq!(q.stage, Some(2));
        assert_eq!(q.coefficient, Some(1.5));
        assert_eq!(q.order, 3);
        assert_eq!(q.input_kind, Some(InputKind::Number));
        assert!(q.is_usable());
    }

    #[test]
    fn test_deserialize_accepts_revision_aliases() {
        let q = from_json(json!({
            "ID_questions": 42,
            "etape_questions": 1,
            "indicateur_questions": "transport",
            "Titre_questions": "Mode de transport",
            "type_questions": "radio",
            "coef_questions": 2,
            "options": "Train, Camion ,Avion"
        }));

        assert_eq!(q.id, "42");
        assert_eq!(q.input_kind, Some(InputKind::SingleSelect));
        assert_eq!(q.options, vec!["Train", "Camion", "Avion"]);
        assert_eq!(q.coefficient, Some(2.0));
    }

    #[test]
    fn test_non_numeric_coefficient_degrades_to_none() {
        let q = from_json(json!({
            "id_question": "recq2",
            "etape": 1,
            "indicateur_questions": "x",
            "titre": "t",
            "type_questions": "number",
            "coeff_questions": "beaucoup"
        }));
        assert_eq!(q.coefficient, None);
    }

    #[test]
    fn test_normalize_catalog_drops_unusable_and_sorts() {
        let raw = vec![
            from_json(json!({
                "id_question": "b",
                "etape": 2,
                "indicateur_questions": "q_b",
                "titre": "B",
                "type_questions": "number",
                "ordre": 1
            })),
            from_json(json!({
                // Missing titre: dropped.
                "id_question": "x",
                "etape": 1,
                "indicateur_questions": "q_x",
                "type_questions": "number"
            })),
            from_json(json!({
                "id_question": "a2",
                "etape": 1,
                "indicateur_questions": "q_a2",
                "titre": "A2",
                "type_questions": "number",
                "ordre": 5
            })),
            from_json(json!({
                "id_question": "a1",
                "etape": 1,
                "indicateur_questions": "q_a1",
                "titre": "A1",
                "type_questions": "number",
                "ordre": 2
            })),
            from_json(json!({
                // Stage 10 sorts after stage 2 numerically.
                "id_question": "c",
                "etape": 10,
                "indicateur_questions": "q_c",
                "titre": "C",
                "type_questions": "number"
            })),
        ];

        let catalog = normalize_catalog(raw);
        let ids: Vec<&str> = catalog.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "b", "c"]);
    }
}
