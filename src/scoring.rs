// src/scoring.rs

use std::collections::HashMap;

use crate::models::answer::AnswerMap;
use crate::models::question::QuestionDefinition;
use crate::models::score::{LifecycleStage, Measure, ScoreCategory, ScoreSheet, Side};
use crate::utils::num::parse_number;

/// Distinguished answer keys, recorded verbatim in the Score record
/// instead of being summed into a category. The trailing letter names the
/// compared product.
pub const MASS_A: &str = "MasseA";
pub const MASS_B: &str = "MasseB";
pub const LIFESPAN_A: &str = "DureeVieA";
pub const LIFESPAN_B: &str = "DureeVieB";
pub const PRICE_A: &str = "PrixA";
pub const PRICE_B: &str = "PrixB";
pub const ENERGY_USE_A: &str = "ConsoEnergieA";
pub const ENERGY_USE_B: &str = "ConsoEnergieB";
pub const WATER_USE_A: &str = "ConsoEauA";
pub const WATER_USE_B: &str = "ConsoEauB";

pub const MEASURE_KEYS: [&str; 10] = [
    MASS_A, MASS_B, LIFESPAN_A, LIFESPAN_B, PRICE_A, PRICE_B, ENERGY_USE_A,
    ENERGY_USE_B, WATER_USE_A, WATER_USE_B,
];

/// Computes the weighted indicator totals and derived usage costs for a
/// submission.
///
/// This function never fails: non-numeric answers, missing coefficients
/// and unknown categories degrade that contribution to zero with a warn
/// log.
///
/// Usage-cost policy: water cost is added directly to the side's running
/// total; the total is never pre-multiplied by the annual energy use.
pub fn compute(answers: &AnswerMap, definitions: &[QuestionDefinition]) -> ScoreSheet {
    let mut sheet = ScoreSheet::new();

    // Last definition wins on duplicate indicator keys.
    let lookup: HashMap<&str, &QuestionDefinition> = definitions
        .iter()
        .filter(|q| !q.indicator.is_empty())
        .map(|q| (q.indicator.as_str(), q))
        .collect();

    for (key, value) in answers {
        let flat = value.joined();

        // Distinguished measures: recorded verbatim, never coerced.
        if MEASURE_KEYS.contains(&key.as_str()) {
            let measure = match parse_number(&flat) {
                Some(n) => Measure::Number(n),
                None => {
                    tracing::warn!(
                        key = %key,
                        value = %flat,
                        "Distinguished measure is not numeric; storing as-is"
                    );
                    Measure::Text(flat.clone())
                }
            };
            sheet.measures.insert(key.clone(), measure);
        }

        // Weighted category contribution.
        let Some(def) = lookup.get(key.as_str()) else {
            continue;
        };
        let Some(category) = ScoreCategory::parse(&def.category) else {
            continue;
        };
        match (parse_number(&flat), def.coefficient) {
            (Some(answer), Some(coefficient)) => {
                sheet.add(category, answer * coefficient);
            }
            _ => {
                tracing::warn!(
                    key = %key,
                    category = %category,
                    answer = %flat,
                    "Non-numeric answer or coefficient; no contribution"
                );
            }
        }
    }

    derive_usage_costs(answers, &lookup, &mut sheet);
    sheet
}

/// Energy-category answers contribute `answer * unit price` (no
/// coefficient) to the usage cost of the side named by the key's trailing
/// letter; then the two annual-water-use answers contribute the same way
/// through their definition's unit price field.
fn derive_usage_costs(
    answers: &AnswerMap,
    lookup: &HashMap<&str, &QuestionDefinition>,
    sheet: &mut ScoreSheet,
) {
    for (key, value) in answers {
        let Some(def) = lookup.get(key.as_str()) else {
            continue;
        };
        let is_energy = ScoreCategory::parse(&def.category)
            .is_some_and(|c| c.stage == LifecycleStage::Energy);
        if !is_energy {
            continue;
        }
        let Some(side) = Side::from_trailing_letter(key) else {
            tracing::warn!(key = %key, "Energy answer key has no product suffix; skipped");
            continue;
        };
        match (parse_number(&value.joined()), def.unit_energy_price) {
            (Some(answer), Some(price)) => sheet.add_usage_cost(side, answer * price),
            _ => {
                tracing::warn!(key = %key, "Energy answer or unit price not numeric; skipped");
            }
        }
    }

    for (key, side) in [(WATER_USE_A, Side::A), (WATER_USE_B, Side::B)] {
        let Some(value) = answers.get(key) else {
            continue;
        };
        let Some(def) = lookup.get(key) else {
            continue;
        };
        match (parse_number(&value.joined()), def.unit_energy_price) {
            (Some(answer), Some(price)) => sheet.add_usage_cost(side, answer * price),
            _ => {
                tracing::warn!(key = %key, "Water answer or unit price not numeric; skipped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::AnswerValue;
    use crate::models::question::InputKind;

    fn question(
        indicator: &str,
        category: &str,
        coefficient: Option<f64>,
        unit_energy_price: Option<f64>,
    ) -> QuestionDefinition {
        QuestionDefinition {
            id: format!("rec_{indicator}"),
            stage: Some(2),
            indicator: indicator.to_string(),
            title: indicator.to_string(),
            input_kind: Some(InputKind::Number),
            options: Vec::new(),
            description: String::new(),
            required: false,
            coefficient,
            category: category.to_string(),
            order: 0,
            unit_energy_price,
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> AnswerMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), AnswerValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_weighted_contribution() {
        let defs = vec![question("poids_materiau", "EmatA", Some(2.0), None)];
        let sheet = compute(&answers(&[("poids_materiau", "3")]), &defs);

        let mat_a = ScoreCategory::parse("EmatA").unwrap();
        assert_eq!(sheet.total(mat_a), 6.0);
    }

    #[test]
    fn test_non_numeric_answer_contributes_nothing() {
        let defs = vec![question("poids_materiau", "EmatA", Some(2.0), None)];
        let sheet = compute(&answers(&[("poids_materiau", "abc")]), &defs);

        let mat_a = ScoreCategory::parse("EmatA").unwrap();
        assert_eq!(sheet.total(mat_a), 0.0);
    }

    #[test]
    fn test_missing_coefficient_contributes_nothing() {
        let defs = vec![question("poids_materiau", "EmatB", None, None)];
        let sheet = compute(&answers(&[("poids_materiau", "3")]), &defs);
        assert_eq!(sheet.total(ScoreCategory::parse("EmatB").unwrap()), 0.0);
    }

    #[test]
    fn test_unknown_category_is_ignored() {
        let defs = vec![question("q1", "Transport", Some(2.0), None)];
        let sheet = compute(&answers(&[("q1", "3")]), &defs);
        assert!(sheet.indicators().all(|(_, v)| v == 0.0));
    }

    #[test]
    fn test_last_definition_wins_on_duplicate_indicator() {
        let defs = vec![
            question("q1", "EmatA", Some(10.0), None),
            question("q1", "EmatA", Some(2.0), None),
        ];
        let sheet = compute(&answers(&[("q1", "3")]), &defs);
        assert_eq!(sheet.total(ScoreCategory::parse("EmatA").unwrap()), 6.0);
    }

    #[test]
    fn test_distinguished_measure_recorded_verbatim() {
        let sheet = compute(&answers(&[(MASS_A, "12.5"), (MASS_B, "lourd")]), &[]);

        assert_eq!(sheet.measures.get(MASS_A), Some(&Measure::Number(12.5)));
        // Non-numeric input retained as-is, not coerced to zero.
        assert_eq!(
            sheet.measures.get(MASS_B),
            Some(&Measure::Text("lourd".to_string()))
        );
    }

    #[test]
    fn test_uncategorized_payload_yields_all_zero_sheet() {
        let sheet = compute(&answers(&[("libre", "du texte")]), &[]);
        assert_eq!(sheet.indicators().count(), 14);
        assert!(sheet.indicators().all(|(_, v)| v == 0.0));
        assert_eq!(sheet.total_usage_cost_a, 0.0);
        assert_eq!(sheet.total_usage_cost_b, 0.0);
    }

    #[test]
    fn test_energy_cost_uses_unit_price_without_coefficient() {
        let defs = vec![question(ENERGY_USE_A, "EnergieA", Some(4.0), Some(0.2))];
        let sheet = compute(&answers(&[(ENERGY_USE_A, "100")]), &defs);

        // 100 kWh * 0.20 per unit; the 4.0 coefficient applies only to the
        // category total, never to the cost.
        assert_eq!(sheet.total_usage_cost_a, 20.0);
        assert_eq!(
            sheet.total(ScoreCategory::parse("EnergieA").unwrap()),
            400.0
        );
    }

    #[test]
    fn test_energy_cost_attributed_by_trailing_letter() {
        let defs = vec![question(ENERGY_USE_B, "EnergieB", None, Some(0.5))];
        let sheet = compute(&answers(&[(ENERGY_USE_B, "10")]), &defs);
        assert_eq!(sheet.total_usage_cost_a, 0.0);
        assert_eq!(sheet.total_usage_cost_b, 5.0);
    }

    #[test]
    fn water_cost_added_directly() {
        // Chosen policy for the historically ambiguous formula: the water
        // cost is added to the running total as-is; the total is NOT
        // multiplied by the annual energy use first.
        let defs = vec![
            question(ENERGY_USE_A, "EnergieA", None, Some(0.2)),
            question(WATER_USE_A, "EauA", None, Some(0.004)),
        ];
        let sheet = compute(
            &answers(&[(ENERGY_USE_A, "100"), (WATER_USE_A, "1000")]),
            &defs,
        );

        // 100 * 0.2 + 1000 * 0.004, not (100 * 0.2) * 100 + 4.
        assert_eq!(sheet.total_usage_cost_a, 24.0);
    }

    #[test]
    fn test_water_cost_without_definition_is_skipped() {
        let sheet = compute(&answers(&[(WATER_USE_A, "1000")]), &[]);
        assert_eq!(sheet.total_usage_cost_a, 0.0);
        // Still recorded as a distinguished measure.
        assert_eq!(
            sheet.measures.get(WATER_USE_A),
            Some(&Measure::Number(1000.0))
        );
    }
}
