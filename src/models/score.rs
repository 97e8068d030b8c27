// src/models/score.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two compared products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn letter(&self) -> char {
        match self {
            Side::A => 'A',
            Side::B => 'B',
        }
    }

    /// Trailing-letter convention: `ConsoEnergieA` belongs to product A.
    pub fn from_trailing_letter(key: &str) -> Option<Side> {
        match key.chars().last() {
            Some('A') => Some(Side::A),
            Some('B') => Some(Side::B),
            _ => None,
        }
    }
}

/// Lifecycle-impact buckets. Each is tracked separately per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleStage {
    Material,
    Sourcing,
    Manufacturing,
    Distribution,
    Energy,
    Water,
    EndOfLife,
}

impl LifecycleStage {
    pub const ALL: [LifecycleStage; 7] = [
        LifecycleStage::Material,
        LifecycleStage::Sourcing,
        LifecycleStage::Manufacturing,
        LifecycleStage::Distribution,
        LifecycleStage::Energy,
        LifecycleStage::Water,
        LifecycleStage::EndOfLife,
    ];

    /// Catalog tag prefix ("Emat" + side letter gives "EmatA").
    pub fn prefix(&self) -> &'static str {
        match self {
            LifecycleStage::Material => "Emat",
            LifecycleStage::Sourcing => "Eappro",
            LifecycleStage::Manufacturing => "Efab",
            LifecycleStage::Distribution => "Edistrib",
            LifecycleStage::Energy => "Energie",
            LifecycleStage::Water => "Eau",
            LifecycleStage::EndOfLife => "Fdv",
        }
    }
}

/// One of the fourteen indicator categories (seven stages, two sides).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScoreCategory {
    pub stage: LifecycleStage,
    pub side: Side,
}

impl ScoreCategory {
    pub const fn new(stage: LifecycleStage, side: Side) -> Self {
        Self { stage, side }
    }

    /// All fourteen categories, in stage-then-side order.
    pub fn all() -> impl Iterator<Item = ScoreCategory> {
        LifecycleStage::ALL.into_iter().flat_map(|stage| {
            [Side::A, Side::B]
                .into_iter()
                .map(move |side| ScoreCategory::new(stage, side))
        })
    }

    /// Parses a catalog tag like "EmatA" or "EnergieB". Unknown or
    /// untagged categories yield None and contribute nothing.
    pub fn parse(tag: &str) -> Option<ScoreCategory> {
        let tag = tag.trim();
        let side = Side::from_trailing_letter(tag)?;
        let prefix = &tag[..tag.len() - 1];
        LifecycleStage::ALL
            .into_iter()
            .find(|stage| stage.prefix() == prefix)
            .map(|stage| ScoreCategory::new(stage, side))
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stage.prefix(), self.side.letter())
    }
}

/// A distinguished answer recorded verbatim: numeric when it parses,
/// otherwise the raw text (never coerced to zero).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measure {
    Number(f64),
    Text(String),
}

/// Output of the score calculator: the fourteen running totals, the
/// distinguished product measures, and the derived usage costs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSheet {
    indicators: BTreeMap<ScoreCategory, f64>,
    pub measures: BTreeMap<String, Measure>,
    pub total_usage_cost_a: f64,
    pub total_usage_cost_b: f64,
}

impl ScoreSheet {
    /// All fourteen totals start at zero so an uncategorized payload still
    /// yields a complete, all-zero record.
    pub fn new() -> Self {
        let indicators = ScoreCategory::all().map(|c| (c, 0.0)).collect();
        Self {
            indicators,
            measures: BTreeMap::new(),
            total_usage_cost_a: 0.0,
            total_usage_cost_b: 0.0,
        }
    }

    pub fn add(&mut self, category: ScoreCategory, contribution: f64) {
        *self.indicators.entry(category).or_insert(0.0) += contribution;
    }

    pub fn total(&self, category: ScoreCategory) -> f64 {
        self.indicators.get(&category).copied().unwrap_or(0.0)
    }

    pub fn indicators(&self) -> impl Iterator<Item = (ScoreCategory, f64)> + '_ {
        self.indicators.iter().map(|(c, v)| (*c, *v))
    }

    pub fn add_usage_cost(&mut self, side: Side, cost: f64) {
        match side {
            Side::A => self.total_usage_cost_a += cost,
            Side::B => self.total_usage_cost_b += cost,
        }
    }
}

impl Default for ScoreSheet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_tags_round_trip() {
        for category in ScoreCategory::all() {
            let tag = category.to_string();
            assert_eq!(ScoreCategory::parse(&tag), Some(category), "tag {tag}");
        }
    }

    #[test]
    fn test_parse_rejects_unknown_tags() {
        assert_eq!(ScoreCategory::parse("EmatC"), None);
        assert_eq!(ScoreCategory::parse("Transport"), None);
        assert_eq!(ScoreCategory::parse(""), None);
    }

    #[test]
    fn test_sheet_starts_with_fourteen_zeroed_totals() {
        let sheet = ScoreSheet::new();
        assert_eq!(sheet.indicators().count(), 14);
        assert!(sheet.indicators().all(|(_, v)| v == 0.0));
    }
}
