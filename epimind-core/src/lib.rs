//! Core logic for estimating healthcare-associated infection (HAI) risk.
//!
//! The crate holds the partial patient record, the SOFA-style organ-failure
//! estimate, the six-component risk scorer and the recommendation rules. Every
//! scoring function is total: missing data contributes nothing instead of
//! failing.

pub mod organ;
pub mod recommend;
mod record;
pub mod scoring;

use serde::{Deserialize, Serialize};

pub use organ::estimate_organ_failure;
pub use recommend::Recommendation;
pub use record::{
    LabResults, PatientRecord, PlausibilityWarning, Sex, SofaComponents, TermSet, VitalSigns,
};
pub use scoring::{calculate_risk, calculate_risk_with, is_premature, risk_percentage};

/// Language used for labels and recommendation texts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ro")]
    Romanian,
}

/// Settings that shape how an assessment is produced and presented.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentConfig {
    /// Hospitalization hours below which an assessment is considered premature.
    pub minimum_observation_hours: u32,
    /// Language of the recommendation strings in the assessment.
    pub language: Language,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            minimum_observation_hours: 48,
            language: Language::English,
        }
    }
}

/// Risk tier derived from the total score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Classify a total score into its tier. Intervals are half-open:
    /// `[0,20)`, `[20,40)`, `[40,70)`, `[70,100)`, `[100,∞)`.
    pub fn from_score(total_score: u32) -> Self {
        match total_score {
            0..=19 => RiskLevel::VeryLow,
            20..=39 => RiskLevel::Low,
            40..=69 => RiskLevel::Moderate,
            70..=99 => RiskLevel::High,
            _ => RiskLevel::VeryHigh,
        }
    }

    pub fn label(self, language: Language) -> &'static str {
        match (self, language) {
            (RiskLevel::VeryLow, Language::English) => "Very low",
            (RiskLevel::Low, Language::English) => "Low",
            (RiskLevel::Moderate, Language::English) => "Moderate",
            (RiskLevel::High, Language::English) => "High",
            (RiskLevel::VeryHigh, Language::English) => "Very high",
            (RiskLevel::VeryLow, Language::Romanian) => "Foarte Scăzut",
            (RiskLevel::Low, Language::Romanian) => "Scăzut",
            (RiskLevel::Moderate, Language::Romanian) => "Moderat",
            (RiskLevel::High, Language::Romanian) => "Ridicat",
            (RiskLevel::VeryHigh, Language::Romanian) => "Foarte Ridicat",
        }
    }
}

/// Points contributed by each risk factor, after caps.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RiskComponents {
    pub temporal: u32,
    pub devices: u32,
    pub antibiotics: u32,
    pub comorbidities: u32,
    pub inflammation: u32,
    pub organ_failure: u32,
}

impl RiskComponents {
    pub fn total(&self) -> u32 {
        self.temporal
            + self.devices
            + self.antibiotics
            + self.comorbidities
            + self.inflammation
            + self.organ_failure
    }
}

/// Result of one scoring call. A new assessment replaces the previous one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub total_score: u32,
    pub risk_level: RiskLevel,
    pub risk_percentage: f64,
    pub components: RiskComponents,
    pub recommendations: Vec<String>,
}

/// Errors raised while ingesting a record from an external source.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("could not read patient record: {0}")]
    Parse(String),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_are_half_open() {
        let cases = [
            (0, RiskLevel::VeryLow),
            (19, RiskLevel::VeryLow),
            (20, RiskLevel::Low),
            (39, RiskLevel::Low),
            (40, RiskLevel::Moderate),
            (69, RiskLevel::Moderate),
            (70, RiskLevel::High),
            (99, RiskLevel::High),
            (100, RiskLevel::VeryHigh),
            (500, RiskLevel::VeryHigh),
        ];
        for (score, expected) in cases {
            assert_eq!(RiskLevel::from_score(score), expected, "score {score}");
        }
    }

    #[test]
    fn romanian_labels_match_ui_wording() {
        assert_eq!(RiskLevel::VeryLow.label(Language::Romanian), "Foarte Scăzut");
        assert_eq!(RiskLevel::VeryHigh.label(Language::Romanian), "Foarte Ridicat");
        assert_eq!(RiskLevel::Moderate.label(Language::English), "Moderate");
    }

    #[test]
    fn record_errors_name_the_offending_field() {
        let err = RecordError::OutOfRange {
            field: "labResults.crp",
            value: -1.5,
        };
        assert_eq!(err.to_string(), "labResults.crp out of range: -1.5");
        assert_eq!(
            RecordError::Parse("expected `,`".into()).to_string(),
            "could not read patient record: expected `,`"
        );
    }

    #[test]
    fn config_round_trips_with_short_language_codes() {
        let config: AssessmentConfig =
            serde_json::from_str(r#"{"minimumObservationHours":72,"language":"ro"}"#).unwrap();
        assert_eq!(config.minimum_observation_hours, 72);
        assert_eq!(config.language, Language::Romanian);
    }
}
