//! Six-component HAI risk score, tier classification and percentage mapping.

use crate::organ::estimate_organ_failure;
use crate::recommend;
use crate::{
    AssessmentConfig, LabResults, PatientRecord, RiskAssessment, RiskComponents, RiskLevel,
    TermSet,
};

const DEVICE_WEIGHT: u32 = 12;
const DEVICE_CAP: u32 = 40;
const ANTIBIOTIC_WEIGHT: u32 = 8;
const ANTIBIOTIC_CAP: u32 = 25;
const COMORBIDITY_WEIGHT: u32 = 6;
const COMORBIDITY_CAP: u32 = 20;
const ORGAN_FAILURE_WEIGHT: u32 = 3;
const ORGAN_FAILURE_CAP: u32 = 30;

/// Score a record with the default configuration.
pub fn calculate_risk(record: &PatientRecord) -> RiskAssessment {
    calculate_risk_with(record, &AssessmentConfig::default())
}

/// Score a record. Never fails: missing data contributes zero points.
pub fn calculate_risk_with(record: &PatientRecord, config: &AssessmentConfig) -> RiskAssessment {
    let organ_estimate = estimate_organ_failure(record);

    let components = RiskComponents {
        temporal: temporal_score(record.hospitalization_hours.unwrap_or(0)),
        devices: weighted_count(
            record.invasive_devices.as_ref(),
            DEVICE_WEIGHT,
            DEVICE_CAP,
        ),
        antibiotics: weighted_count(
            record.antibiotics.as_ref(),
            ANTIBIOTIC_WEIGHT,
            ANTIBIOTIC_CAP,
        ),
        comorbidities: weighted_count(
            record.comorbidities.as_ref(),
            COMORBIDITY_WEIGHT,
            COMORBIDITY_CAP,
        ),
        inflammation: record
            .lab_results
            .as_ref()
            .map(inflammation_score)
            .unwrap_or(0),
        organ_failure: organ_estimate
            .saturating_mul(ORGAN_FAILURE_WEIGHT)
            .min(ORGAN_FAILURE_CAP),
    };

    let total_score = components.total();
    let risk_level = RiskLevel::from_score(total_score);
    let risk_percentage = risk_percentage(total_score);

    let recommendations = recommend::generate(&components, organ_estimate, risk_percentage)
        .into_iter()
        .map(|recommendation| recommendation.text(config.language).to_string())
        .collect();

    tracing::debug!(
        total_score,
        ?risk_level,
        risk_percentage,
        organ_estimate,
        "risk assessment computed"
    );

    RiskAssessment {
        total_score,
        risk_level,
        risk_percentage,
        components,
        recommendations,
    }
}

/// Piecewise-linear mapping from total score to a percentage.
pub fn risk_percentage(total_score: u32) -> f64 {
    let score = f64::from(total_score);
    match RiskLevel::from_score(total_score) {
        RiskLevel::VeryLow => (2.0 * score).min(15.0),
        RiskLevel::Low => 15.0 + 1.5 * (score - 20.0),
        RiskLevel::Moderate => 45.0 + 1.2 * (score - 40.0),
        RiskLevel::High => 75.0 + 0.8 * (score - 70.0),
        RiskLevel::VeryHigh => (85.0 + 0.1 * (score - 100.0)).min(95.0),
    }
}

/// True when the stay is too short (or unknown) for a meaningful assessment.
/// Advisory only; scoring still proceeds.
pub fn is_premature(record: &PatientRecord, config: &AssessmentConfig) -> bool {
    record
        .hospitalization_hours
        .map_or(true, |hours| hours < config.minimum_observation_hours)
}

fn temporal_score(hours: u32) -> u32 {
    match hours {
        0..=47 => 0,
        48..=71 => 8,
        72..=167 => 15,
        168..=335 => 25,
        _ => 35,
    }
}

fn weighted_count(terms: Option<&TermSet>, weight: u32, cap: u32) -> u32 {
    let count = terms.map_or(0, TermSet::len);
    u32::try_from(count)
        .unwrap_or(u32::MAX)
        .saturating_mul(weight)
        .min(cap)
}

fn inflammation_score(labs: &LabResults) -> u32 {
    let mut score = 0;
    if labs.crp.is_some_and(|crp| crp > 10.0) {
        score += 8;
    }
    if labs.procalcitonin.is_some_and(|pct| pct > 0.5) {
        score += 12;
    }
    if labs.leukocytes.is_some_and(|wbc| wbc > 12.0 || wbc < 4.0) {
        score += 6;
    }
    score
}
