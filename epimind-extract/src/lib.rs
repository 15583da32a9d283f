//! Rule-based extraction of patient fields from free-text clinical notes.
//!
//! Extraction is total: fields without a match, or whose number does not
//! parse, stay absent in the returned record.

mod rules;

use epimind_core::{LabResults, PatientRecord, Sex, TermSet, VitalSigns};
use regex::Captures;

use rules::{DurationUnit, Measurement, TermRule};

/// Extract every recognized field from a note.
pub fn extract_medical_data(text: &str) -> PatientRecord {
    let mut record = PatientRecord {
        age: extract_age(text),
        sex: extract_sex(text),
        hospitalization_hours: extract_hospitalization_hours(text),
        invasive_devices: extract_devices(text),
        antibiotics: extract_antibiotics(text),
        comorbidities: extract_comorbidities(text),
        ..PatientRecord::default()
    };

    let (vitals, labs) = extract_measurements(text);
    if !vitals.is_empty() {
        record.vital_signs = Some(vitals);
    }
    if !labs.is_empty() {
        record.lab_results = Some(labs);
    }

    tracing::debug!(
        chars = text.len(),
        empty = record.is_empty(),
        "extracted patient fields from note"
    );
    record
}

/// Age from `age 65`, `vârstă: 65` or `65 ani` / `65 years`.
pub fn extract_age(text: &str) -> Option<u32> {
    let captures = rules::AGE.captures(text)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .and_then(|value| value.as_str().parse().ok())
}

/// Male keywords win when both sexes are mentioned.
pub fn extract_sex(text: &str) -> Option<Sex> {
    rules::SEX
        .iter()
        .find(|(regex, _)| regex.is_match(text))
        .map(|(_, sex)| *sex)
}

/// Hospitalization length in hours. The first rule of the cascade that
/// matches decides the value.
pub fn extract_hospitalization_hours(text: &str) -> Option<u32> {
    let (rule, captures) = rules::DURATION
        .iter()
        .find_map(|rule| rule.regex.captures(text).map(|captures| (rule, captures)))?;

    let value: u32 = captures.get(1)?.as_str().parse().ok()?;
    let in_days = match rule.unit {
        DurationUnit::Days => true,
        DurationUnit::Hours => false,
        DurationUnit::Captured => captured_unit_is_days(&captures),
    };

    tracing::debug!(rule = rule.name, value, in_days, "hospitalization duration matched");
    if in_days {
        value.checked_mul(24)
    } else {
        Some(value)
    }
}

fn captured_unit_is_days(captures: &Captures<'_>) -> bool {
    let unit = captures
        .get(2)
        .map(|unit| unit.as_str().to_lowercase())
        .unwrap_or_default();
    !(unit.starts_with('o') || unit.starts_with('h'))
}

pub fn extract_devices(text: &str) -> Option<TermSet> {
    matched_terms(&rules::DEVICES, text)
}

pub fn extract_comorbidities(text: &str) -> Option<TermSet> {
    matched_terms(&rules::COMORBIDITIES, text)
}

/// Every antibiotic mention, Title-cased and deduplicated. A generic mention
/// without a named agent yields a placeholder.
pub fn extract_antibiotics(text: &str) -> Option<TermSet> {
    let mut found: TermSet = rules::ANTIBIOTICS
        .iter()
        .flat_map(|regex| regex.find_iter(text))
        .map(|found| title_case(found.as_str()))
        .collect();

    if found.is_empty() && rules::GENERIC_ANTIBIOTIC.is_match(text) {
        found.insert(rules::UNSPECIFIED_ANTIBIOTIC);
    }

    (!found.is_empty()).then_some(found)
}

fn matched_terms(table: &[TermRule], text: &str) -> Option<TermSet> {
    let terms: TermSet = table
        .iter()
        .filter(|rule| rule.matches(text))
        .map(|rule| rule.canonical)
        .collect();
    (!terms.is_empty()).then_some(terms)
}

fn extract_measurements(text: &str) -> (VitalSigns, LabResults) {
    let mut vitals = VitalSigns::default();
    let mut labs = LabResults::default();

    for rule in rules::MEASUREMENTS.iter() {
        let Some(raw) = rule
            .regex
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str())
        else {
            continue;
        };

        match rule.measurement {
            Measurement::Crp => labs.crp = parse_decimal(raw),
            Measurement::Procalcitonin => labs.procalcitonin = parse_decimal(raw),
            Measurement::Leukocytes => labs.leukocytes = parse_decimal(raw),
            Measurement::Platelets => labs.platelets = parse_decimal(raw),
            Measurement::Creatinine => labs.creatinine = parse_decimal(raw),
            Measurement::Bilirubin => labs.bilirubin = parse_decimal(raw),
            Measurement::Temperature => vitals.temperature = parse_decimal(raw),
            Measurement::HeartRate => vitals.heart_rate = raw.parse().ok(),
            Measurement::OxygenSaturation => vitals.oxygen_saturation = parse_decimal(raw),
            Measurement::RespiratoryRate => vitals.respiratory_rate = raw.parse().ok(),
        }
    }

    (vitals, labs)
}

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
