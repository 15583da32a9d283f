//! Framework-neutral WASM <-> JavaScript bridge for the chat UI and data forms.

use epimind_core::{AssessmentConfig, Language, PatientRecord, RecordError};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsAssessmentConfig {
    #[serde(default)]
    minimum_observation_hours: Option<u32>,
    #[serde(default)]
    language: Option<Language>,
}

impl From<JsAssessmentConfig> for AssessmentConfig {
    fn from(cfg: JsAssessmentConfig) -> Self {
        let mut base = AssessmentConfig::default();
        if let Some(hours) = cfg.minimum_observation_hours {
            base.minimum_observation_hours = hours;
        }
        if let Some(language) = cfg.language {
            base.language = language;
        }
        base
    }
}

/// Extract a partial record from a free-text note. Never fails on content.
#[wasm_bindgen(js_name = extractMedicalData)]
pub fn extract_medical_data(text: &str) -> Result<JsValue, JsValue> {
    init_panic_hook();
    let record = epimind_extract::extract_medical_data(text);
    to_js(&record)
}

/// Shallow-merge `update` into `current` and return the merged record.
#[wasm_bindgen(js_name = mergePatientRecords)]
pub fn merge_patient_records(current: JsValue, update: JsValue) -> Result<JsValue, JsValue> {
    init_panic_hook();
    let mut record = read_record(current)?;
    record.merge(read_record(update)?);
    to_js(&record)
}

#[wasm_bindgen(js_name = estimateOrganFailure)]
pub fn estimate_organ_failure(record: JsValue) -> Result<u32, JsValue> {
    init_panic_hook();
    let record = read_record(record)?;
    Ok(epimind_core::estimate_organ_failure(&record))
}

#[wasm_bindgen(js_name = calculateRisk)]
pub fn calculate_risk(record: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    init_panic_hook();
    let record = read_record(record)?;
    let cfg = read_config(config)?;
    let assessment = epimind_core::calculate_risk_with(&record, &cfg);
    to_js(&assessment)
}

/// True when the stay is shorter than the observation window; the UI shows a
/// warning but may still score.
#[wasm_bindgen(js_name = isPrematureAssessment)]
pub fn is_premature_assessment(record: JsValue, config: Option<JsValue>) -> Result<bool, JsValue> {
    init_panic_hook();
    let record = read_record(record)?;
    let cfg = read_config(config)?;
    Ok(epimind_core::is_premature(&record, &cfg))
}

fn init_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn read_record(value: JsValue) -> Result<PatientRecord, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(PatientRecord::default());
    }
    let record: PatientRecord = from_value(value).map_err(|err| {
        JsValue::from_str(&format_record_error(RecordError::Parse(err.to_string())))
    })?;
    record
        .validate()
        .map_err(|err| JsValue::from_str(&format_record_error(err)))?;
    Ok(record)
}

fn read_config(config: Option<JsValue>) -> Result<AssessmentConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsAssessmentConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Cannot read config: {err}")))?;
            Ok(AssessmentConfig::from(cfg))
        }
        _ => Ok(AssessmentConfig::default()),
    }
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|err| JsValue::from_str(&format!("Cannot serialize result: {err}")))
}

fn format_record_error(err: RecordError) -> String {
    format!("Patient record error: {err}")
}
