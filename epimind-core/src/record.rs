//! Partial patient record accumulated from notes and forms.

use serde::{Deserialize, Deserializer, Serialize};

use crate::RecordError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Sex {
    #[serde(alias = "Masculin", alias = "M")]
    Male,
    #[serde(alias = "Feminin", alias = "F")]
    Female,
}

impl Sex {
    /// Case-insensitive match on the Romanian and English words the forms
    /// and notes use.
    pub fn from_keyword(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "m" | "male" | "masculin" | "masculina" | "masculină" | "bărbat" | "barbat" => {
                Some(Sex::Male)
            }
            "f" | "female" | "feminin" | "feminina" | "feminină" | "femeie" => Some(Sex::Female),
            _ => None,
        }
    }
}

/// Form input is free text; empty or unrecognized wording reads as absent.
fn deserialize_sex<'de, D>(deserializer: D) -> Result<Option<Sex>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Option::<String>::deserialize(deserializer)?;
    let sex = text.as_deref().and_then(Sex::from_keyword);
    if sex.is_none() {
        if let Some(text) = text.filter(|text| !text.trim().is_empty()) {
            tracing::debug!(%text, "unrecognized sex wording ignored");
        }
    }
    Ok(sex)
}

/// Insertion-ordered set of names (devices, antibiotics, comorbidities).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TermSet(Vec<String>);

impl TermSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term, returning `false` when it was already present.
    pub fn insert(&mut self, term: impl Into<String>) -> bool {
        let term = term.into();
        if self.contains(&term) {
            return false;
        }
        self.0.push(term);
        true
    }

    pub fn contains(&self, term: &str) -> bool {
        self.0.iter().any(|existing| existing == term)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl From<Vec<String>> for TermSet {
    fn from(terms: Vec<String>) -> Self {
        terms.into_iter().collect()
    }
}

impl From<TermSet> for Vec<String> {
    fn from(set: TermSet) -> Self {
        set.0
    }
}

impl<S: Into<String>> FromIterator<S> for TermSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TermSet::new();
        for term in iter {
            set.insert(term);
        }
        set
    }
}

impl<'a> IntoIterator for &'a TermSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    /// Body temperature, °C.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Beats per minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<u32>,
    /// Systolic pressure, mmHg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<f64>,
    /// Breaths per minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<u32>,
    /// SpO2, percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<f64>,
}

impl VitalSigns {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabResults {
    /// C-reactive protein, mg/L.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crp: Option<f64>,
    /// ng/mL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procalcitonin: Option<f64>,
    /// ×10³/µL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leukocytes: Option<f64>,
    /// ×10³/µL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platelets: Option<f64>,
    /// mg/dL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creatinine: Option<f64>,
    /// mg/dL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bilirubin: Option<f64>,
}

impl LabResults {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Explicit SOFA sub-scores, each 0–4 when present.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SofaComponents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coagulation: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liver: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardiovascular: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cns: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renal: Option<u8>,
}

impl SofaComponents {
    fn named(&self) -> [(&'static str, Option<u8>); 6] {
        [
            ("sofaComponents.respiratory", self.respiratory),
            ("sofaComponents.coagulation", self.coagulation),
            ("sofaComponents.liver", self.liver),
            ("sofaComponents.cardiovascular", self.cardiovascular),
            ("sofaComponents.cns", self.cns),
            ("sofaComponents.renal", self.renal),
        ]
    }

    /// Sub-scores that were actually provided.
    pub fn present(&self) -> impl Iterator<Item = u8> {
        self.named().into_iter().filter_map(|(_, score)| score)
    }
}

/// Patient data as known so far. Every field may be absent; absence is never
/// replaced by a default inside the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(
        default,
        alias = "gender",
        deserialize_with = "deserialize_sex",
        skip_serializing_if = "Option::is_none"
    )]
    pub sex: Option<Sex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospitalization_hours: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invasive_devices: Option<TermSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antibiotics: Option<TermSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comorbidities: Option<TermSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vital_signs: Option<VitalSigns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_results: Option<LabResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sofa_components: Option<SofaComponents>,
}

/// A measurement outside its expected physiological range.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlausibilityWarning {
    pub field: &'static str,
    pub value: f64,
    pub expected_min: f64,
    pub expected_max: f64,
}

impl PatientRecord {
    /// Parse a record from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, RecordError> {
        let record: PatientRecord =
            serde_json::from_str(json).map_err(|err| RecordError::Parse(err.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow merge: every top-level field present in `update` replaces the
    /// current value, nested groups included.
    pub fn merge(&mut self, update: PatientRecord) {
        let PatientRecord {
            age,
            sex,
            hospitalization_hours,
            invasive_devices,
            antibiotics,
            comorbidities,
            vital_signs,
            lab_results,
            sofa_components,
        } = update;

        overwrite(&mut self.age, age);
        overwrite(&mut self.sex, sex);
        overwrite(&mut self.hospitalization_hours, hospitalization_hours);
        overwrite(&mut self.invasive_devices, invasive_devices);
        overwrite(&mut self.antibiotics, antibiotics);
        overwrite(&mut self.comorbidities, comorbidities);
        overwrite(&mut self.vital_signs, vital_signs);
        overwrite(&mut self.lab_results, lab_results);
        overwrite(&mut self.sofa_components, sofa_components);
    }

    /// Non-mutating variant of [`PatientRecord::merge`].
    pub fn merged(&self, update: &PatientRecord) -> PatientRecord {
        let mut merged = self.clone();
        merged.merge(update.clone());
        merged
    }

    /// Reject values no form or note could legitimately carry.
    pub fn validate(&self) -> Result<(), RecordError> {
        if let Some(sofa) = &self.sofa_components {
            for (field, score) in sofa.named() {
                if let Some(score) = score.filter(|score| *score > 4) {
                    return Err(RecordError::OutOfRange {
                        field,
                        value: f64::from(score),
                    });
                }
            }
        }

        for (field, value) in self.measurements() {
            if !value.is_finite() || value < 0.0 {
                return Err(RecordError::OutOfRange { field, value });
            }
        }

        Ok(())
    }

    /// List measurements outside their physiological range. Values are only
    /// flagged; scoring still uses them.
    pub fn implausible_values(&self) -> Vec<PlausibilityWarning> {
        let warnings: Vec<PlausibilityWarning> = self
            .measurements()
            .into_iter()
            .filter_map(|(field, value)| {
                let (min, max) = plausible_range(field)?;
                if (min..=max).contains(&value) {
                    None
                } else {
                    Some(PlausibilityWarning {
                        field,
                        value,
                        expected_min: min,
                        expected_max: max,
                    })
                }
            })
            .collect();

        for warning in &warnings {
            tracing::warn!(
                field = warning.field,
                value = warning.value,
                "measurement outside plausible range"
            );
        }
        warnings
    }

    fn measurements(&self) -> Vec<(&'static str, f64)> {
        let mut values = Vec::new();
        if let Some(vitals) = &self.vital_signs {
            push_value(&mut values, "vitalSigns.temperature", vitals.temperature);
            push_value(
                &mut values,
                "vitalSigns.heartRate",
                vitals.heart_rate.map(f64::from),
            );
            push_value(&mut values, "vitalSigns.bloodPressure", vitals.blood_pressure);
            push_value(
                &mut values,
                "vitalSigns.respiratoryRate",
                vitals.respiratory_rate.map(f64::from),
            );
            push_value(
                &mut values,
                "vitalSigns.oxygenSaturation",
                vitals.oxygen_saturation,
            );
        }
        if let Some(labs) = &self.lab_results {
            push_value(&mut values, "labResults.crp", labs.crp);
            push_value(&mut values, "labResults.procalcitonin", labs.procalcitonin);
            push_value(&mut values, "labResults.leukocytes", labs.leukocytes);
            push_value(&mut values, "labResults.platelets", labs.platelets);
            push_value(&mut values, "labResults.creatinine", labs.creatinine);
            push_value(&mut values, "labResults.bilirubin", labs.bilirubin);
        }
        values
    }
}

fn overwrite<T>(current: &mut Option<T>, update: Option<T>) {
    if update.is_some() {
        *current = update;
    }
}

fn push_value(values: &mut Vec<(&'static str, f64)>, field: &'static str, value: Option<f64>) {
    if let Some(value) = value {
        values.push((field, value));
    }
}

fn plausible_range(field: &str) -> Option<(f64, f64)> {
    let range = match field {
        "vitalSigns.temperature" => (35.0, 42.0),
        "vitalSigns.heartRate" => (40.0, 200.0),
        "vitalSigns.bloodPressure" => (60.0, 250.0),
        "vitalSigns.respiratoryRate" => (8.0, 50.0),
        "vitalSigns.oxygenSaturation" => (50.0, 100.0),
        "labResults.crp" => (0.0, 500.0),
        "labResults.procalcitonin" => (0.0, 100.0),
        "labResults.leukocytes" => (0.1, 50.0),
        "labResults.platelets" => (10.0, 1000.0),
        "labResults.creatinine" => (0.3, 15.0),
        "labResults.bilirubin" => (0.1, 50.0),
        _ => return None,
    };
    Some(range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices(names: &[&str]) -> Option<TermSet> {
        Some(names.iter().copied().collect())
    }

    #[test]
    fn term_set_keeps_first_insertion_order() {
        let mut set = TermSet::new();
        assert!(set.insert("Meropenem"));
        assert!(set.insert("Vancomycin"));
        assert!(!set.insert("Meropenem"));
        let names: Vec<&String> = set.iter().collect();
        assert_eq!(names, ["Meropenem", "Vancomycin"]);
    }

    #[test]
    fn term_set_deduplicates_on_deserialize() {
        let set: TermSet = serde_json::from_str(r#"["Drainage","Drainage","Pacemaker"]"#).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn merge_overwrites_only_present_fields() {
        let mut current = PatientRecord {
            age: Some(70),
            hospitalization_hours: Some(24),
            invasive_devices: devices(&["Central venous catheter"]),
            ..PatientRecord::default()
        };
        let update = PatientRecord {
            hospitalization_hours: Some(96),
            ..PatientRecord::default()
        };

        current.merge(update);

        assert_eq!(current.age, Some(70));
        assert_eq!(current.hospitalization_hours, Some(96));
        assert_eq!(current.invasive_devices, devices(&["Central venous catheter"]));
    }

    #[test]
    fn merge_replaces_nested_groups_wholesale() {
        let current = PatientRecord {
            lab_results: Some(LabResults {
                crp: Some(45.0),
                ..LabResults::default()
            }),
            ..PatientRecord::default()
        };
        let update = PatientRecord {
            lab_results: Some(LabResults {
                procalcitonin: Some(2.1),
                ..LabResults::default()
            }),
            ..PatientRecord::default()
        };

        let merged = current.merged(&update);
        let labs = merged.lab_results.unwrap();
        assert_eq!(labs.crp, None);
        assert_eq!(labs.procalcitonin, Some(2.1));
    }

    #[test]
    fn absent_fields_are_omitted_from_json() {
        let record = PatientRecord {
            hospitalization_hours: Some(99),
            ..PatientRecord::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"hospitalizationHours":99}"#);
    }

    #[test]
    fn accepts_ui_gender_wording() {
        let record = PatientRecord::from_json_str(r#"{"gender":"Masculin","age":65}"#).unwrap();
        assert_eq!(record.sex, Some(Sex::Male));
        assert_eq!(record.age, Some(65));
    }

    #[test]
    fn free_text_gender_never_blocks_scoring() {
        let cleared =
            PatientRecord::from_json_str(r#"{"gender":"","hospitalizationHours":99}"#).unwrap();
        assert_eq!(cleared.sex, None);
        assert_eq!(cleared.hospitalization_hours, Some(99));

        let unknown = PatientRecord::from_json_str(r#"{"gender":"n/a"}"#).unwrap();
        assert_eq!(unknown.sex, None);

        for (wording, expected) in [
            ("masculin", Sex::Male),
            ("Bărbat", Sex::Male),
            ("MALE", Sex::Male),
            ("feminin", Sex::Female),
            (" Femeie ", Sex::Female),
        ] {
            let json = format!(r#"{{"gender":"{wording}"}}"#);
            let record = PatientRecord::from_json_str(&json).unwrap();
            assert_eq!(record.sex, Some(expected), "{wording}");
        }
    }

    #[test]
    fn sex_serializes_in_canonical_form() {
        let record = PatientRecord {
            sex: Some(Sex::Female),
            ..PatientRecord::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"sex":"female"}"#);
        assert_eq!(PatientRecord::from_json_str(&json).unwrap(), record);
    }

    #[test]
    fn rejects_sofa_scores_above_four() {
        let err = PatientRecord::from_json_str(r#"{"sofaComponents":{"renal":5}}"#).unwrap_err();
        match err {
            RecordError::OutOfRange { field, value } => {
                assert_eq!(field, "sofaComponents.renal");
                assert_eq!(value, 5.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_negative_measurements() {
        let err = PatientRecord::from_json_str(r#"{"labResults":{"crp":-1}}"#).unwrap_err();
        assert!(matches!(err, RecordError::OutOfRange { field: "labResults.crp", .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = PatientRecord::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, RecordError::Parse(_)));
    }

    #[test]
    fn implausible_values_are_flagged_not_removed() {
        let record = PatientRecord {
            vital_signs: Some(VitalSigns {
                temperature: Some(45.5),
                heart_rate: Some(80),
                ..VitalSigns::default()
            }),
            lab_results: Some(LabResults {
                platelets: Some(5.0),
                ..LabResults::default()
            }),
            ..PatientRecord::default()
        };

        let warnings = record.implausible_values();
        let fields: Vec<&str> = warnings.iter().map(|w| w.field).collect();
        assert_eq!(fields, ["vitalSigns.temperature", "labResults.platelets"]);
        assert_eq!(
            record.vital_signs.as_ref().and_then(|v| v.temperature),
            Some(45.5)
        );
    }
}
