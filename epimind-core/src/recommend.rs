//! Recommendation rules triggered by component scores.

use serde::{Deserialize, Serialize};

use crate::{Language, RiskComponents};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Recommendation {
    IntensiveMonitoring,
    DeviceReassessment,
    AntibioticReview,
    InflammatoryWorkup,
    IntensiveCareEvaluation,
    InfectionControl,
}

impl Recommendation {
    pub fn text(self, language: Language) -> &'static str {
        match language {
            Language::English => match self {
                Recommendation::IntensiveMonitoring => {
                    "intensive monitoring for nosocomial infection"
                }
                Recommendation::DeviceReassessment => {
                    "daily reassessment of invasive-device necessity"
                }
                Recommendation::AntibioticReview => {
                    "review antibiotic therapy / consider de-escalation"
                }
                Recommendation::InflammatoryWorkup => {
                    "monitor inflammatory markers and blood cultures"
                }
                Recommendation::IntensiveCareEvaluation => {
                    "evaluate for intensive care / organ support"
                }
                Recommendation::InfectionControl => "implement strict infection-control measures",
            },
            Language::Romanian => match self {
                Recommendation::IntensiveMonitoring => {
                    "Monitorizare intensivă pentru infecții nosocomiale"
                }
                Recommendation::DeviceReassessment => {
                    "Evaluare zilnică a necesității dispozitivelor invazive"
                }
                Recommendation::AntibioticReview => {
                    "Revizuire terapie antibiotică și considerare de-escalare"
                }
                Recommendation::InflammatoryWorkup => {
                    "Monitorizare markeri inflamatori și hemocultură"
                }
                Recommendation::IntensiveCareEvaluation => {
                    "Evaluare pentru terapie intensivă și suport organ"
                }
                Recommendation::InfectionControl => {
                    "Implementare măsuri stricte de control infecții"
                }
            },
        }
    }
}

/// Evaluate every rule in its fixed order. `organ_estimate` is the raw
/// estimate, not the weighted component.
pub fn generate(
    components: &RiskComponents,
    organ_estimate: u32,
    risk_percentage: f64,
) -> Vec<Recommendation> {
    let rules = [
        (components.temporal > 20, Recommendation::IntensiveMonitoring),
        (components.devices > 15, Recommendation::DeviceReassessment),
        (components.antibiotics > 10, Recommendation::AntibioticReview),
        (components.inflammation > 15, Recommendation::InflammatoryWorkup),
        (organ_estimate > 6, Recommendation::IntensiveCareEvaluation),
        (risk_percentage > 60.0, Recommendation::InfectionControl),
    ];

    rules
        .into_iter()
        .filter_map(|(fired, recommendation)| fired.then_some(recommendation))
        .collect()
}
