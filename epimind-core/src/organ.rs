//! SOFA-style organ-failure estimate.
//!
//! Explicit sub-scores win over inference. Without them, four organ systems
//! are graded 0–4 from vitals and labs and the grades are summed.

use crate::PatientRecord;

/// Which side of a threshold counts as worse.
#[derive(Debug, Clone, Copy)]
enum Worse {
    Below,
    Above,
}

/// Four thresholds ordered from the worst tier (4) down to tier 1.
#[derive(Debug, Clone, Copy)]
struct TierTable {
    thresholds: [f64; 4],
    worse: Worse,
}

impl TierTable {
    fn grade(&self, value: f64) -> u32 {
        for (index, threshold) in self.thresholds.iter().enumerate() {
            let hit = match self.worse {
                Worse::Below => value < *threshold,
                Worse::Above => value > *threshold,
            };
            if hit {
                return 4 - index as u32;
            }
        }
        0
    }
}

const OXYGEN_SATURATION: TierTable = TierTable {
    thresholds: [85.0, 90.0, 95.0, 98.0],
    worse: Worse::Below,
};

const PLATELETS: TierTable = TierTable {
    thresholds: [20.0, 50.0, 100.0, 150.0],
    worse: Worse::Below,
};

const BILIRUBIN: TierTable = TierTable {
    thresholds: [12.0, 6.0, 2.0, 1.2],
    worse: Worse::Above,
};

const CREATININE: TierTable = TierTable {
    thresholds: [5.0, 3.5, 2.0, 1.2],
    worse: Worse::Above,
};

/// Raw organ-failure estimate (uncapped, before weighting).
pub fn estimate_organ_failure(record: &PatientRecord) -> u32 {
    if let Some(explicit) = explicit_total(record) {
        return explicit;
    }

    let oxygen = record
        .vital_signs
        .as_ref()
        .and_then(|vitals| vitals.oxygen_saturation);
    let labs = record.lab_results.as_ref();

    let inferred: u32 = [
        (OXYGEN_SATURATION, oxygen),
        (PLATELETS, labs.and_then(|labs| labs.platelets)),
        (BILIRUBIN, labs.and_then(|labs| labs.bilirubin)),
        (CREATININE, labs.and_then(|labs| labs.creatinine)),
    ]
    .into_iter()
    .filter_map(|(table, value)| value.map(|value| table.grade(value)))
    .sum();

    tracing::debug!(inferred, "organ failure inferred from vitals and labs");
    inferred
}

fn explicit_total(record: &PatientRecord) -> Option<u32> {
    let sofa = record.sofa_components.as_ref()?;
    let mut present = sofa.present().peekable();
    present.peek()?;
    Some(present.map(u32::from).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LabResults, SofaComponents, VitalSigns};

    fn with_labs(labs: LabResults) -> PatientRecord {
        PatientRecord {
            lab_results: Some(labs),
            ..PatientRecord::default()
        }
    }

    #[test]
    fn empty_record_has_no_organ_failure() {
        assert_eq!(estimate_organ_failure(&PatientRecord::default()), 0);
    }

    #[test]
    fn explicit_components_take_precedence() {
        let record = PatientRecord {
            sofa_components: Some(SofaComponents {
                respiratory: Some(2),
                renal: Some(3),
                ..SofaComponents::default()
            }),
            lab_results: Some(LabResults {
                creatinine: Some(6.0),
                platelets: Some(10.0),
                ..LabResults::default()
            }),
            ..PatientRecord::default()
        };
        assert_eq!(estimate_organ_failure(&record), 5);
    }

    #[test]
    fn empty_explicit_group_falls_back_to_inference() {
        let record = PatientRecord {
            sofa_components: Some(SofaComponents::default()),
            lab_results: Some(LabResults {
                creatinine: Some(2.5),
                ..LabResults::default()
            }),
            ..PatientRecord::default()
        };
        assert_eq!(estimate_organ_failure(&record), 2);
    }

    #[test]
    fn oxygen_saturation_tiers() {
        let cases = [
            (84.0, 4),
            (85.0, 3),
            (89.9, 3),
            (90.0, 2),
            (94.0, 2),
            (95.0, 1),
            (97.9, 1),
            (98.0, 0),
        ];
        for (spo2, expected) in cases {
            let record = PatientRecord {
                vital_signs: Some(VitalSigns {
                    oxygen_saturation: Some(spo2),
                    ..VitalSigns::default()
                }),
                ..PatientRecord::default()
            };
            assert_eq!(estimate_organ_failure(&record), expected, "SpO2 {spo2}");
        }
    }

    #[test]
    fn platelet_tiers() {
        let cases = [
            (19.0, 4),
            (20.0, 3),
            (49.0, 3),
            (50.0, 2),
            (99.0, 2),
            (100.0, 1),
            (149.0, 1),
            (150.0, 0),
        ];
        for (platelets, expected) in cases {
            let record = with_labs(LabResults {
                platelets: Some(platelets),
                ..LabResults::default()
            });
            assert_eq!(estimate_organ_failure(&record), expected, "platelets {platelets}");
        }
    }

    #[test]
    fn bilirubin_and_creatinine_use_strict_upper_thresholds() {
        let cases = [
            (12.5, 5.5, 8),
            (12.0, 5.0, 6),
            (6.0, 3.5, 4),
            (2.0, 2.0, 2),
            (1.3, 1.3, 2),
            (1.2, 1.2, 0),
        ];
        for (bilirubin, creatinine, expected) in cases {
            let record = with_labs(LabResults {
                bilirubin: Some(bilirubin),
                creatinine: Some(creatinine),
                ..LabResults::default()
            });
            assert_eq!(
                estimate_organ_failure(&record),
                expected,
                "bilirubin {bilirubin}, creatinine {creatinine}"
            );
        }
    }

    #[test]
    fn inferred_signals_add_up() {
        let record = PatientRecord {
            vital_signs: Some(VitalSigns {
                oxygen_saturation: Some(88.0),
                ..VitalSigns::default()
            }),
            lab_results: Some(LabResults {
                platelets: Some(40.0),
                bilirubin: Some(3.0),
                creatinine: Some(1.5),
                ..LabResults::default()
            }),
            ..PatientRecord::default()
        };
        assert_eq!(estimate_organ_failure(&record), 3 + 3 + 2 + 1);
    }
}
