//! Pattern tables for bilingual (Romanian/English) clinical notes.
//!
//! Every table is compiled once and evaluated by the loops in `lib.rs`.
//! Patterns are case-insensitive.

use std::sync::LazyLock;

use epimind_core::Sex;
use regex::Regex;

/// How a duration capture converts to hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DurationUnit {
    Days,
    Hours,
    /// The unit is the rule's second capture group.
    Captured,
}

/// One step of the hospitalization cascade; lower priority wins.
pub(crate) struct DurationRule {
    pub name: &'static str,
    pub priority: u8,
    pub regex: Regex,
    pub unit: DurationUnit,
}

/// A keyword group mapping to one canonical name. Hits lying inside an
/// `exclude` phrase belong to another group and do not count.
pub(crate) struct TermRule {
    pub regex: Regex,
    pub exclude: Option<Regex>,
    pub canonical: &'static str,
}

impl TermRule {
    pub fn matches(&self, text: &str) -> bool {
        let Some(exclude) = &self.exclude else {
            return self.regex.is_match(text);
        };
        let excluded: Vec<_> = exclude.find_iter(text).map(|phrase| phrase.range()).collect();
        self.regex.find_iter(text).any(|hit| {
            !excluded
                .iter()
                .any(|span| span.start <= hit.start() && hit.end() <= span.end)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Measurement {
    Crp,
    Procalcitonin,
    Leukocytes,
    Platelets,
    Creatinine,
    Bilirubin,
    Temperature,
    HeartRate,
    OxygenSaturation,
    RespiratoryRate,
}

pub(crate) struct MeasurementRule {
    pub measurement: Measurement,
    pub regex: Regex,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid extraction pattern")
}

pub(crate) static AGE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(?:vârst[aă]|varsta|age|ani|years?)[\s:]*(\d+)|(\d+)\s*(?:de\s+)?(?:ani|years?)\b")
});

/// Male keywords come first so they win when both sexes are mentioned.
pub(crate) static SEX: LazyLock<Vec<(Regex, Sex)>> = LazyLock::new(|| {
    vec![
        (
            compile(r"(?i)\b(?:bărbat|barbat|masculin[aă]?|male)\b"),
            Sex::Male,
        ),
        (
            compile(r"(?i)\b(?:femeie|feminin[aă]?|female)\b"),
            Sex::Female,
        ),
    ]
});

const DAY_WORDS: &str = "zile|zi|days?";
const HOUR_WORDS: &str = "ore|or[aă]|hours?";
/// Romanian puts "de" between numbers from 20 up and their unit.
const UNIT_LINK: &str = r"(?:de\s+)?";

pub(crate) static DURATION: LazyLock<Vec<DurationRule>> = LazyLock::new(|| {
    let mut rules = vec![
        DurationRule {
            name: "admitted-for",
            priority: 1,
            regex: compile(&format!(
                r"(?i)\b(?:internat[aă]?|spitalizat[aă]?|hospitalized)[\s\w]*?\b(?:de|for)\s*(\d+)\s*{UNIT_LINK}({DAY_WORDS}|{HOUR_WORDS})\b"
            )),
            unit: DurationUnit::Captured,
        },
        DurationRule {
            name: "length-of-stay",
            priority: 2,
            regex: compile(&format!(
                r"(?i)(\d+)\s*{UNIT_LINK}({DAY_WORDS}|{HOUR_WORDS})\s*(?:de|of)?\s*(?:internare|spitalizare|hospitalization)"
            )),
            unit: DurationUnit::Captured,
        },
        DurationRule {
            name: "day-number",
            priority: 3,
            regex: compile(r"(?i)\b(?:ziua|day)\s*(\d+)"),
            unit: DurationUnit::Days,
        },
        DurationRule {
            name: "bare-hours",
            priority: 4,
            regex: compile(&format!(r"(?i)(\d+)\s*{UNIT_LINK}(?:{HOUR_WORDS})\b")),
            unit: DurationUnit::Hours,
        },
        DurationRule {
            name: "bare-days",
            priority: 5,
            regex: compile(&format!(r"(?i)(\d+)\s*{UNIT_LINK}(?:{DAY_WORDS})\b")),
            unit: DurationUnit::Days,
        },
    ];
    rules.sort_by_key(|rule| rule.priority);
    rules
});

pub(crate) static DEVICES: LazyLock<Vec<TermRule>> = LazyLock::new(|| {
    vec![
        term_except(
            r"(?i)cateter|catheter|cvp|cvc|central|venos",
            r"(?i)(?:urinary|foley|bladder)\s+catheter|cateter\s+(?:urinar|vezical)\w*|intravenos\w*",
            "Central venous catheter",
        ),
        term_except(
            r"(?i)sond[aă]|\btube\b|intuba[tț]|ventila[tț]|\brespirator\b|mechanical",
            r"(?i)sond[aă]\s+(?:urinar|vezical|foley)\w*|chest tube",
            "Intubation/Ventilation",
        ),
        term(r"(?i)vezical|urinar|foley|bladder", "Urinary catheter"),
        term(r"(?i)drenaj|drain|chest tube", "Drainage"),
        term(r"(?i)pacemaker|stimulator", "Pacemaker"),
    ]
});

pub(crate) static COMORBIDITIES: LazyLock<Vec<TermRule>> = LazyLock::new(|| {
    vec![
        term(r"(?i)diabet", "Diabetes mellitus"),
        term(r"(?i)\b(?:bpoc|copd)\b", "COPD"),
        term(
            r"(?i)insuficien[tț][aă] renal[aă]|boal[aă] renal[aă] cronic[aă]|chronic kidney|renal failure|\bckd\b",
            "Chronic kidney disease",
        ),
        term(
            r"(?i)insuficien[tț][aă] cardiac[aă]|heart failure",
            "Heart failure",
        ),
        term(r"(?i)cancer|neoplas|malign|tumou?r|tumoare", "Malignancy"),
        term(
            r"(?i)imunosupr|immunosuppress|imunodepr|immunocompromised",
            "Immunosuppression",
        ),
    ]
});

/// Name stems; each accepts the Romanian and the English spelling.
pub(crate) static ANTIBIOTICS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)amoxicil+in[a-z]*",
        r"(?i)ceftriaxon[a-z]*",
        r"(?i)vancom[iy]cin[a-z]*",
        r"(?i)meropenem",
        r"(?i)ciprofloxacin[a-z]*",
        r"(?i)metronidazol[a-z]*",
        r"(?i)gentamicin[a-z]*",
        r"(?i)penicil+in[a-z]*",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

pub(crate) static GENERIC_ANTIBIOTIC: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)antibiotic|antibioterapie"));

pub(crate) const UNSPECIFIED_ANTIBIOTIC: &str = "Unspecified antibiotic therapy";

/// Accepts the Romanian decimal comma.
const DECIMAL: &str = r"(\d+(?:[.,]\d+)?)";
const INTEGER: &str = r"(\d+)";

pub(crate) static MEASUREMENTS: LazyLock<Vec<MeasurementRule>> = LazyLock::new(|| {
    vec![
        measurement(Measurement::Crp, r"crp|proteina c reactiv[aă]", DECIMAL),
        measurement(
            Measurement::Procalcitonin,
            r"procalcitonin[aăe]?|pct",
            DECIMAL,
        ),
        measurement(Measurement::Leukocytes, r"leucocite|leukocytes|wbc", DECIMAL),
        measurement(Measurement::Platelets, r"trombocite|platelets|plt", DECIMAL),
        measurement(Measurement::Creatinine, r"creatinin[aăe]?", DECIMAL),
        measurement(
            Measurement::Bilirubin,
            r"bilirubin[aă]?(?:\s+total[aă]?)?",
            DECIMAL,
        ),
        measurement(
            Measurement::Temperature,
            r"temperatur[aă]|temperature|febr[aă]",
            DECIMAL,
        ),
        measurement(Measurement::HeartRate, r"puls|heart rate|\bhr|\bfc", INTEGER),
        measurement(
            Measurement::OxygenSaturation,
            r"spo2|sao2|satura[tț]i[ae]|saturation",
            DECIMAL,
        ),
        measurement(
            Measurement::RespiratoryRate,
            r"frecven[tț][aă] respiratorie|respiratory rate|\brr|\bfr",
            INTEGER,
        ),
    ]
});

fn term(pattern: &str, canonical: &'static str) -> TermRule {
    TermRule {
        regex: compile(pattern),
        exclude: None,
        canonical,
    }
}

fn term_except(pattern: &str, exclude: &str, canonical: &'static str) -> TermRule {
    TermRule {
        exclude: Some(compile(exclude)),
        ..term(pattern, canonical)
    }
}

fn measurement(measurement: Measurement, keywords: &str, value: &str) -> MeasurementRule {
    MeasurementRule {
        measurement,
        regex: compile(&format!(r"(?i)(?:{keywords})[\s:=]*{value}")),
    }
}
