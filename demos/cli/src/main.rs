use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use epimind_core::{
    calculate_risk_with, is_premature, AssessmentConfig, Language, PatientRecord,
    PlausibilityWarning, RiskAssessment,
};
use epimind_extract::extract_medical_data;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "epimind-cli",
    about = "Estimate healthcare-associated infection risk from clinical notes."
)]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a partial patient record from one note.
    Extract {
        #[arg(short, long)]
        text: String,
    },
    /// Score a patient record stored as JSON.
    Score {
        /// Path to the record JSON file.
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long, value_enum, default_value_t = LanguageArg::En)]
        language: LanguageArg,
    },
    /// Merge one note per line into a running record, then score it.
    Session {
        /// Path to a text file with one note per line.
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long, value_enum, default_value_t = LanguageArg::En)]
        language: LanguageArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LanguageArg {
    En,
    Ro,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::En => Language::English,
            LanguageArg::Ro => Language::Romanian,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<&'a PatientRecord>,
    risk_label: &'static str,
    assessment: RiskAssessment,
    implausible_values: Vec<PlausibilityWarning>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Extract { text } => {
            let record = extract_medical_data(&text);
            if record.is_empty() {
                tracing::warn!("no medical fields recognized in the note");
            }
            print_json(&record)?;
        }
        Command::Score { input, language } => {
            let data = std::fs::read_to_string(&input)
                .with_context(|| format!("Cannot read file {:?}", input))?;
            let record = PatientRecord::from_json_str(&data)
                .with_context(|| format!("Invalid patient record in {:?}", input))?;
            let config = config_for(language);
            print_json(&report(&record, &config, false))?;
        }
        Command::Session { input, language } => {
            let data = std::fs::read_to_string(&input)
                .with_context(|| format!("Cannot read file {:?}", input))?;

            let mut record = PatientRecord::default();
            for (line_number, note) in data.lines().enumerate() {
                let note = note.trim();
                if note.is_empty() {
                    continue;
                }
                let extracted = extract_medical_data(note);
                tracing::info!(
                    line = line_number + 1,
                    recognized = !extracted.is_empty(),
                    "note processed"
                );
                record.merge(extracted);
            }

            let config = config_for(language);
            print_json(&report(&record, &config, true))?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn config_for(language: LanguageArg) -> AssessmentConfig {
    AssessmentConfig {
        language: language.into(),
        ..AssessmentConfig::default()
    }
}

fn report<'a>(
    record: &'a PatientRecord,
    config: &AssessmentConfig,
    include_record: bool,
) -> Report<'a> {
    if is_premature(record, config) {
        tracing::warn!(
            minimum_hours = config.minimum_observation_hours,
            "hospitalization shorter than the observation window; result may be premature"
        );
    }
    let assessment = calculate_risk_with(record, config);
    Report {
        record: include_record.then_some(record),
        risk_label: assessment.risk_level.label(config.language),
        assessment,
        implausible_values: record.implausible_values(),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Cannot serialize output")?;
    println!("{json}");
    Ok(())
}
