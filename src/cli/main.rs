use clap::{Args, Parser, Subcommand};
use healnav::models::{ExistingDisease, Gender, PainLevel, PatientRecord, SeverityLevel, YesNo};
use healnav::processing::message_for_label;
use reqwest::Client;
use std::error::Error;

#[derive(Parser)]
#[command(name = "healnav-cli")]
#[command(about = "HealNav patient priority navigation CLI", long_about = None)]
struct Cli {
    #[arg(short, long, env = "HEALNAV_ENDPOINT", default_value = "http://localhost:8080")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict a priority without queueing the patient
    Predict {
        #[command(flatten)]
        patient: PatientArgs,
    },

    /// Triage a patient and add them to the queue
    Submit {
        #[command(flatten)]
        patient: PatientArgs,
    },

    /// Show the triage queue, most urgent first
    Queue,

    /// Check server health
    Health,
}

/// Symptom form. Defaults match the intake form's initial values.
#[derive(Args)]
struct PatientArgs {
    /// Age in years (1-100)
    #[arg(short, long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=100))]
    age: u32,

    #[arg(short, long, value_enum, default_value_t = Gender::Male)]
    gender: Gender,

    #[arg(long, value_enum, default_value_t = YesNo::No)]
    chest_pain: YesNo,

    #[arg(long, value_enum, default_value_t = YesNo::No)]
    breathlessness: YesNo,

    #[arg(long, value_enum, default_value_t = YesNo::No)]
    fever: YesNo,

    #[arg(short, long, value_enum, default_value_t = PainLevel::Mild)]
    pain_level: PainLevel,

    /// Days the symptoms have lasted (0-14)
    #[arg(short = 'd', long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(0..=14))]
    symptom_duration_days: u32,

    #[arg(short = 'x', long, value_enum, default_value_t = ExistingDisease::None)]
    existing_disease: ExistingDisease,

    #[arg(short, long, value_enum, default_value_t = SeverityLevel::Low)]
    severity_level: SeverityLevel,
}

impl From<PatientArgs> for PatientRecord {
    fn from(args: PatientArgs) -> Self {
        PatientRecord {
            age: args.age,
            gender: args.gender,
            chest_pain: args.chest_pain,
            breathlessness: args.breathlessness,
            fever: args.fever,
            pain_level: args.pain_level,
            symptom_duration_days: args.symptom_duration_days,
            existing_disease: args.existing_disease,
            severity_level: args.severity_level,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Predict { patient } => {
            let record = PatientRecord::from(patient);
            let response = client
                .post(format!("{}/predict", cli.endpoint))
                .json(&record)
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            match body.get("priority_level").and_then(|v| v.as_str()) {
                Some(label) => {
                    println!("Predicted Priority: {}", label);
                    println!("{}", message_for_label(label)?);
                }
                None => println!("{}", serde_json::to_string_pretty(&body)?),
            }
        }

        Commands::Submit { patient } => {
            let record = PatientRecord::from(patient);
            let response = client
                .post(format!("{}/v1/triage", cli.endpoint))
                .json(&record)
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Queue => {
            let response = client
                .get(format!("{}/v1/queue", cli.endpoint))
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Health => {
            let response = client
                .get(format!("{}/health", cli.endpoint))
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
