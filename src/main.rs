// src/main.rs
// agent-protocol CLI - inspect modes, split clarification payloads, check
// answer alignment, and extract solve units from saved model responses

use agent_protocol::{
    ClarificationTurn, ClarifierAnswer,
    config::{EnvConfig, ProtocolConfig},
    modes::{all_mode_specs, get_mode_spec},
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "agent-protocol")]
#[command(about = "Response interpretation and protocol control for code-generating agents")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.agent-protocol/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every run mode and the stages it enables
    Modes,

    /// Show one mode (case-insensitive)
    Mode {
        /// Mode name; defaults to the configured mode
        name: Option<String>,
    },

    /// Split a clarification payload into sub-questions
    Split {
        /// Payload file (default: stdin)
        file: Option<PathBuf>,
    },

    /// Check clarifier answers against the sub-questions of a payload
    Align {
        /// Clarification payload file
        #[arg(short, long)]
        questions: PathBuf,

        /// JSON array of answer records
        #[arg(short, long)]
        answers: PathBuf,
    },

    /// Extract the solve unit from a raw model response
    Extract {
        /// Response file (default: stdin)
        file: Option<PathBuf>,

        /// Include strategy and syntax diagnostics
        #[arg(long)]
        report: bool,
    },

    /// Print the resolved configuration
    Config,
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(path: Option<&Path>, env: &EnvConfig) -> Result<ProtocolConfig> {
    let config = match path {
        Some(path) => ProtocolConfig::load_from(path)?,
        None => ProtocolConfig::load()?,
    };
    Ok(config.with_env(env))
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv(); // Load .env from current directory

    let cli = Cli::parse();
    let env = EnvConfig::from_env();

    let log_level = match (cli.verbose, env.debug) {
        (_, true) | (2.., _) => Level::DEBUG,
        (1, _) => Level::INFO,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(cli.config.as_deref(), &env)?;

    match cli.command {
        Commands::Modes => print_json(&all_mode_specs())?,
        Commands::Mode { name } => {
            let spec = get_mode_spec(name.as_deref().unwrap_or(&config.run.mode))?;
            print_json(&spec)?;
        }
        Commands::Split { file } => {
            let payload = read_input(file.as_deref())?;
            print_json(&ClarificationTurn::from_payload(&payload))?;
        }
        Commands::Align { questions, answers } => {
            let turn = ClarificationTurn::from_payload(&read_input(Some(questions.as_path()))?);
            let answers: Vec<ClarifierAnswer> = serde_json::from_str(&read_input(Some(answers.as_path()))?)
                .context("Answers must be a JSON array of answer records")?;
            let result = turn.validate(&answers);
            info!(valid = result.is_valid, reason = %result.reason, "Alignment checked");
            print_json(&result)?;
        }
        Commands::Extract { file, report } => {
            let raw = read_input(file.as_deref())?;
            let extractor = config.solution_extractor()?;
            if report {
                print_json(&extractor.extract_with_report(&raw))?;
            } else {
                print_json(&extractor.extract(&raw))?;
            }
        }
        Commands::Config => {
            // Fail loudly on a bad mode rather than printing it as if valid
            config.resolve_mode()?;
            print_json(&config)?;
        }
    }

    Ok(())
}
