use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde_json::Value;
use std::path::PathBuf;

mod analysis;
mod config;
mod error;
mod estimator;
mod foods;
mod models;
mod normalizer;
mod output;
mod predictor;
mod profile;
mod schema;
mod training;

use crate::analysis::{AnalysisRequest, AppState};
use crate::config::Config;
use crate::foods::FoodTable;
use crate::profile::RawProfile;
use crate::training::Trainer;

#[derive(Parser)]
#[command(name = "nutri-risk")]
#[command(about = "Estimate diet-driven health risks from a food diary entry")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one food diary entry against a user profile
    Analyze {
        /// JSON request file: {"userInfo": {...}, "foodText": "..."}
        #[arg(short, long, conflicts_with_all = ["text", "gender", "age", "height", "weight", "smoking"])]
        request: Option<PathBuf>,

        /// Free-text description of what was eaten
        #[arg(short, long)]
        text: Option<String>,

        #[arg(long)]
        gender: Option<String>,

        #[arg(long)]
        age: Option<String>,

        /// Height in cm
        #[arg(long)]
        height: Option<String>,

        /// Weight in kg
        #[arg(long)]
        weight: Option<String>,

        /// Smoking history code 0-3
        #[arg(long)]
        smoking: Option<String>,

        /// Directory for the analysis record
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List known foods
    Foods {
        /// Case-insensitive name filter (at least 2 characters)
        #[arg(short, long)]
        query: Option<String>,

        /// Maximum number of matches when filtering
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Fit the normalizer and classifiers from a health dataset
    Train {
        /// Processed health dataset CSV
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Where to write the model bundle
        #[arg(long)]
        out: Option<PathBuf>,

        /// Random seed for the train/test split
        #[arg(short, long)]
        seed: Option<u64>,

        /// Directory for the training report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    // Load configuration
    let config = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("loading configuration from {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
            config
        },
        None => Config::default(),
    };

    match cli.command {
        Command::Analyze { request, text, gender, age, height, weight, smoking, output } => {
            // Build request
            let request = match request {
                Some(path) => {
                    let content = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading request {:?}", path))?;
                    serde_json::from_str::<AnalysisRequest>(&content)
                        .with_context(|| format!("parsing request {:?}", path))?
                },
                None => AnalysisRequest {
                    user_info: RawProfile {
                        gender: gender.map(Value::String),
                        age: age.map(Value::String),
                        height: height.map(Value::String),
                        weight: weight.map(Value::String),
                        smoking: smoking.map(Value::String),
                    },
                    food_text: text.unwrap_or_default(),
                },
            };

            // Load resources and run analysis
            let state = AppState::load(&config.resources);
            let response = analysis::handle(&state, &request);
            println!("{}", serde_json::to_string_pretty(&response)?);

            // Save results
            if let Some(dir) = output {
                output::save_analysis(&output::AnalysisRecord::new(&request, &response), &dir)?;
            }
        },

        Command::Foods { query, limit } => {
            // Load food table
            let foods = if config.resources.foods.exists() {
                FoodTable::from_path(&config.resources.foods)
                    .with_context(|| format!("loading foods from {:?}", config.resources.foods))?
            } else {
                warn!("Food data file {:?} not found", config.resources.foods);
                FoodTable::default()
            };

            let names: Vec<&str> = match &query {
                Some(q) => foods.search(q, limit),
                None => foods.names().collect(),
            };
            println!("{}", serde_json::to_string_pretty(&names)?);
        },

        Command::Train { dataset, out, seed, output } => {
            // Apply command-line overrides
            let mut settings = config.training.clone();
            if let Some(path) = dataset {
                settings.dataset = path;
            }
            if let Some(seed) = seed {
                settings.seed = seed;
            }
            let out = out.unwrap_or_else(|| config.resources.model.clone());

            // Load dataset
            let rows = training::load_dataset(&settings.dataset)
                .with_context(|| format!("loading dataset {:?}", settings.dataset))?;

            // Run training
            let mut trainer = Trainer::new(settings)?;
            let (bundle, report) = trainer.train(&rows)?;

            // Save results
            bundle.save(&out).with_context(|| format!("saving model bundle to {:?}", out))?;
            info!("Model bundle saved to {:?}", out);
            println!("{}", serde_json::to_string_pretty(&report)?);

            if let Some(dir) = output {
                output::save_training_report(&report, &dir)?;
            }
        },
    }

    Ok(())
}
