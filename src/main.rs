//! Football Match Prediction CLI
//!
//! Imports season result files, trains a strength heuristic or a tree
//! ensemble, and predicts scorelines with outcome probabilities.

use clap::{Parser, Subcommand, ValueEnum};
use football::training::PredictorKind;
use football::{Config, Result};

#[derive(Parser)]
#[command(name = "football")]
#[command(about = "Football match prediction from historical results", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Train a prediction model and save it
    Train {
        /// Model to train
        #[arg(long, value_enum, default_value = "ensemble")]
        model: PredictorKind,
    },
    /// Predict a match
    Predict {
        /// Home team name
        home: String,
        /// Away team name
        away: String,
        /// Home side's recent form (average points per match, 0-3)
        #[arg(long)]
        home_form: Option<f64>,
        /// Away side's recent form (average points per match, 0-3)
        #[arg(long)]
        away_form: Option<f64>,
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Import season CSV files into the match store
    Import {
        /// CSV files, in chronological order
        files: Vec<String>,
        /// Import every matching CSV in a directory instead
        #[arg(long)]
        dir: Option<String>,
    },
    /// Show database status
    Status,
    /// List known teams
    Teams,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Import { files, dir } => commands::data_import(&config, files, dir),
            DataCommands::Status => commands::data_status(&config),
            DataCommands::Teams => commands::data_teams(&config),
        },
        Commands::Train { model } => commands::train(&config, model),
        Commands::Predict {
            home,
            away,
            home_form,
            away_form,
            format,
        } => commands::predict(&config, &home, &away, home_form, away_form, format),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use football::data::{CorpusSummary, DataCleaner, DataIngestor, Database};
    use football::predict::{self, ModelHandle, Predictor, ProbabilityEngine};
    use football::training::{self, TrainingOutcome};
    use football::{FootballError, FormHint, PredictionResult};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all(&config.data.source_dir)?;
        std::fs::create_dir_all("model")?;
        println!("Created {}/ and model/ directories", config.data.source_dir);

        println!("\nNext steps:");
        println!(
            "  1. Put season files ({}*.csv) in {}/",
            config.data.source_prefix, config.data.source_dir
        );
        println!("  2. Run 'football data import --dir {}'", config.data.source_dir);
        println!("  3. Run 'football train --model ensemble' to train the model");
        println!("  4. Run 'football predict \"Team A\" \"Team B\"' to make predictions");

        Ok(())
    }

    fn ingestor(config: &Config, files: Vec<String>, dir: Option<String>) -> Result<DataIngestor> {
        if let Some(dir) = dir {
            DataIngestor::discover(&dir, &config.data.source_prefix)
        } else if files.is_empty() {
            DataIngestor::discover(&config.data.source_dir, &config.data.source_prefix)
        } else {
            Ok(DataIngestor::new(files.as_slice()).with_prefix(&config.data.source_prefix))
        }
    }

    pub fn data_import(config: &Config, files: Vec<String>, dir: Option<String>) -> Result<()> {
        let ingestor = ingestor(config, files, dir)?;
        println!("Reading {} source file(s)...", ingestor.sources().len());
        let rows = ingestor.load()?;

        let corpus = DataCleaner::new(&config.cleaning).clean(rows);
        println!("{}", corpus.report);
        if corpus.records.is_empty() {
            println!("No valid matches found. Check the files' columns (Date, HomeTeam, AwayTeam, FTHG, FTAG, FTR).");
            return Ok(());
        }

        let mut db = Database::open(&config.data.database_path)?;
        let count = db.upsert_matches(&corpus.records)?;
        println!("Stored {} matches in database", count);

        let summary = CorpusSummary::from_records(&corpus.records);
        println!(
            "  {} teams over {} season(s) | avg goals {:.2} | H/D/A {:.1}% / {:.1}% / {:.1}%",
            summary.total_teams,
            summary.seasons.len(),
            summary.avg_total_goals,
            summary.home_win_rate * 100.0,
            summary.draw_rate * 100.0,
            summary.away_win_rate * 100.0
        );

        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:     {}", config.data.database_path);
        println!("  Teams:    {}", stats.team_count);
        println!("  Matches:  {}", stats.match_count);
        println!("  Seasons:  {}", stats.season_count);
        if let (Some(earliest), Some(latest)) = (stats.earliest_match, stats.latest_match) {
            println!("  Range:    {} to {}", earliest, latest);
        }

        if stats.match_count > 0 {
            let summary = CorpusSummary::from_records(&db.get_all_matches()?);
            println!("  Avg home goals: {:.2}", summary.avg_home_goals);
            println!("  Avg away goals: {:.2}", summary.avg_away_goals);
            println!(
                "  Results H/D/A:  {:.1}% / {:.1}% / {:.1}%",
                summary.home_win_rate * 100.0,
                summary.draw_rate * 100.0,
                summary.away_win_rate * 100.0
            );
        }

        Ok(())
    }

    pub fn data_teams(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let teams = db.get_team_names()?;
        if teams.is_empty() {
            println!("No teams yet. Run 'football data import' first.");
            return Ok(());
        }
        for team in &teams {
            println!("{}", team);
        }
        println!("\n{} teams", teams.len());
        Ok(())
    }

    /// Train from the match store, or from the source directory when the store is empty
    fn train_model(config: &Config, kind: PredictorKind) -> Result<TrainingOutcome> {
        let db = Database::open(&config.data.database_path)?;
        let records = db.get_all_matches()?;
        if records.is_empty() {
            log::info!(
                "Match store is empty; reading {}*.csv from {}",
                config.data.source_prefix,
                config.data.source_dir
            );
            let rows = DataIngestor::discover(&config.data.source_dir, &config.data.source_prefix)?.load()?;
            training::train(kind, rows, config)
        } else {
            println!("Loaded {} matches from database", records.len());
            training::train_from_records(kind, records, config)
        }
    }

    pub fn train(config: &Config, kind: PredictorKind) -> Result<()> {
        println!("Training {} model...", kind);
        let outcome = train_model(config, kind)?;

        println!("\nHeld-out evaluation");
        println!("───────────────────────────────");
        println!("{}", outcome.evaluation);

        predict::save(&outcome.predictor, &config.data.model_path)?;
        println!("\nModel saved to {}", config.data.model_path);
        Ok(())
    }

    /// Saved model, or a heuristic trained on the spot if none can be loaded
    fn load_or_fallback(config: &Config) -> Result<Predictor> {
        match predict::load(&config.data.model_path) {
            Ok(predictor) => Ok(predictor),
            Err(e @ FootballError::Persistence { .. }) => {
                log::warn!("{}; falling back to the strength heuristic", e);
                Ok(train_model(config, PredictorKind::Heuristic)?.predictor)
            }
            Err(e) => Err(e),
        }
    }

    pub fn predict(
        config: &Config,
        home: &str,
        away: &str,
        home_form: Option<f64>,
        away_form: Option<f64>,
        format: OutputFormat,
    ) -> Result<()> {
        let handle = ModelHandle::new(load_or_fallback(config)?);

        let hint = match (home_form, away_form) {
            (None, None) => None,
            (home_form, away_form) => {
                let neutral = FormHint::default();
                Some(FormHint {
                    home_form_avg: home_form.unwrap_or(neutral.home_form_avg),
                    away_form_avg: away_form.unwrap_or(neutral.away_form_avg),
                })
            }
        };

        let prediction = handle.predict(home, away, hint)?;
        match format {
            OutputFormat::Table => print!("{}", format_prediction(&prediction, home, away)),
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "home": home,
                    "away": away,
                    "prediction": prediction,
                });
                let text = serde_json::to_string_pretty(&json)
                    .map_err(|e| FootballError::Config(format!("Failed to format prediction: {}", e)))?;
                println!("{}", text);
            }
        }

        Ok(())
    }

    fn format_prediction(prediction: &PredictionResult, home: &str, away: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!("{} vs {}\n", home, away));
        out.push_str("───────────────────────────────\n");
        out.push_str(&format!(
            "  Score:       {} - {}  (expected {:.2} - {:.2})\n",
            prediction.home_goals,
            prediction.away_goals,
            prediction.expected_home_goals,
            prediction.expected_away_goals
        ));
        let (mode_home, mode_away) = ProbabilityEngine::new()
            .most_likely_score(prediction.expected_home_goals, prediction.expected_away_goals);
        out.push_str(&format!("  Modal score: {} - {}\n", mode_home, mode_away));
        out.push_str(&format!("  Result:      {}\n", prediction.result));
        out.push_str(&format!(
            "  Home/Draw/Away: {:.1}% / {:.1}% / {:.1}%\n",
            prediction.probabilities.home * 100.0,
            prediction.probabilities.draw * 100.0,
            prediction.probabilities.away * 100.0
        ));
        out.push_str(&format!("  Confidence:  {:.1}%\n", prediction.confidence * 100.0));
        out.push_str(&format!("  Model:       {}\n", prediction.model));
        out
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let predictor = predict::load(&config.data.model_path)?;

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:   {}", config.data.model_path);
        println!("  Kind:   {}", predictor.kind());

        match &predictor {
            Predictor::Heuristic(model) => {
                println!("  Teams:          {}", model.team_count());
                println!("  Home advantage: {:.3}", model.home_advantage());
                println!("  Form weight:    {:.2}", model.form_weight());
            }
            Predictor::Ensemble(model) => {
                println!("  Teams:  {}", model.vocabulary().len());
                println!("\n{}", model.evaluation());
                println!("\nTop features (result):");
                for (rank, f) in model.importances().result.iter().take(5).enumerate() {
                    println!("  {}. {:<24} {:.3}", rank + 1, f.feature, f.importance);
                }
            }
        }

        Ok(())
    }
}
