//! Football match prediction from historical results
//!
//! Causal feature extraction over time-ordered match history, a closed-form
//! team-strength heuristic, a tree-ensemble regression model, and a Poisson
//! converter from expected goals to outcome probabilities.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod training;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub use data::cleaner::ValidationError;

/// Integer id of a team in a trained vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.0)
    }
}

/// Full-time result of a match, seen from the home side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    #[serde(rename = "H")]
    HomeWin,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "A")]
    AwayWin,
}

impl MatchResult {
    /// Single-letter FTR code
    pub fn code(&self) -> char {
        match self {
            MatchResult::HomeWin => 'H',
            MatchResult::Draw => 'D',
            MatchResult::AwayWin => 'A',
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "H" => Some(MatchResult::HomeWin),
            "D" => Some(MatchResult::Draw),
            "A" => Some(MatchResult::AwayWin),
            _ => None,
        }
    }

    /// Derive the result from a scoreline
    pub fn from_goals(home_goals: u32, away_goals: u32) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => MatchResult::HomeWin,
            std::cmp::Ordering::Less => MatchResult::AwayWin,
            std::cmp::Ordering::Equal => MatchResult::Draw,
        }
    }

    /// Ordinal regression target: away win = 0, draw = 1, home win = 2
    pub fn ordinal(&self) -> f64 {
        match self {
            MatchResult::AwayWin => 0.0,
            MatchResult::Draw => 1.0,
            MatchResult::HomeWin => 2.0,
        }
    }

    /// Map a continuous ordinal estimate back to a result.
    ///
    /// Below 0.5 is an away win, above 1.5 a home win, anything between a draw.
    pub fn from_ordinal(value: f64) -> Self {
        if value < 0.5 {
            MatchResult::AwayWin
        } else if value > 1.5 {
            MatchResult::HomeWin
        } else {
            MatchResult::Draw
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::HomeWin => write!(f, "Home win"),
            MatchResult::Draw => write!(f, "Draw"),
            MatchResult::AwayWin => write!(f, "Away win"),
        }
    }
}

/// Outcome of a match from one team's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamOutcome {
    Win,
    Draw,
    Loss,
}

impl TeamOutcome {
    /// League points: win = 3, draw = 1, loss = 0
    pub fn points(&self) -> u32 {
        match self {
            TeamOutcome::Win => 3,
            TeamOutcome::Draw => 1,
            TeamOutcome::Loss => 0,
        }
    }
}

/// A cleaned match record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: Option<NaiveDate>,
    pub season: String,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub result: MatchResult,
    /// Position of the source row in concatenated file order
    pub source_order: usize,
}

impl MatchRecord {
    /// Check if a team played in this match
    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    /// Goals scored by a team, None if it did not play
    pub fn goals_for(&self, team: &str) -> Option<u32> {
        if team == self.home_team {
            Some(self.home_goals)
        } else if team == self.away_team {
            Some(self.away_goals)
        } else {
            None
        }
    }

    /// Goals conceded by a team, None if it did not play
    pub fn goals_against(&self, team: &str) -> Option<u32> {
        if team == self.home_team {
            Some(self.away_goals)
        } else if team == self.away_team {
            Some(self.home_goals)
        } else {
            None
        }
    }

    /// Outcome for a team according to the recorded result code
    pub fn outcome_for(&self, team: &str) -> Option<TeamOutcome> {
        let is_home = if team == self.home_team {
            true
        } else if team == self.away_team {
            false
        } else {
            return None;
        };

        Some(match (self.result, is_home) {
            (MatchResult::Draw, _) => TeamOutcome::Draw,
            (MatchResult::HomeWin, true) | (MatchResult::AwayWin, false) => TeamOutcome::Win,
            _ => TeamOutcome::Loss,
        })
    }

    pub fn total_goals(&self) -> u32 {
        self.home_goals + self.away_goals
    }

    /// Chronological sort key; undated records sort first
    pub fn sort_key(&self) -> (i32, u32, u32) {
        use chrono::Datelike;
        self.date
            .map(|d| (d.year(), d.month(), d.day()))
            .unwrap_or((0, 0, 0))
    }
}

/// Three-way outcome probability distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProbabilities {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl OutcomeProbabilities {
    /// Uniform distribution
    pub fn uniform() -> Self {
        OutcomeProbabilities {
            home: 1.0 / 3.0,
            draw: 1.0 / 3.0,
            away: 1.0 / 3.0,
        }
    }

    /// Scale so the three components sum to 1; falls back to uniform on zero mass
    pub fn normalized(self) -> Self {
        let total = (self.home + self.away) + self.draw;
        if total > 0.0 && total.is_finite() {
            OutcomeProbabilities {
                home: self.home / total,
                draw: self.draw / total,
                away: self.away / total,
            }
        } else {
            Self::uniform()
        }
    }

    pub fn sum(&self) -> f64 {
        self.home + self.draw + self.away
    }

    /// Largest component
    pub fn max(&self) -> f64 {
        self.home.max(self.draw).max(self.away)
    }

    pub fn get(&self, result: MatchResult) -> f64 {
        match result {
            MatchResult::HomeWin => self.home,
            MatchResult::Draw => self.draw,
            MatchResult::AwayWin => self.away,
        }
    }
}

/// Which model produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Heuristic,
    Ensemble,
    /// Neutral fallback for teams outside the vocabulary
    Default,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Heuristic => write!(f, "heuristic"),
            ModelKind::Ensemble => write!(f, "ensemble"),
            ModelKind::Default => write!(f, "default"),
        }
    }
}

/// Optional current-form inputs (average league points per match, 0-3)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormHint {
    pub home_form_avg: f64,
    pub away_form_avg: f64,
}

impl Default for FormHint {
    fn default() -> Self {
        FormHint {
            home_form_avg: 1.5,
            away_form_avg: 1.5,
        }
    }
}

/// Model prediction output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub home_goals: u32,
    pub away_goals: u32,
    pub result: MatchResult,
    pub probabilities: OutcomeProbabilities,
    /// Largest of the three outcome probabilities
    pub confidence: f64,
    pub expected_home_goals: f64,
    pub expected_away_goals: f64,
    pub model: ModelKind,
}

impl PredictionResult {
    /// Neutral 1-1 draw with uniform probabilities
    pub fn neutral_default() -> Self {
        let probabilities = OutcomeProbabilities::uniform();
        PredictionResult {
            home_goals: 1,
            away_goals: 1,
            result: MatchResult::Draw,
            confidence: probabilities.max(),
            probabilities,
            expected_home_goals: 1.0,
            expected_away_goals: 1.0,
            model: ModelKind::Default,
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum FootballError {
    #[error("No usable match data: {0}")]
    Ingest(String),

    #[error("Invalid match data: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Model not trained - run `football train` first")]
    Untrained,

    #[error("Model artifact {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FootballError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub cleaning: CleaningConfig,
    pub features: FeatureConfig,
    pub heuristic: HeuristicConfig,
    pub ensemble: EnsembleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub database_path: String,
    pub model_path: String,
    /// Directory scanned for season CSV files
    pub source_dir: String,
    /// File name prefix of season CSV files
    pub source_prefix: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            database_path: "data/football.db".to_string(),
            model_path: "model/football_model.json".to_string(),
            source_dir: "data".to_string(),
            source_prefix: "E0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Keep rows whose date is missing or unparseable instead of dropping them
    pub keep_undated: bool,
    /// Additional alias -> canonical team name mappings
    pub extra_aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Number of prior matches in a form window
    pub form_window: usize,
    /// Month used when a match has no date
    pub neutral_month: u32,
    /// Weekday (0 = Monday) used when a match has no date
    pub neutral_weekday: u32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig {
            form_window: 5,
            neutral_month: 6,
            neutral_weekday: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    pub form_weight: f64,
    /// Minimum prior matches of the home side for a match to be evaluated
    pub min_form_matches: usize,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        HeuristicConfig {
            form_weight: 0.3,
            min_form_matches: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Fraction of rows held out for evaluation
    pub test_fraction: f64,
    pub seed: u64,
    pub goals: BoostingConfig,
    pub result: ForestConfig,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        EnsembleConfig {
            test_fraction: 0.2,
            seed: 42,
            goals: BoostingConfig::default(),
            result: ForestConfig::default(),
        }
    }
}

/// Gradient boosting parameters for the goal regressors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        BoostingConfig {
            n_estimators: 200,
            learning_rate: 0.1,
            max_depth: 6,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Random forest parameters for the ordinal result regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        ForestConfig {
            n_estimators: 300,
            max_depth: 8,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FootballError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| FootballError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FootballError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_match(home: &str, away: &str, hg: u32, ag: u32) -> MatchRecord {
        MatchRecord {
            date: NaiveDate::from_ymd_opt(2016, 8, 13),
            season: "2016-2017".to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_goals: hg,
            away_goals: ag,
            result: MatchResult::from_goals(hg, ag),
            source_order: 0,
        }
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(MatchResult::from_code("H"), Some(MatchResult::HomeWin));
        assert_eq!(MatchResult::from_code(" D "), Some(MatchResult::Draw));
        assert_eq!(MatchResult::from_code("X"), None);
        assert_eq!(MatchResult::AwayWin.code(), 'A');
    }

    #[test]
    fn test_ordinal_thresholds() {
        assert_eq!(MatchResult::from_ordinal(0.49), MatchResult::AwayWin);
        assert_eq!(MatchResult::from_ordinal(0.5), MatchResult::Draw);
        assert_eq!(MatchResult::from_ordinal(1.5), MatchResult::Draw);
        assert_eq!(MatchResult::from_ordinal(1.51), MatchResult::HomeWin);
        assert_eq!(MatchResult::HomeWin.ordinal(), 2.0);
    }

    #[test]
    fn test_team_perspective() {
        let m = make_match("Arsenal", "Chelsea", 1, 3);
        assert_eq!(m.goals_for("Chelsea"), Some(3));
        assert_eq!(m.goals_against("Chelsea"), Some(1));
        assert_eq!(m.outcome_for("Chelsea"), Some(TeamOutcome::Win));
        assert_eq!(m.outcome_for("Arsenal"), Some(TeamOutcome::Loss));
        assert_eq!(m.outcome_for("Everton"), None);
        assert_eq!(m.total_goals(), 4);
    }

    #[test]
    fn test_normalized_probabilities() {
        let p = OutcomeProbabilities {
            home: 2.0,
            draw: 1.0,
            away: 1.0,
        }
        .normalized();
        assert!((p.sum() - 1.0).abs() < 1e-12);
        assert!((p.home - 0.5).abs() < 1e-12);

        let zero = OutcomeProbabilities {
            home: 0.0,
            draw: 0.0,
            away: 0.0,
        }
        .normalized();
        assert_eq!(zero, OutcomeProbabilities::uniform());
    }

    #[test]
    fn test_neutral_default() {
        let p = PredictionResult::neutral_default();
        assert_eq!(p.result, MatchResult::Draw);
        assert_eq!((p.home_goals, p.away_goals), (1, 1));
        assert!((p.probabilities.sum() - 1.0).abs() < 1e-6);
        assert_eq!(p.model, ModelKind::Default);
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config
            .cleaning
            .extra_aliases
            .insert("Spurs FC".to_string(), "Tottenham Hotspur".to_string());
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.features.form_window, 5);
        assert_eq!(parsed.ensemble.goals.n_estimators, 200);
        assert_eq!(parsed.cleaning.extra_aliases.len(), 1);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str("[heuristic]\nform_weight = 0.5\n").unwrap();
        assert_eq!(parsed.heuristic.form_weight, 0.5);
        assert_eq!(parsed.heuristic.min_form_matches, 3);
        assert_eq!(parsed.data.source_prefix, "E0");
    }
}
