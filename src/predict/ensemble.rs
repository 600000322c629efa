//! Tree-ensemble predictor
//!
//! Three regressors over the causal feature vectors: boosted trees for home
//! and away goals, and a random forest for the ordinal result (away win = 0,
//! draw = 1, home win = 2). Inputs are standardised with statistics from the
//! training partition only.

use serde::{Deserialize, Serialize};

use super::probability::ProbabilityEngine;
use crate::data::cleaner::CleanedCorpus;
use crate::data::vocabulary::TeamVocabulary;
use crate::features::calendar::CalendarFields;
use crate::features::extractor::{
    FeatureExtractor, FeatureVector, MatchHistory, AWAY_FORM_POINTS, FEATURE_NAMES,
    HOME_FORM_POINTS,
};
use crate::model::{
    rank_importances, FeatureImportance, GradientBoostedTrees, RandomForest, Regressor,
    StandardScaler,
};
use crate::training::metrics::{thresholded_accuracy, EvaluationReport, RegressionMetrics};
use crate::training::split::TrainTestSplit;
use crate::{
    Config, FootballError, FormHint, MatchResult, ModelKind, PredictionResult, Result, TeamId,
};

/// Ranked feature importances of each sub-model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleImportances {
    pub home_goals: Vec<FeatureImportance>,
    pub away_goals: Vec<FeatureImportance>,
    pub result: Vec<FeatureImportance>,
}

/// A trained ensemble; immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsemblePredictor {
    vocabulary: TeamVocabulary,
    scaler: StandardScaler,
    home_goals: GradientBoostedTrees,
    away_goals: GradientBoostedTrees,
    result: RandomForest,
    /// Form and head-to-head state after the last training match
    history: MatchHistory,
    neutral_month: u32,
    neutral_weekday: u32,
    importances: EnsembleImportances,
    evaluation: EvaluationReport,
}

impl EnsemblePredictor {
    /// Extract features, split, scale, fit the three regressors and evaluate
    pub fn train(corpus: &CleanedCorpus, config: &Config) -> Result<Self> {
        if corpus.records.is_empty() {
            return Err(FootballError::Ingest(
                "cannot train the ensemble on an empty corpus".to_string(),
            ));
        }

        let extractor = FeatureExtractor::new(&config.features);
        let extracted = extractor.extract(&corpus.records, &corpus.vocabulary)?;

        let rows: Vec<Vec<f64>> = extracted.rows.iter().map(|r| r.as_slice().to_vec()).collect();
        let home_targets: Vec<f64> = corpus.records.iter().map(|r| r.home_goals as f64).collect();
        let away_targets: Vec<f64> = corpus.records.iter().map(|r| r.away_goals as f64).collect();
        let result_targets: Vec<f64> = corpus.records.iter().map(|r| r.result.ordinal()).collect();

        let split = TrainTestSplit::new(rows.len(), config.ensemble.test_fraction, config.ensemble.seed);
        let train_rows = TrainTestSplit::select(&rows, &split.train);
        let test_rows = TrainTestSplit::select(&rows, &split.test);

        let scaler = StandardScaler::fit(&train_rows);
        let train_x = scaler.transform_all(&train_rows);
        let test_x = scaler.transform_all(&test_rows);

        log::info!("Fitting home goals booster...");
        let home_goals = GradientBoostedTrees::fit(
            &train_x,
            &TrainTestSplit::select(&home_targets, &split.train),
            &config.ensemble.goals,
        )?;
        log::info!("Fitting away goals booster...");
        let away_goals = GradientBoostedTrees::fit(
            &train_x,
            &TrainTestSplit::select(&away_targets, &split.train),
            &config.ensemble.goals,
        )?;
        log::info!("Fitting result forest...");
        let result = RandomForest::fit(
            &train_x,
            &TrainTestSplit::select(&result_targets, &split.train),
            &config.ensemble.result,
            config.ensemble.seed,
        )?;

        let evaluation = {
            let predict_goals = |model: &GradientBoostedTrees| -> Vec<f64> {
                test_x.iter().map(|x| model.predict(x).max(0.0)).collect()
            };
            let result_predictions: Vec<f64> = test_x.iter().map(|x| result.predict(x)).collect();

            EvaluationReport {
                train_size: split.train.len(),
                test_size: split.test.len(),
                home_goals: RegressionMetrics::from_predictions(
                    &TrainTestSplit::select(&home_targets, &split.test),
                    &predict_goals(&home_goals),
                ),
                away_goals: RegressionMetrics::from_predictions(
                    &TrainTestSplit::select(&away_targets, &split.test),
                    &predict_goals(&away_goals),
                ),
                result_accuracy: thresholded_accuracy(
                    &TrainTestSplit::select(&result_targets, &split.test),
                    &result_predictions,
                ),
            }
        };

        let importances = EnsembleImportances {
            home_goals: rank_importances(&FEATURE_NAMES, home_goals.feature_importances()),
            away_goals: rank_importances(&FEATURE_NAMES, away_goals.feature_importances()),
            result: rank_importances(&FEATURE_NAMES, result.feature_importances()),
        };

        log::info!("Home goals: {}", evaluation.home_goals);
        log::info!("Away goals: {}", evaluation.away_goals);
        log::info!(
            "Result accuracy: {:.2}% | overall score {:.3}",
            evaluation.result_accuracy * 100.0,
            evaluation.overall_score()
        );
        for (label, ranking) in [
            ("home goals", &importances.home_goals),
            ("away goals", &importances.away_goals),
            ("result", &importances.result),
        ] {
            let top: Vec<String> = ranking
                .iter()
                .take(3)
                .map(|f| format!("{} {:.3}", f.feature, f.importance))
                .collect();
            log::info!("Top features ({}): {}", label, top.join(", "));
        }

        Ok(EnsemblePredictor {
            vocabulary: corpus.vocabulary.clone(),
            scaler,
            home_goals,
            away_goals,
            result,
            history: extracted.history,
            neutral_month: config.features.neutral_month,
            neutral_weekday: config.features.neutral_weekday,
            importances,
            evaluation,
        })
    }

    pub fn vocabulary(&self) -> &TeamVocabulary {
        &self.vocabulary
    }

    pub fn importances(&self) -> &EnsembleImportances {
        &self.importances
    }

    pub fn evaluation(&self) -> &EvaluationReport {
        &self.evaluation
    }

    /// Feature vector a fixture between two known teams would get next
    pub fn fixture_features(&self, home: TeamId, away: TeamId, hint: Option<FormHint>) -> FeatureVector {
        let calendar = CalendarFields {
            month: self.neutral_month,
            weekday: self.neutral_weekday,
        };
        let mut features = self.history.features(home, away, calendar);
        if let Some(hint) = hint {
            features.0[HOME_FORM_POINTS] = hint.home_form_avg;
            features.0[AWAY_FORM_POINTS] = hint.away_form_avg;
        }
        features
    }

    /// Predict a fixture; an unknown team yields the neutral default
    pub fn predict(&self, home: &str, away: &str, hint: Option<FormHint>) -> PredictionResult {
        let ids = self
            .vocabulary
            .require(home)
            .and_then(|h| self.vocabulary.require(away).map(|a| (h, a)));
        let (home_id, away_id) = match ids {
            Ok(ids) => ids,
            Err(e) => {
                log::debug!("{}; returning neutral prediction", e);
                return PredictionResult::neutral_default();
            }
        };

        let features = self.fixture_features(home_id, away_id, hint);
        let x = self.scaler.transform(features.as_slice());

        let expected_home = self.home_goals.predict(&x).max(0.0);
        let expected_away = self.away_goals.predict(&x).max(0.0);
        let result = MatchResult::from_ordinal(self.result.predict(&x));
        let probabilities = ProbabilityEngine::new().outcome_probabilities(expected_home, expected_away);

        PredictionResult {
            home_goals: expected_home.round() as u32,
            away_goals: expected_away.round() as u32,
            result,
            confidence: probabilities.max(),
            probabilities,
            expected_home_goals: expected_home,
            expected_away_goals: expected_away,
            model: ModelKind::Ensemble,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cleaner::DataCleaner;
    use crate::{BoostingConfig, ForestConfig, MatchRecord};
    use chrono::NaiveDate;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.ensemble.goals = BoostingConfig {
            n_estimators: 20,
            max_depth: 3,
            ..Default::default()
        };
        config.ensemble.result = ForestConfig {
            n_estimators: 15,
            max_depth: 4,
            ..Default::default()
        };
        config
    }

    fn corpus() -> CleanedCorpus {
        let teams = ["Arsenal", "Chelsea", "Everton", "Liverpool", "Stoke"];
        let mut records = Vec::new();
        let start = NaiveDate::from_ymd_opt(2015, 8, 8).unwrap();
        let mut order = 0;
        for round in 0..6 {
            for (i, home) in teams.iter().enumerate() {
                for (j, away) in teams.iter().enumerate() {
                    if i == j || (i + j + round) % 3 != 0 {
                        continue;
                    }
                    // Lower-indexed sides are stronger
                    let home_goals = ((5 - i) as u32 + round as u32 % 2) / 2;
                    let away_goals = ((5 - j) as u32) / 3;
                    records.push(MatchRecord {
                        date: start.checked_add_days(chrono::Days::new((round * 7 + i) as u64)),
                        season: "2015-2016".to_string(),
                        home_team: home.to_string(),
                        away_team: away.to_string(),
                        home_goals,
                        away_goals,
                        result: MatchResult::from_goals(home_goals, away_goals),
                        source_order: order,
                    });
                    order += 1;
                }
            }
        }
        records.sort_by_key(|r| (r.sort_key(), r.source_order));
        let vocabulary = DataCleaner::default().build_vocabulary(&records);
        CleanedCorpus {
            records,
            vocabulary,
            report: Default::default(),
        }
    }

    #[test]
    fn test_train_and_predict() {
        let model = EnsemblePredictor::train(&corpus(), &small_config()).unwrap();

        let prediction = model.predict("Arsenal", "Stoke", None);
        assert_eq!(prediction.model, ModelKind::Ensemble);
        assert!((prediction.probabilities.sum() - 1.0).abs() < 1e-6);
        assert!(prediction.expected_home_goals >= 0.0);
        assert!(prediction.expected_away_goals >= 0.0);
        assert_eq!(prediction.confidence, prediction.probabilities.max());
        assert!(prediction.confidence > 0.0 && prediction.confidence <= 1.0);

        let eval = model.evaluation();
        assert!(eval.test_size > 0);
        assert_eq!(eval.train_size + eval.test_size, corpus().records.len());
        assert!(eval.result_accuracy >= 0.0 && eval.result_accuracy <= 1.0);

        assert_eq!(model.importances().home_goals.len(), FEATURE_NAMES.len());
    }

    #[test]
    fn test_unknown_team_returns_neutral_default() {
        let model = EnsemblePredictor::train(&corpus(), &small_config()).unwrap();
        let prediction = model.predict("Arsenal", "NoSuchTeam FC", None);
        assert_eq!(prediction, PredictionResult::neutral_default());
        assert_eq!(prediction.result, MatchResult::Draw);
    }

    #[test]
    fn test_training_is_reproducible() {
        let a = EnsemblePredictor::train(&corpus(), &small_config()).unwrap();
        let b = EnsemblePredictor::train(&corpus(), &small_config()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.predict("Chelsea", "Everton", None), b.predict("Chelsea", "Everton", None));
    }

    #[test]
    fn test_form_hint_overrides_form_points() {
        let model = EnsemblePredictor::train(&corpus(), &small_config()).unwrap();
        let home = model.vocabulary().require("Arsenal").unwrap();
        let away = model.vocabulary().require("Stoke").unwrap();
        let hint = FormHint {
            home_form_avg: 2.8,
            away_form_avg: 0.2,
        };
        let features = model.fixture_features(home, away, Some(hint));
        assert_eq!(features.get("home_form_points"), Some(2.8));
        assert_eq!(features.get("away_form_points"), Some(0.2));
        assert_eq!(features.get("month"), Some(6.0));
    }

    #[test]
    fn test_empty_corpus_is_an_ingest_error() {
        let empty = CleanedCorpus {
            records: Vec::new(),
            vocabulary: DataCleaner::default().build_vocabulary(&[]),
            report: Default::default(),
        };
        let err = EnsemblePredictor::train(&empty, &small_config()).unwrap_err();
        assert!(matches!(err, FootballError::Ingest(_)));
    }
}
