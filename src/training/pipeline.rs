//! End-to-end training: clean, train the chosen predictor, evaluate

use std::collections::BTreeMap;
use std::fmt;

use super::metrics::{EvaluationReport, HeuristicEvaluation};
use super::split::TrainTestSplit;
use crate::data::cleaner::{CleanedCorpus, CleaningReport, DataCleaner};
use crate::data::ingest::RawMatchRow;
use crate::features::extractor::{FeatureExtractor, AWAY_FORM_POINTS, HOME_FORM_POINTS};
use crate::features::form::NEUTRAL_FORM_POINTS;
use crate::predict::{EnsemblePredictor, Predictor, StrengthHeuristicPredictor};
use crate::{Config, FootballError, FormHint, MatchRecord, Result};

/// Which predictor to train
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PredictorKind {
    Heuristic,
    Ensemble,
}

impl fmt::Display for PredictorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictorKind::Heuristic => write!(f, "heuristic"),
            PredictorKind::Ensemble => write!(f, "ensemble"),
        }
    }
}

/// Held-out evaluation of whichever predictor was trained
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingEvaluation {
    Heuristic(HeuristicEvaluation),
    Ensemble(EvaluationReport),
}

impl fmt::Display for TrainingEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingEvaluation::Heuristic(eval) => write!(f, "{}", eval),
            TrainingEvaluation::Ensemble(report) => write!(f, "{}", report),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub predictor: Predictor,
    pub report: CleaningReport,
    pub evaluation: TrainingEvaluation,
}

/// Clean raw rows and train a predictor on them
pub fn train(kind: PredictorKind, rows: Vec<RawMatchRow>, config: &Config) -> Result<TrainingOutcome> {
    let cleaner = DataCleaner::new(&config.cleaning);
    let corpus = cleaner.clean(rows);
    log::info!("{}", corpus.report);
    train_corpus(kind, &cleaner, corpus, config)
}

/// Train from records that are already clean and chronologically sorted
pub fn train_from_records(
    kind: PredictorKind,
    records: Vec<MatchRecord>,
    config: &Config,
) -> Result<TrainingOutcome> {
    let cleaner = DataCleaner::new(&config.cleaning);
    let vocabulary = cleaner.build_vocabulary(&records);
    let report = CleaningReport {
        total_rows: records.len(),
        kept: records.len(),
        ..Default::default()
    };
    let corpus = CleanedCorpus {
        records,
        vocabulary,
        report,
    };
    train_corpus(kind, &cleaner, corpus, config)
}

fn train_corpus(
    kind: PredictorKind,
    cleaner: &DataCleaner,
    corpus: CleanedCorpus,
    config: &Config,
) -> Result<TrainingOutcome> {
    if corpus.records.is_empty() {
        return Err(FootballError::Ingest(format!(
            "no valid matches left after cleaning ({} rows read)",
            corpus.report.total_rows
        )));
    }

    log::info!(
        "Training {} model on {} matches, {} teams",
        kind,
        corpus.records.len(),
        corpus.vocabulary.len()
    );

    let (predictor, evaluation) = match kind {
        PredictorKind::Heuristic => {
            let evaluation = evaluate_heuristic(&corpus, cleaner, config)?;
            log::info!("Heuristic held-out: {}", evaluation);
            let model =
                StrengthHeuristicPredictor::train(&corpus.records, &config.heuristic, cleaner.aliases().clone())?;
            (Predictor::from(model), TrainingEvaluation::Heuristic(evaluation))
        }
        PredictorKind::Ensemble => {
            let model = EnsemblePredictor::train(&corpus, config)?;
            let evaluation = TrainingEvaluation::Ensemble(model.evaluation().clone());
            (Predictor::from(model), evaluation)
        }
    };

    Ok(TrainingOutcome {
        predictor,
        report: corpus.report,
        evaluation,
    })
}

/// Fit on the earliest matches and score the chronological tail.
///
/// A held-out match is scored only when its home side had at least
/// `min_form_matches` earlier matches; its form hint is the causal
/// form-points average of each side.
fn evaluate_heuristic(
    corpus: &CleanedCorpus,
    cleaner: &DataCleaner,
    config: &Config,
) -> Result<HeuristicEvaluation> {
    let records = &corpus.records;
    let split = TrainTestSplit::chronological(records.len(), config.ensemble.test_fraction);
    if split.test.is_empty() {
        return Ok(HeuristicEvaluation::default());
    }

    let train_records = TrainTestSplit::select(records, &split.train);
    let model =
        StrengthHeuristicPredictor::train(&train_records, &config.heuristic, cleaner.aliases().clone())?;

    let extracted = FeatureExtractor::new(&config.features).extract(records, &corpus.vocabulary)?;

    // Matches each team played before position i
    let mut prior: Vec<usize> = Vec::with_capacity(records.len());
    let mut played: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        prior.push(played.get(record.home_team.as_str()).copied().unwrap_or(0));
        *played.entry(record.home_team.as_str()).or_insert(0) += 1;
        *played.entry(record.away_team.as_str()).or_insert(0) += 1;
    }

    let mut eval = HeuristicEvaluation::default();
    for &i in &split.test {
        if prior[i] < config.heuristic.min_form_matches {
            eval.skipped += 1;
            continue;
        }

        let record = &records[i];
        let features = &extracted.rows[i];
        let hint = FormHint {
            home_form_avg: form_points_or_neutral(features.0[HOME_FORM_POINTS], features.0[HOME_FORM_POINTS + 1]),
            away_form_avg: form_points_or_neutral(features.0[AWAY_FORM_POINTS], features.0[AWAY_FORM_POINTS + 1]),
        };

        let prediction = model.predict(&record.home_team, &record.away_team, Some(hint));
        eval.record(
            (prediction.home_goals, prediction.away_goals),
            (record.home_goals, record.away_goals),
            prediction.result == record.result,
        );
    }

    Ok(eval)
}

/// Form points when the window holds any matches, else the neutral value
fn form_points_or_neutral(points: f64, matches: f64) -> f64 {
    if matches > 0.0 {
        points
    } else {
        NEUTRAL_FORM_POINTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoostingConfig, ForestConfig, ModelKind};

    fn raw(date: &str, home: &str, away: &str, hg: u32, ag: u32, order: usize) -> RawMatchRow {
        let result = if hg > ag {
            "H"
        } else if hg < ag {
            "A"
        } else {
            "D"
        };
        RawMatchRow {
            season: "2019-2020".to_string(),
            date: Some(date.to_string()),
            home_team: Some(home.to_string()),
            away_team: Some(away.to_string()),
            home_goals: Some(hg.to_string()),
            away_goals: Some(ag.to_string()),
            result: Some(result.to_string()),
            source_order: order,
        }
    }

    fn rows() -> Vec<RawMatchRow> {
        let teams = ["Burnley", "Fulham", "Leeds", "Watford"];
        let mut rows = Vec::new();
        for week in 0..10u32 {
            for (i, home) in teams.iter().enumerate() {
                let away = teams[(i + 1 + week as usize % 3) % teams.len()];
                let hg = (i as u32 + week) % 3;
                let ag = (week + 1) % 2;
                let date = format!("{:02}/{:02}/2019", 1 + week + i as u32, 9 + week / 10);
                rows.push(raw(&date, home, away, hg, ag, rows.len()));
            }
        }
        rows
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.ensemble.goals = BoostingConfig {
            n_estimators: 10,
            max_depth: 2,
            ..Default::default()
        };
        config.ensemble.result = ForestConfig {
            n_estimators: 8,
            max_depth: 3,
            ..Default::default()
        };
        config
    }

    #[test]
    fn test_train_heuristic() {
        let outcome = train(PredictorKind::Heuristic, rows(), &small_config()).unwrap();
        assert_eq!(outcome.predictor.kind(), ModelKind::Heuristic);
        assert_eq!(outcome.report.kept, 40);

        match outcome.evaluation {
            TrainingEvaluation::Heuristic(eval) => {
                // ceil(40 * 0.2) held out
                assert_eq!(eval.evaluated + eval.skipped, 8);
                assert!(eval.correct_results <= eval.evaluated);
            }
            other => panic!("unexpected evaluation {:?}", other),
        }

        let prediction = outcome.predictor.predict("Leeds", "Fulham", None);
        assert!((prediction.probabilities.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_train_ensemble() {
        let outcome = train(PredictorKind::Ensemble, rows(), &small_config()).unwrap();
        assert_eq!(outcome.predictor.kind(), ModelKind::Ensemble);
        match outcome.evaluation {
            TrainingEvaluation::Ensemble(report) => {
                assert_eq!(report.train_size, 32);
                assert_eq!(report.test_size, 8);
            }
            other => panic!("unexpected evaluation {:?}", other),
        }
    }

    #[test]
    fn test_heuristic_is_scored_on_later_matches_only() {
        // Eight weeks of 2-0 home wins, then two weeks of 0-2 away wins
        let teams = ["Burnley", "Fulham", "Leeds", "Watford"];
        let mut rows = Vec::new();
        for week in 0..10u32 {
            let (hg, ag) = if week < 8 { (2, 0) } else { (0, 2) };
            let date = format!("{:02}/09/2019", 1 + week * 2);
            for (i, home) in teams.iter().enumerate() {
                let away = teams[(i + 1 + week as usize % 3) % teams.len()];
                rows.push(raw(&date, home, away, hg, ag, rows.len()));
            }
        }

        let outcome = train(PredictorKind::Heuristic, rows, &small_config()).unwrap();
        match outcome.evaluation {
            TrainingEvaluation::Heuristic(eval) => {
                // Only the last 8 matches are held out, and the model fitted on the
                // first 32 has never seen an away win
                assert_eq!(eval.evaluated, 8);
                assert_eq!(eval.skipped, 0);
                assert_eq!(eval.correct_results, 0);
                assert_eq!(eval.goal_error_total, 32);
                assert_eq!(eval.avg_goal_error(), 4.0);
            }
            other => panic!("unexpected evaluation {:?}", other),
        }
    }

    #[test]
    fn test_oversized_goal_count_is_dropped_not_fatal() {
        let rows = vec![
            RawMatchRow {
                home_goals: Some("4294967295".to_string()),
                ..raw("13/08/2016", "Arsenal", "Chelsea", 0, 0, 0)
            },
            raw("20/08/2016", "Chelsea", "Arsenal", 0, 1, 1),
        ];
        let outcome = train(PredictorKind::Heuristic, rows, &small_config()).unwrap();
        assert_eq!(outcome.report.invalid_goals, 1);
        assert_eq!(outcome.report.kept, 1);
    }

    #[test]
    fn test_min_form_matches_skips_early_matches() {
        let mut config = small_config();
        config.heuristic.min_form_matches = 1000;
        let outcome = train(PredictorKind::Heuristic, rows(), &config).unwrap();
        match outcome.evaluation {
            TrainingEvaluation::Heuristic(eval) => {
                assert_eq!(eval.evaluated, 0);
                assert_eq!(eval.skipped, 8);
                assert_eq!(eval.accuracy(), 0.0);
            }
            other => panic!("unexpected evaluation {:?}", other),
        }
    }

    #[test]
    fn test_empty_corpus_is_an_ingest_error() {
        for kind in [PredictorKind::Heuristic, PredictorKind::Ensemble] {
            let err = train(kind, Vec::new(), &small_config()).unwrap_err();
            assert!(matches!(err, FootballError::Ingest(_)));
        }
    }

    #[test]
    fn test_all_rows_invalid_is_an_ingest_error() {
        let mut bad = raw("01/08/2019", "Leeds", "Fulham", 1, 0, 0);
        bad.home_goals = Some("x".to_string());
        let err = train(PredictorKind::Heuristic, vec![bad], &small_config()).unwrap_err();
        assert!(matches!(err, FootballError::Ingest(_)));
    }

    #[test]
    fn test_train_from_records_matches_train() {
        let config = small_config();
        let corpus = DataCleaner::new(&config.cleaning).clean(rows());
        let from_rows = train(PredictorKind::Heuristic, rows(), &config).unwrap();
        let from_records = train_from_records(PredictorKind::Heuristic, corpus.records, &config).unwrap();
        assert_eq!(from_rows.predictor, from_records.predictor);
        assert_eq!(from_rows.evaluation, from_records.evaluation);
    }
}
