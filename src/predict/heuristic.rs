//! Closed-form team-strength predictor
//!
//! Trained in one pass over the whole corpus: per-team points, goals-for and
//! goals-against rates plus a league-wide home advantage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::vocabulary::AliasTable;
use crate::features::team_stats::{TeamProfile, TeamStatisticsComputer};
use crate::{
    FootballError, FormHint, HeuristicConfig, MatchRecord, MatchResult, ModelKind,
    OutcomeProbabilities, PredictionResult, Result,
};

/// Win rate of a home side with no advantage
const BASELINE_HOME_WIN_RATE: f64 = 1.0 / 3.0;
/// Ceiling on the probability given to the predicted outcome
const MAX_RESULT_PROBABILITY: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthHeuristicPredictor {
    profiles: BTreeMap<String, TeamProfile>,
    home_advantage: f64,
    form_weight: f64,
    aliases: AliasTable,
}

impl StrengthHeuristicPredictor {
    /// Aggregate team profiles over every record
    pub fn train(records: &[MatchRecord], config: &HeuristicConfig, aliases: AliasTable) -> Result<Self> {
        if records.is_empty() {
            return Err(FootballError::Ingest(
                "cannot train the heuristic on an empty corpus".to_string(),
            ));
        }

        let mut computer = TeamStatisticsComputer::new();
        computer.process_matches(records);

        let home_win_rate = computer.home_win_rate().unwrap_or(BASELINE_HOME_WIN_RATE);
        let home_advantage = (home_win_rate - BASELINE_HOME_WIN_RATE).max(0.0);
        let profiles = computer.profiles();

        log::info!(
            "Heuristic trained on {} matches: {} teams, home advantage {:.3}",
            records.len(),
            profiles.len(),
            home_advantage
        );

        Ok(Self::from_parts(profiles, home_advantage, config.form_weight, aliases))
    }

    pub fn from_parts(
        profiles: BTreeMap<String, TeamProfile>,
        home_advantage: f64,
        form_weight: f64,
        aliases: AliasTable,
    ) -> Self {
        StrengthHeuristicPredictor {
            profiles,
            home_advantage,
            form_weight,
            aliases,
        }
    }

    pub fn home_advantage(&self) -> f64 {
        self.home_advantage
    }

    pub fn form_weight(&self) -> f64 {
        self.form_weight
    }

    pub fn team_count(&self) -> usize {
        self.profiles.len()
    }

    /// Profile of a team, if it appeared in training
    pub fn profile(&self, team: &str) -> Option<&TeamProfile> {
        let canonical = self.aliases.canonical(team);
        self.profiles.get(&canonical).or_else(|| {
            self.profiles
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(&canonical))
                .map(|(_, p)| p)
        })
    }

    /// Expected goals for each side; unknown teams use the neutral profile
    pub fn expected_goals(&self, home: &str, away: &str, hint: Option<FormHint>) -> (f64, f64) {
        let hint = hint.unwrap_or_default();
        let home_profile = self.profile(home).copied().unwrap_or_else(TeamProfile::neutral);
        let away_profile = self.profile(away).copied().unwrap_or_else(TeamProfile::neutral);

        let home_strength = self.adjusted_strength(&home_profile, hint.home_form_avg);
        let away_strength = self.adjusted_strength(&away_profile, hint.away_form_avg);

        let expected_home = home_profile.attack
            * (2.0 - away_profile.defense)
            * (1.0 + self.home_advantage)
            * (0.8 + 0.4 * home_strength / 3.0);
        let expected_away = away_profile.attack
            * (2.0 - home_profile.defense)
            * (1.0 - self.home_advantage)
            * (0.8 + 0.4 * away_strength / 3.0);

        (expected_home.max(0.0), expected_away.max(0.0))
    }

    fn adjusted_strength(&self, profile: &TeamProfile, form_avg: f64) -> f64 {
        profile.strength + (form_avg - 1.5) * self.form_weight
    }

    pub fn predict(&self, home: &str, away: &str, hint: Option<FormHint>) -> PredictionResult {
        let form = hint.unwrap_or_default();
        let (expected_home, expected_away) = self.expected_goals(home, away, Some(form));

        let home_goals = expected_home.round() as u32;
        let away_goals = expected_away.round() as u32;
        let result = MatchResult::from_goals(home_goals, away_goals);
        let gap = home_goals.abs_diff(away_goals) as f64;

        let scalar = match result {
            MatchResult::HomeWin => 0.4 + gap * 0.15 + self.home_advantage,
            MatchResult::AwayWin => 0.4 + gap * 0.15,
            MatchResult::Draw => {
                let home_profile = self.profile(home).copied().unwrap_or_else(TeamProfile::neutral);
                let away_profile = self.profile(away).copied().unwrap_or_else(TeamProfile::neutral);
                let diff = self.adjusted_strength(&home_profile, form.home_form_avg)
                    - self.adjusted_strength(&away_profile, form.away_form_avg);
                0.3 + diff.abs() * 0.1
            }
        }
        .clamp(0.0, MAX_RESULT_PROBABILITY);

        let rest = 1.0 - scalar;
        let probabilities = match result {
            MatchResult::HomeWin => OutcomeProbabilities {
                home: scalar,
                draw: rest * 0.4,
                away: rest * 0.6,
            },
            MatchResult::AwayWin => OutcomeProbabilities {
                home: rest * 0.6,
                draw: rest * 0.4,
                away: scalar,
            },
            MatchResult::Draw => OutcomeProbabilities {
                home: rest * 0.5,
                draw: scalar,
                away: rest * 0.5,
            },
        }
        .normalized();

        PredictionResult {
            home_goals,
            away_goals,
            result,
            confidence: probabilities.max(),
            probabilities,
            expected_home_goals: expected_home,
            expected_away_goals: expected_away,
            model: ModelKind::Heuristic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn profile(strength: f64, attack: f64, defense: f64) -> TeamProfile {
        TeamProfile {
            strength,
            attack,
            defense,
            matches_played: 38,
        }
    }

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

    fn predictor() -> StrengthHeuristicPredictor {
        let mut profiles = BTreeMap::new();
        profiles.insert("Home FC".to_string(), profile(1.5, 1.6, 1.0));
        profiles.insert("Away FC".to_string(), profile(1.2, 1.1, 1.3));
        StrengthHeuristicPredictor::from_parts(profiles, 0.10, 0.3, AliasTable::standard())
    }

    #[test]
    fn test_expected_home_goals_formula() {
        let (home, _) = predictor().expected_goals("Home FC", "Away FC", None);
        // 1.6 * (2.0 - 1.3) * 1.1 * (0.8 + 0.4 * 1.5 / 3.0)
        assert!((home - 1.232).abs() < 1e-12);
    }

    #[test]
    fn test_form_hint_shifts_strength() {
        let p = predictor();
        let (base, _) = p.expected_goals("Home FC", "Away FC", None);
        let hint = FormHint {
            home_form_avg: 3.0,
            away_form_avg: 1.5,
        };
        let (boosted, _) = p.expected_goals("Home FC", "Away FC", Some(hint));
        // strength 1.5 + 1.5 * 0.3 = 1.95
        let expected = 1.6 * (2.0 - 1.3) * 1.1 * (0.8 + 0.4 * 1.95 / 3.0);
        assert!((boosted - expected).abs() < 1e-12);
        assert!(boosted > base);
    }

    #[test]
    fn test_probability_split_for_home_win() {
        let mut profiles = BTreeMap::new();
        profiles.insert("Strong".to_string(), profile(2.5, 2.4, 0.8));
        profiles.insert("Weak".to_string(), profile(0.8, 0.9, 0.9));
        let p = StrengthHeuristicPredictor::from_parts(profiles, 0.1, 0.3, AliasTable::empty());

        let prediction = p.predict("Strong", "Weak", None);
        assert_eq!(prediction.result, MatchResult::HomeWin);
        assert!(prediction.home_goals > prediction.away_goals);

        let gap = (prediction.home_goals - prediction.away_goals) as f64;
        let scalar = (0.4 + gap * 0.15 + 0.1).min(0.9);
        let probs = prediction.probabilities;
        assert!((probs.home - scalar).abs() < 1e-12);
        assert!((probs.draw - (1.0 - scalar) * 0.4).abs() < 1e-12);
        assert!((probs.away - (1.0 - scalar) * 0.6).abs() < 1e-12);
        assert!((probs.sum() - 1.0).abs() < 1e-6);
        assert_eq!(prediction.confidence, probs.max());
    }

    #[test]
    fn test_unknown_teams_use_neutral_profile() {
        let p = predictor();
        let prediction = p.predict("Nowhere Town", "Atlantis United", None);
        let neutral = TeamProfile::neutral();
        let expected = neutral.attack * (2.0 - neutral.defense) * 1.1 * (0.8 + 0.4 * 1.5 / 3.0);
        assert!((prediction.expected_home_goals - expected).abs() < 1e-12);
        assert!((prediction.probabilities.sum() - 1.0).abs() < 1e-6);
        assert_eq!(prediction.model, ModelKind::Heuristic);
    }

    #[test]
    fn test_draw_confidence_is_max_probability() {
        let p = predictor();
        let prediction = p.predict("Nowhere Town", "Atlantis United", None);
        // Neutral teams: 1.001 vs 0.819 expected goals, both round to 1
        assert_eq!(prediction.result, MatchResult::Draw);
        // Equal strengths give a draw scalar of 0.3, so each win gets 0.35
        assert!((prediction.probabilities.draw - 0.3).abs() < 1e-12);
        assert!((prediction.confidence - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_train_home_advantage_and_profiles() {
        let records = vec![
            make_match("Arsenal", "Chelsea", 2, 0),
            make_match("Chelsea", "Arsenal", 1, 0),
            make_match("Arsenal", "Everton", 3, 1),
            make_match("Everton", "Chelsea", 1, 1),
        ];
        let p = StrengthHeuristicPredictor::train(&records, &HeuristicConfig::default(), AliasTable::standard())
            .unwrap();

        // 3 home wins in 4
        assert!((p.home_advantage() - (0.75 - 1.0 / 3.0)).abs() < 1e-12);
        let arsenal = p.profile("arsenal").unwrap();
        assert_eq!(arsenal.strength, 2.0);
        assert_eq!(arsenal.attack, 5.0 / 3.0);
        assert_eq!(p.team_count(), 3);
    }

    #[test]
    fn test_home_advantage_never_negative() {
        let records = vec![make_match("Arsenal", "Chelsea", 0, 2)];
        let p = StrengthHeuristicPredictor::train(&records, &HeuristicConfig::default(), AliasTable::empty())
            .unwrap();
        assert_eq!(p.home_advantage(), 0.0);
    }

    #[test]
    fn test_empty_corpus_is_an_ingest_error() {
        let err = StrengthHeuristicPredictor::train(&[], &HeuristicConfig::default(), AliasTable::empty())
            .unwrap_err();
        assert!(matches!(err, FootballError::Ingest(_)));
    }
}
