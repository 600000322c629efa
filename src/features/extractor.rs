//! Leakage-free feature extraction
//!
//! Walks the chronologically sorted corpus once. Each match's feature vector
//! is computed from the running history BEFORE the match is recorded into it,
//! so no feature at position i can see position i or later.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::calendar::CalendarFields;
use super::form::{FormEntry, FormSummary, FormWindow};
use super::head_to_head::{pair_key, record_meeting, HeadToHeadAggregate, HeadToHeadTally};
use crate::data::vocabulary::TeamVocabulary;
use crate::{FeatureConfig, MatchRecord, Result, TeamId};

/// Number of features per match
pub const FEATURE_COUNT: usize = 18;

/// Feature names, in vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "home_team_id",
    "away_team_id",
    "home_goals_for_avg",
    "home_goals_against_avg",
    "home_win_rate",
    "home_form_points",
    "home_form_matches",
    "away_goals_for_avg",
    "away_goals_against_avg",
    "away_win_rate",
    "away_form_points",
    "away_form_matches",
    "h2h_home_win_share",
    "h2h_away_win_share",
    "h2h_draw_share",
    "h2h_avg_total_goals",
    "month",
    "weekday",
];

/// Positions of the form-points features, overridden by a form hint
pub const HOME_FORM_POINTS: usize = 5;
pub const AWAY_FORM_POINTS: usize = 10;

/// Fixed-order numeric features of one match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn assemble(
        home: TeamId,
        away: TeamId,
        home_form: &FormSummary,
        away_form: &FormSummary,
        h2h: &HeadToHeadAggregate,
        calendar: CalendarFields,
    ) -> Self {
        let (h2h_home, h2h_away, h2h_draw) = h2h.shares();
        FeatureVector([
            home.0 as f64,
            away.0 as f64,
            home_form.goals_for_avg,
            home_form.goals_against_avg,
            home_form.win_rate,
            home_form.points_avg,
            home_form.matches as f64,
            away_form.goals_for_avg,
            away_form.goals_against_avg,
            away_form.win_rate,
            away_form.points_avg,
            away_form.matches as f64,
            h2h_home,
            h2h_away,
            h2h_draw,
            h2h.avg_total_goals,
            calendar.month as f64,
            calendar.weekday as f64,
        ])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Look up a feature by name
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.0[idx])
    }
}

/// Running per-team form and per-pair head-to-head state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MatchHistoryRepr", into = "MatchHistoryRepr")]
pub struct MatchHistory {
    window: usize,
    forms: BTreeMap<TeamId, FormWindow>,
    head_to_head: BTreeMap<(TeamId, TeamId), HeadToHeadTally>,
}

impl MatchHistory {
    pub fn new(window: usize) -> Self {
        MatchHistory {
            window,
            forms: BTreeMap::new(),
            head_to_head: BTreeMap::new(),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Current form of a team (neutral if it has no history)
    pub fn form(&self, team: TeamId) -> FormSummary {
        self.forms
            .get(&team)
            .map(FormWindow::summary)
            .unwrap_or_else(FormSummary::neutral)
    }

    /// Prior meetings oriented to a fixture
    pub fn head_to_head(&self, home: TeamId, away: TeamId) -> HeadToHeadAggregate {
        self.head_to_head
            .get(&pair_key(home, away))
            .map(|tally| HeadToHeadAggregate::from_tally(tally, home, away))
            .unwrap_or_else(HeadToHeadAggregate::empty)
    }

    /// Features for a fixture given the history so far (call BEFORE `record`)
    pub fn features(&self, home: TeamId, away: TeamId, calendar: CalendarFields) -> FeatureVector {
        FeatureVector::assemble(
            home,
            away,
            &self.form(home),
            &self.form(away),
            &self.head_to_head(home, away),
            calendar,
        )
    }

    /// Append a played match to both teams' histories
    pub fn record(&mut self, home: TeamId, away: TeamId, record: &MatchRecord) {
        let window = self.window;
        let sides = [(home, &record.home_team), (away, &record.away_team)];
        for (id, name) in sides {
            let (Some(outcome), Some(goals_for), Some(goals_against)) = (
                record.outcome_for(name),
                record.goals_for(name),
                record.goals_against(name),
            ) else {
                continue;
            };
            self.forms
                .entry(id)
                .or_insert_with(|| FormWindow::new(window))
                .push(FormEntry {
                    outcome,
                    goals_for,
                    goals_against,
                });
        }

        let tally = self.head_to_head.entry(pair_key(home, away)).or_default();
        record_meeting(tally, home, away, record.result, record.total_goals());
    }

    /// Teams with any recorded history
    pub fn team_count(&self) -> usize {
        self.forms.len()
    }
}

#[derive(Serialize, Deserialize)]
struct MatchHistoryRepr {
    window: usize,
    forms: Vec<(TeamId, FormWindow)>,
    head_to_head: Vec<(TeamId, TeamId, HeadToHeadTally)>,
}

impl From<MatchHistory> for MatchHistoryRepr {
    fn from(history: MatchHistory) -> Self {
        MatchHistoryRepr {
            window: history.window,
            forms: history.forms.into_iter().collect(),
            head_to_head: history
                .head_to_head
                .into_iter()
                .map(|((a, b), tally)| (a, b, tally))
                .collect(),
        }
    }
}

impl From<MatchHistoryRepr> for MatchHistory {
    fn from(repr: MatchHistoryRepr) -> Self {
        MatchHistory {
            window: repr.window,
            forms: repr.forms.into_iter().collect(),
            head_to_head: repr
                .head_to_head
                .into_iter()
                .map(|(a, b, tally)| (pair_key(a, b), tally))
                .collect(),
        }
    }
}

/// Feature rows for a corpus plus the history left after its last match
#[derive(Debug, Clone)]
pub struct ExtractedFeatures {
    pub rows: Vec<FeatureVector>,
    pub history: MatchHistory,
}

/// Computes feature vectors over a sorted corpus
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: &FeatureConfig) -> Self {
        FeatureExtractor {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// One left-to-right pass over chronologically sorted records.
    ///
    /// Every team must be in the vocabulary.
    pub fn extract(
        &self,
        records: &[MatchRecord],
        vocabulary: &TeamVocabulary,
    ) -> Result<ExtractedFeatures> {
        let mut history = MatchHistory::new(self.config.form_window);
        let mut rows = Vec::with_capacity(records.len());

        for record in records {
            let home = vocabulary.require(&record.home_team)?;
            let away = vocabulary.require(&record.away_team)?;
            let calendar = CalendarFields::for_date(record.date, &self.config);

            rows.push(history.features(home, away, calendar));
            history.record(home, away, record);
        }

        log::debug!(
            "Extracted {} feature rows over {} teams",
            rows.len(),
            history.team_count()
        );

        Ok(ExtractedFeatures { rows, history })
    }
}
