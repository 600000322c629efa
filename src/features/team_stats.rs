//! Whole-corpus team statistics
//!
//! Aggregate per-team rates used by the strength heuristic. Unlike the
//! rolling features these are not causal: every match in the corpus counts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{MatchRecord, MatchResult};

/// Running totals for a team
#[derive(Debug, Clone, Default)]
pub struct TeamStatistics {
    pub matches_played: usize,
    pub points: u32,
    pub goals_for: u32,
    pub goals_against: u32,
}

impl TeamStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update statistics with a match result
    pub fn update(&mut self, record: &MatchRecord, team: &str) {
        let (Some(goals_for), Some(goals_against), Some(outcome)) = (
            record.goals_for(team),
            record.goals_against(team),
            record.outcome_for(team),
        ) else {
            return;
        };

        self.matches_played += 1;
        self.points += outcome.points();
        self.goals_for += goals_for;
        self.goals_against += goals_against;
    }

    /// Per-match rates; None before the first match
    pub fn profile(&self) -> Option<TeamProfile> {
        if self.matches_played == 0 {
            return None;
        }
        let n = self.matches_played as f64;
        Some(TeamProfile {
            strength: self.points as f64 / n,
            attack: self.goals_for as f64 / n,
            defense: self.goals_against as f64 / n,
            matches_played: self.matches_played,
        })
    }
}

/// Per-team rates over the training corpus
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamProfile {
    /// League points per match, 0-3
    pub strength: f64,
    /// Goals scored per match
    pub attack: f64,
    /// Goals conceded per match (lower is better)
    pub defense: f64,
    pub matches_played: usize,
}

impl TeamProfile {
    /// Stand-in for a team never seen in training
    pub fn neutral() -> Self {
        TeamProfile {
            strength: 1.5,
            attack: 1.3,
            defense: 1.3,
            matches_played: 0,
        }
    }
}

/// Compute statistics for all teams over a set of matches
#[derive(Debug, Default)]
pub struct TeamStatisticsComputer {
    stats: BTreeMap<String, TeamStatistics>,
    total_matches: usize,
    home_wins: usize,
}

impl TeamStatisticsComputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process matches and build statistics
    pub fn process_matches(&mut self, matches: &[MatchRecord]) {
        for record in matches {
            self.stats
                .entry(record.home_team.clone())
                .or_default()
                .update(record, &record.home_team);
            self.stats
                .entry(record.away_team.clone())
                .or_default()
                .update(record, &record.away_team);

            self.total_matches += 1;
            if record.result == MatchResult::HomeWin {
                self.home_wins += 1;
            }
        }
    }

    pub fn get(&self, team: &str) -> Option<&TeamStatistics> {
        self.stats.get(team)
    }

    /// Share of processed matches won by the home side
    pub fn home_win_rate(&self) -> Option<f64> {
        if self.total_matches == 0 {
            None
        } else {
            Some(self.home_wins as f64 / self.total_matches as f64)
        }
    }

    pub fn total_matches(&self) -> usize {
        self.total_matches
    }

    /// Profiles of every team with at least one match
    pub fn profiles(&self) -> BTreeMap<String, TeamProfile> {
        self.stats
            .iter()
            .filter_map(|(team, stats)| stats.profile().map(|p| (team.clone(), p)))
            .collect()
    }
}
