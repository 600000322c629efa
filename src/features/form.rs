//! Rolling form windows
//!
//! The last W results of a team, role-agnostic: goals-for are the team's own
//! goals whether it played at home or away.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::TeamOutcome;

/// Neutral averages for a team with no prior matches
pub const NEUTRAL_GOALS_AVG: f64 = 1.5;
pub const NEUTRAL_WIN_RATE: f64 = 0.5;
/// Form-hint points for a side with no history
pub const NEUTRAL_FORM_POINTS: f64 = 1.5;

/// One prior match from a team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormEntry {
    pub outcome: TeamOutcome,
    pub goals_for: u32,
    pub goals_against: u32,
}

/// Bounded history of a team's most recent matches, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormWindow {
    capacity: usize,
    entries: VecDeque<FormEntry>,
}

impl FormWindow {
    pub fn new(capacity: usize) -> Self {
        FormWindow {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a result, evicting the oldest when full
    pub fn push(&mut self, entry: FormEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn entries(&self) -> impl Iterator<Item = &FormEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Aggregate the window; an empty window gives the neutral summary
    pub fn summary(&self) -> FormSummary {
        if self.entries.is_empty() {
            return FormSummary::neutral();
        }

        let n = self.entries.len() as f64;
        let goals_for: u32 = self.entries.iter().map(|e| e.goals_for).sum();
        let goals_against: u32 = self.entries.iter().map(|e| e.goals_against).sum();
        let points: u32 = self.entries.iter().map(|e| e.outcome.points()).sum();
        let wins = self
            .entries
            .iter()
            .filter(|e| e.outcome == TeamOutcome::Win)
            .count();

        FormSummary {
            goals_for_avg: goals_for as f64 / n,
            goals_against_avg: goals_against as f64 / n,
            win_rate: wins as f64 / n,
            points_avg: points as f64 / n,
            matches: self.entries.len(),
        }
    }
}

/// Aggregates over a form window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormSummary {
    pub goals_for_avg: f64,
    pub goals_against_avg: f64,
    pub win_rate: f64,
    /// League points per match, 0-3
    pub points_avg: f64,
    pub matches: usize,
}

impl FormSummary {
    pub fn neutral() -> Self {
        FormSummary {
            goals_for_avg: NEUTRAL_GOALS_AVG,
            goals_against_avg: NEUTRAL_GOALS_AVG,
            win_rate: NEUTRAL_WIN_RATE,
            points_avg: 0.0,
            matches: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(outcome: TeamOutcome, gf: u32, ga: u32) -> FormEntry {
        FormEntry {
            outcome,
            goals_for: gf,
            goals_against: ga,
        }
    }

    #[test]
    fn test_empty_window_is_neutral() {
        let window = FormWindow::new(5);
        let summary = window.summary();
        assert_eq!(summary.goals_for_avg, 1.5);
        assert_eq!(summary.goals_against_avg, 1.5);
        assert_eq!(summary.win_rate, 0.5);
        assert_eq!(summary.points_avg, 0.0);
        assert_eq!(summary.matches, 0);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut window = FormWindow::new(2);
        window.push(entry(TeamOutcome::Loss, 0, 4));
        window.push(entry(TeamOutcome::Win, 2, 0));
        window.push(entry(TeamOutcome::Draw, 1, 1));

        assert_eq!(window.len(), 2);
        let first = window.entries().next().unwrap();
        assert_eq!(first.outcome, TeamOutcome::Win);

        let summary = window.summary();
        assert_eq!(summary.goals_for_avg, 1.5);
        assert_eq!(summary.goals_against_avg, 0.5);
        assert_eq!(summary.win_rate, 0.5);
        assert_eq!(summary.points_avg, 2.0);
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut window = FormWindow::new(0);
        window.push(entry(TeamOutcome::Win, 3, 0));
        assert!(window.is_empty());
    }
}
