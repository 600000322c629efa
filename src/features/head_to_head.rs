//! Head-to-head tallies between team pairs

use serde::{Deserialize, Serialize};

use crate::{MatchResult, TeamId};

/// Average total goals assumed when two teams have never met
pub const NEUTRAL_H2H_TOTAL_GOALS: f64 = 2.5;

/// Running tally of all meetings between one unordered pair of teams.
///
/// Wins are stored against the pair's canonical order (smaller id first) so
/// the same tally serves either side being at home.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHeadTally {
    pub first_wins: u32,
    pub second_wins: u32,
    pub draws: u32,
    pub total_goals: u32,
}

impl HeadToHeadTally {
    pub fn meetings(&self) -> u32 {
        self.first_wins + self.second_wins + self.draws
    }
}

/// Canonical key for an unordered pair (smaller id first)
pub fn pair_key(team1: TeamId, team2: TeamId) -> (TeamId, TeamId) {
    if team1.0 < team2.0 {
        (team1, team2)
    } else {
        (team2, team1)
    }
}

/// Record a meeting into the pair's tally
pub fn record_meeting(
    tally: &mut HeadToHeadTally,
    home: TeamId,
    away: TeamId,
    result: MatchResult,
    total_goals: u32,
) {
    let home_is_first = pair_key(home, away).0 == home;
    match (result, home_is_first) {
        (MatchResult::Draw, _) => tally.draws += 1,
        (MatchResult::HomeWin, true) | (MatchResult::AwayWin, false) => tally.first_wins += 1,
        _ => tally.second_wins += 1,
    }
    tally.total_goals += total_goals;
}

/// Prior meetings seen from the current fixture's home side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadToHeadAggregate {
    /// Meetings won by the current home team, in either venue
    pub home_wins: u32,
    /// Meetings won by the current away team, in either venue
    pub away_wins: u32,
    pub draws: u32,
    pub avg_total_goals: f64,
}

impl HeadToHeadAggregate {
    pub fn empty() -> Self {
        HeadToHeadAggregate {
            home_wins: 0,
            away_wins: 0,
            draws: 0,
            avg_total_goals: NEUTRAL_H2H_TOTAL_GOALS,
        }
    }

    /// Orient a pair tally to a fixture
    pub fn from_tally(tally: &HeadToHeadTally, home: TeamId, away: TeamId) -> Self {
        let meetings = tally.meetings();
        if meetings == 0 {
            return Self::empty();
        }
        let (home_wins, away_wins) = if pair_key(home, away).0 == home {
            (tally.first_wins, tally.second_wins)
        } else {
            (tally.second_wins, tally.first_wins)
        };
        HeadToHeadAggregate {
            home_wins,
            away_wins,
            draws: tally.draws,
            avg_total_goals: tally.total_goals as f64 / meetings as f64,
        }
    }

    pub fn meetings(&self) -> u32 {
        self.home_wins + self.away_wins + self.draws
    }

    /// (home win, away win, draw) as fractions of meetings; zeros when none
    pub fn shares(&self) -> (f64, f64, f64) {
        let n = self.meetings();
        if n == 0 {
            return (0.0, 0.0, 0.0);
        }
        let n = n as f64;
        (
            self.home_wins as f64 / n,
            self.away_wins as f64 / n,
            self.draws as f64 / n,
        )
    }
}
