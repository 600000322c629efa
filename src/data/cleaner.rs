//! Row validation and normalisation
//!
//! Turns raw source rows into chronologically ordered `MatchRecord`s and
//! builds the team vocabulary. Bad rows are dropped and counted, never fatal.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::data::ingest::RawMatchRow;
use crate::data::vocabulary::{AliasTable, TeamVocabulary};
use crate::{CleaningConfig, MatchRecord, MatchResult};

/// Why a raw row was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("unparseable date '{0}'")]
    InvalidDate(String),

    #[error("invalid goal count '{0}'")]
    InvalidGoals(String),

    #[error("invalid result code '{0}'")]
    InvalidResult(String),
}

/// Counts of kept and dropped rows, for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub total_rows: usize,
    pub kept: usize,
    pub missing_field: usize,
    pub invalid_date: usize,
    pub invalid_goals: usize,
    pub invalid_result: usize,
    /// Rows kept without a usable date
    pub undated_kept: usize,
}

impl CleaningReport {
    fn record(&mut self, error: &ValidationError) {
        match error {
            ValidationError::MissingField(_) => self.missing_field += 1,
            ValidationError::InvalidDate(_) => self.invalid_date += 1,
            ValidationError::InvalidGoals(_) => self.invalid_goals += 1,
            ValidationError::InvalidResult(_) => self.invalid_result += 1,
        }
    }

    pub fn dropped(&self) -> usize {
        self.missing_field + self.invalid_date + self.invalid_goals + self.invalid_result
    }
}

impl fmt::Display for CleaningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} rows kept (missing: {}, bad date: {}, bad goals: {}, bad result: {})",
            self.kept,
            self.total_rows,
            self.missing_field,
            self.invalid_date,
            self.invalid_goals,
            self.invalid_result
        )
    }
}

/// Output of a cleaning pass
#[derive(Debug, Clone)]
pub struct CleanedCorpus {
    /// Records sorted by date, ties in source order
    pub records: Vec<MatchRecord>,
    pub vocabulary: TeamVocabulary,
    pub report: CleaningReport,
}

/// Validates raw rows and normalises team names
pub struct DataCleaner {
    aliases: AliasTable,
    keep_undated: bool,
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self::new(&CleaningConfig::default())
    }
}

impl DataCleaner {
    pub fn new(config: &CleaningConfig) -> Self {
        DataCleaner {
            aliases: AliasTable::with_extra(&config.extra_aliases),
            keep_undated: config.keep_undated,
        }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Clean all rows, sort chronologically and build the vocabulary
    pub fn clean(&self, rows: Vec<RawMatchRow>) -> CleanedCorpus {
        let mut report = CleaningReport {
            total_rows: rows.len(),
            ..Default::default()
        };
        let mut records = Vec::with_capacity(rows.len());

        for row in &rows {
            match self.clean_row(row) {
                Ok(record) => {
                    if record.date.is_none() {
                        report.undated_kept += 1;
                    }
                    records.push(record);
                }
                Err(e) => {
                    log::debug!("Dropping row {} ({}): {}", row.source_order, row.season, e);
                    report.record(&e);
                }
            }
        }
        report.kept = records.len();

        // Stable: equal dates keep file order
        records.sort_by_key(|r| (r.sort_key(), r.source_order));

        let vocabulary = self.build_vocabulary(&records);

        if report.dropped() > 0 {
            log::info!("Cleaning: {}", report);
        }
        log::info!(
            "Cleaned {} matches, {} teams",
            records.len(),
            vocabulary.len()
        );

        CleanedCorpus {
            records,
            vocabulary,
            report,
        }
    }

    /// Sorted set of canonical names over both home and away columns
    pub fn build_vocabulary(&self, records: &[MatchRecord]) -> TeamVocabulary {
        let names: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| [r.home_team.as_str(), r.away_team.as_str()])
            .collect();
        TeamVocabulary::from_names(names, self.aliases.clone())
    }

    /// Validate a single raw row
    pub fn clean_row(&self, row: &RawMatchRow) -> Result<MatchRecord, ValidationError> {
        let home_team = row
            .home_team
            .as_deref()
            .ok_or(ValidationError::MissingField("HomeTeam"))?;
        let away_team = row
            .away_team
            .as_deref()
            .ok_or(ValidationError::MissingField("AwayTeam"))?;
        let home_goals = row
            .home_goals
            .as_deref()
            .ok_or(ValidationError::MissingField("FTHG"))?;
        let away_goals = row
            .away_goals
            .as_deref()
            .ok_or(ValidationError::MissingField("FTAG"))?;
        let result = row
            .result
            .as_deref()
            .ok_or(ValidationError::MissingField("FTR"))?;

        let home_goals = parse_goals(home_goals)?;
        let away_goals = parse_goals(away_goals)?;
        let result = MatchResult::from_code(result)
            .ok_or_else(|| ValidationError::InvalidResult(result.to_string()))?;

        let date = match row.date.as_deref() {
            Some(text) => match parse_date(text) {
                Some(date) => Some(date),
                None if self.keep_undated => None,
                None => return Err(ValidationError::InvalidDate(text.to_string())),
            },
            None if self.keep_undated => None,
            None => return Err(ValidationError::InvalidDate(String::new())),
        };

        Ok(MatchRecord {
            date,
            season: row.season.clone(),
            home_team: self.aliases.canonical(home_team),
            away_team: self.aliases.canonical(away_team),
            home_goals,
            away_goals,
            result,
            source_order: row.source_order,
        })
    }
}

/// Parse a day/month/year date with a four- or two-digit year
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let year_part = text.rsplit('/').next()?;
    let format = match year_part.len() {
        4 => "%d/%m/%Y",
        2 => "%d/%m/%y",
        _ => return None,
    };
    NaiveDate::parse_from_str(text, format).ok()
}

/// Largest goal count a single side can be credited with
pub const MAX_GOALS_PER_SIDE: u32 = 99;

/// Coerce a goal field to an integer in `0..=MAX_GOALS_PER_SIDE`
fn parse_goals(text: &str) -> Result<u32, ValidationError> {
    let invalid = || ValidationError::InvalidGoals(text.to_string());

    let value = if let Ok(value) = text.parse::<i64>() {
        value
    } else {
        // Numeric columns with gaps come through as floats, e.g. "2.0"
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() && value.fract() == 0.0 && value.abs() <= 1e6 => {
                value as i64
            }
            _ => return Err(invalid()),
        }
    };

    match u32::try_from(value) {
        Ok(goals) if goals <= MAX_GOALS_PER_SIDE => Ok(goals),
        _ => Err(invalid()),
    }
}

/// Aggregate description of a cleaned corpus
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusSummary {
    pub total_matches: usize,
    pub seasons: Vec<String>,
    pub total_teams: usize,
    pub avg_home_goals: f64,
    pub avg_away_goals: f64,
    pub avg_total_goals: f64,
    pub home_win_rate: f64,
    pub draw_rate: f64,
    pub away_win_rate: f64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl CorpusSummary {
    pub fn from_records(records: &[MatchRecord]) -> Self {
        let n = records.len();
        let rate = |count: usize| {
            if n == 0 {
                0.0
            } else {
                count as f64 / n as f64
            }
        };

        let home_goals: u32 = records.iter().map(|r| r.home_goals).sum();
        let away_goals: u32 = records.iter().map(|r| r.away_goals).sum();
        let count_result =
            |result: MatchResult| records.iter().filter(|r| r.result == result).count();

        let seasons: BTreeSet<&str> = records.iter().map(|r| r.season.as_str()).collect();
        let teams: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| [r.home_team.as_str(), r.away_team.as_str()])
            .collect();
        let dates = records.iter().filter_map(|r| r.date);

        CorpusSummary {
            total_matches: n,
            seasons: seasons.into_iter().map(String::from).collect(),
            total_teams: teams.len(),
            avg_home_goals: rate(home_goals as usize),
            avg_away_goals: rate(away_goals as usize),
            avg_total_goals: rate((home_goals + away_goals) as usize),
            home_win_rate: rate(count_result(MatchResult::HomeWin)),
            draw_rate: rate(count_result(MatchResult::Draw)),
            away_win_rate: rate(count_result(MatchResult::AwayWin)),
            first_date: dates.clone().min(),
            last_date: dates.max(),
        }
    }

    /// Number of distinct calendar years covered
    pub fn year_span(&self) -> Option<i32> {
        match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => Some(last.year() - first.year() + 1),
            _ => None,
        }
    }
}
