//! Season CSV ingestion
//!
//! Loads raw rows from one file per season. Unreadable sources are logged and
//! skipped; only a load that yields no rows at all is an error.

use regex::Regex;
use std::path::{Path, PathBuf};

use crate::{FootballError, Result};

/// Columns the core consumes; everything else in a source file is ignored
const DATE_COLUMN: &str = "Date";
const HOME_TEAM_COLUMN: &str = "HomeTeam";
const AWAY_TEAM_COLUMN: &str = "AwayTeam";
const HOME_GOALS_COLUMN: &str = "FTHG";
const AWAY_GOALS_COLUMN: &str = "FTAG";
const RESULT_COLUMN: &str = "FTR";

/// An unvalidated match row as read from a source file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMatchRow {
    /// Season label derived from the source identifier
    pub season: String,
    /// Position in concatenated source order
    pub source_order: usize,
    pub date: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_goals: Option<String>,
    pub away_goals: Option<String>,
    pub result: Option<String>,
}

/// Loads and concatenates season files in the order given
pub struct DataIngestor {
    sources: Vec<PathBuf>,
    prefix: String,
}

impl DataIngestor {
    /// Create an ingestor over explicit source files
    pub fn new<P: AsRef<Path>>(sources: &[P]) -> Self {
        DataIngestor {
            sources: sources.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            prefix: String::new(),
        }
    }

    /// Find `<prefix>*.csv` files in a directory, sorted by file name
    pub fn discover<P: AsRef<Path>>(dir: P, prefix: &str) -> Result<Self> {
        let mut sources = Vec::new();

        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            let matches_prefix = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(prefix))
                .unwrap_or(false);
            if is_csv && matches_prefix {
                sources.push(path);
            }
        }

        sources.sort();
        log::info!(
            "Found {} source files in {}",
            sources.len(),
            dir.as_ref().display()
        );

        Ok(DataIngestor {
            sources,
            prefix: prefix.to_string(),
        })
    }

    /// Strip this prefix from file stems when no season token is present
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Load every source, skipping the ones that fail
    pub fn load(&self) -> Result<Vec<RawMatchRow>> {
        let mut all_rows = Vec::new();

        for path in &self.sources {
            let season = season_label(path, &self.prefix);
            match load_source(path, &season, all_rows.len()) {
                Ok(rows) if rows.is_empty() => {
                    log::warn!("  {}: no rows, skipping", path.display());
                }
                Ok(rows) => {
                    log::info!("  {}: {} rows loaded", season, rows.len());
                    all_rows.extend(rows);
                }
                Err(e) => log::warn!("  {}: failed to load: {}", path.display(), e),
            }
        }

        if all_rows.is_empty() {
            return Err(FootballError::Ingest(format!(
                "none of {} sources yielded rows",
                self.sources.len()
            )));
        }

        log::info!("Loaded {} rows from {} sources", all_rows.len(), self.sources.len());
        Ok(all_rows)
    }
}

/// Derive a season label from a source file name.
///
/// Prefers a `YYYY-YYYY` or `YYYY-YY` token in the stem, else the stem with
/// the prefix stripped.
pub fn season_label(path: &Path, prefix: &str) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    if let Ok(re) = Regex::new(r"(\d{4})\s*[-_/]\s*(\d{2,4})") {
        if let Some(caps) = re.captures(&stem) {
            return format!("{}-{}", &caps[1], &caps[2]);
        }
    }

    let stripped = stem.strip_prefix(prefix).unwrap_or(&stem).trim();
    if stripped.is_empty() {
        stem
    } else {
        stripped.to_string()
    }
}

/// Read one CSV source into raw rows numbered from `start_order`
fn load_source(path: &Path, season: &str, start_order: usize) -> Result<Vec<RawMatchRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.byte_headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| String::from_utf8_lossy(h).trim_start_matches('\u{feff}') == name)
    };

    let home_idx = column(HOME_TEAM_COLUMN);
    let away_idx = column(AWAY_TEAM_COLUMN);
    if home_idx.is_none() || away_idx.is_none() {
        return Err(FootballError::Ingest(format!(
            "{} has no {}/{} columns",
            path.display(),
            HOME_TEAM_COLUMN,
            AWAY_TEAM_COLUMN
        )));
    }
    let date_idx = column(DATE_COLUMN);
    let home_goals_idx = column(HOME_GOALS_COLUMN);
    let away_goals_idx = column(AWAY_GOALS_COLUMN);
    let result_idx = column(RESULT_COLUMN);

    let mut rows = Vec::new();
    let mut record = csv::ByteRecord::new();
    let mut unreadable = 0usize;

    loop {
        match reader.read_byte_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                unreadable += 1;
                log::debug!("{}: unreadable row: {}", path.display(), e);
                continue;
            }
        }

        let field = |idx: Option<usize>| -> Option<String> {
            let bytes = record.get(idx?)?;
            let text = String::from_utf8_lossy(bytes).trim().to_string();
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        };

        rows.push(RawMatchRow {
            season: season.to_string(),
            source_order: start_order + rows.len(),
            date: field(date_idx),
            home_team: field(home_idx),
            away_team: field(away_idx),
            home_goals: field(home_goals_idx),
            away_goals: field(away_goals_idx),
            result: field(result_idx),
        });
    }

    if unreadable > 0 {
        log::warn!("  {}: {} unreadable rows skipped", path.display(), unreadable);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    #[test]
    fn test_season_label() {
        assert_eq!(
            season_label(Path::new("data/E0 2015-2016.csv"), "E0"),
            "2015-2016"
        );
        assert_eq!(season_label(Path::new("E0_2019_20.csv"), "E0"), "2019-20");
        assert_eq!(season_label(Path::new("E0 autumn.csv"), "E0"), "autumn");
        assert_eq!(season_label(Path::new("E0.csv"), "E0"), "E0");
    }

    #[test]
    fn test_load_tags_season_and_order() {
        let dir = TempDir::new().unwrap();
        let a = write_file(
            dir.path(),
            "E0 2015-2016.csv",
            b"Div,Date,HomeTeam,AwayTeam,FTHG,FTAG,FTR,B365H\n\
              E0,08/08/2015,Bournemouth,Aston Villa,0,1,A,2.0\n\
              E0,08/08/2015,Chelsea,Swansea,2,2,D,1.36\n",
        );
        let b = write_file(
            dir.path(),
            "E0 2016-2017.csv",
            b"Date,HomeTeam,AwayTeam,FTHG,FTAG,FTR\n13/08/16,Burnley,Swansea,0,1,A\n",
        );

        let rows = DataIngestor::new(&[a, b]).load().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].season, "2015-2016");
        assert_eq!(rows[2].season, "2016-2017");
        assert_eq!(rows[2].source_order, 2);
        assert_eq!(rows[1].home_team.as_deref(), Some("Chelsea"));
        assert_eq!(rows[1].result.as_deref(), Some("D"));
    }

    #[test]
    fn test_unreadable_source_is_skipped() {
        let dir = TempDir::new().unwrap();
        let good = write_file(
            dir.path(),
            "E0 2017-2018.csv",
            b"Date,HomeTeam,AwayTeam,FTHG,FTAG,FTR\n11/08/2017,Arsenal,Leicester,4,3,H\n",
        );
        let missing = dir.path().join("E0 1999-2000.csv");

        let rows = DataIngestor::new(&[missing, good]).load().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source_order, 0);
    }

    #[test]
    fn test_no_usable_sources_is_an_error() {
        let dir = TempDir::new().unwrap();
        let empty = write_file(dir.path(), "E0 empty.csv", b"Date,HomeTeam,AwayTeam\n");
        let missing = dir.path().join("nope.csv");

        let err = DataIngestor::new(&[empty, missing]).load().unwrap_err();
        assert!(matches!(err, FootballError::Ingest(_)));
    }

    #[test]
    fn test_missing_columns_and_lossy_bytes() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            dir.path(),
            "E0 2003-2004.csv",
            b"Date,HomeTeam,AwayTeam,FTHG\n16/08/03,Arsenal,Everton,2\n16/08/03,Birmingham,Tottenham\xff,1\n,,,\n",
        );

        let rows = DataIngestor::new(&[path]).load().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].away_goals, None);
        assert_eq!(rows[0].result, None);
        assert!(rows[1].away_team.as_deref().unwrap().starts_with("Tottenham"));
        assert_eq!(rows[2].home_team, None);
    }

    #[test]
    fn test_discover_filters_by_prefix() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "E0 2016-2017.csv", b"Date\n");
        write_file(dir.path(), "E0 2015-2016.csv", b"Date\n");
        write_file(dir.path(), "SP1 2015-2016.csv", b"Date\n");
        write_file(dir.path(), "E0 notes.txt", b"");

        let ingestor = DataIngestor::discover(dir.path(), "E0").unwrap();
        let names: Vec<_> = ingestor
            .sources()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["E0 2015-2016.csv", "E0 2016-2017.csv"]);
    }
}
