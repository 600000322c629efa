//! Data ingestion, cleaning and storage
//!
//! Season CSV loading, validation into match records, team name
//! normalisation and the SQLite match store.

pub mod cleaner;
pub mod database;
pub mod ingest;
pub mod vocabulary;

pub use cleaner::{CleanedCorpus, CleaningReport, CorpusSummary, DataCleaner};
pub use database::{Database, DatabaseStats};
pub use ingest::{DataIngestor, RawMatchRow};
pub use vocabulary::{AliasTable, TeamVocabulary};
