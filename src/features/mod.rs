//! Feature extraction
//!
//! Converts the cleaned match history into model-ready features.

pub mod calendar;
pub mod extractor;
pub mod form;
pub mod head_to_head;
pub mod team_stats;

pub use calendar::CalendarFields;
pub use extractor::{
    ExtractedFeatures, FeatureExtractor, FeatureVector, MatchHistory, FEATURE_COUNT,
    FEATURE_NAMES,
};
pub use form::{FormEntry, FormSummary, FormWindow};
pub use head_to_head::{HeadToHeadAggregate, HeadToHeadTally};
pub use team_stats::{TeamProfile, TeamStatistics, TeamStatisticsComputer};
