//! Team name normalisation and integer encoding

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{FootballError, Result, TeamId};

/// Alias -> canonical team name mapping (case-insensitive on the alias)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTable {
    aliases: BTreeMap<String, String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl AliasTable {
    /// Empty table: every name is already canonical
    pub fn empty() -> Self {
        AliasTable {
            aliases: BTreeMap::new(),
        }
    }

    /// Abbreviations used by the season files, collapsed to one canonical form
    pub fn standard() -> Self {
        let mut table = Self::empty();

        for name in ["Man United", "Man Utd"] {
            table.insert(name, "Manchester United");
        }
        table.insert("Man City", "Manchester City");
        for name in ["Tottenham", "Spurs"] {
            table.insert(name, "Tottenham Hotspur");
        }
        table.insert("Leicester", "Leicester City");
        table.insert("Wolves", "Wolverhampton Wanderers");
        table.insert("Brighton", "Brighton & Hove Albion");
        table.insert("West Ham", "West Ham United");
        table.insert("Newcastle", "Newcastle United");
        table.insert("Norwich", "Norwich City");
        table.insert("Sheffield Utd", "Sheffield United");

        table
    }

    /// Standard table extended (and overridden) by extra mappings
    pub fn with_extra(extra: &BTreeMap<String, String>) -> Self {
        let mut table = Self::standard();
        for (alias, canonical) in extra {
            table.insert(alias, canonical);
        }
        table
    }

    pub fn insert(&mut self, alias: &str, canonical: &str) {
        self.aliases
            .insert(alias.trim().to_lowercase(), canonical.trim().to_string());
    }

    /// Canonical form of a team name
    pub fn canonical(&self, name: &str) -> String {
        let trimmed = name.trim();
        self.aliases
            .get(&trimmed.to_lowercase())
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Bijection between canonical team names and integer ids.
///
/// Ids are positions in the sorted name list, so the same set of names always
/// yields the same encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamVocabulary {
    names: Vec<String>,
    aliases: AliasTable,
}

impl TeamVocabulary {
    /// Build from any collection of canonical names (duplicates allowed)
    pub fn from_names<I, S>(names: I, aliases: AliasTable) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        TeamVocabulary { names, aliases }
    }

    /// Resolve a user-supplied name to its id, if known
    pub fn id(&self, name: &str) -> Option<TeamId> {
        let canonical = self.aliases.canonical(name);
        if let Ok(idx) = self.names.binary_search(&canonical) {
            return Some(TeamId(idx as u32));
        }
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(&canonical))
            .map(|idx| TeamId(idx as u32))
    }

    /// Like `id`, but an unknown team is an error
    pub fn require(&self, name: &str) -> Result<TeamId> {
        self.id(name)
            .ok_or_else(|| FootballError::UnknownTeam(name.to_string()))
    }

    /// Canonical name for an id
    pub fn name(&self, id: TeamId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    /// Canonical name for a user-supplied name, if known
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.id(name).and_then(|id| self.name(id))
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
