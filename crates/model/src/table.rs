use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The fixed set of tables the migration engine knows how to copy.
///
/// Each table carries a business identity column used for conflict
/// resolution during upsert; surrogate ids are never relied on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TableKind {
    RolloutSites,
    SiteScores,
    ProgramTargets,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [
        TableKind::RolloutSites,
        TableKind::SiteScores,
        TableKind::ProgramTargets,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            TableKind::RolloutSites => "rollout_sites",
            TableKind::SiteScores => "site_scores",
            TableKind::ProgramTargets => "program_targets",
        }
    }

    /// The natural key column used both as the stable pagination sort key
    /// and as the upsert conflict target.
    pub fn natural_key(&self) -> &'static str {
        match self {
            TableKind::RolloutSites => "site_id",
            TableKind::SiteScores => "site_id",
            TableKind::ProgramTargets => "program_name",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

#[derive(Debug, Error)]
#[error("unknown table '{0}', expected one of: rollout_sites, site_scores, program_targets")]
pub struct UnknownTable(pub String);

impl FromStr for TableKind {
    type Err = UnknownTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rollout_sites" => Ok(TableKind::RolloutSites),
            "site_scores" => Ok(TableKind::SiteScores),
            "program_targets" => Ok(TableKind::ProgramTargets),
            other => Err(UnknownTable(other.to_string())),
        }
    }
}
