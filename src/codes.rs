use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Code tables whose numeric ids are translated into labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeSet {
    ProjectType,
    Activity,
    IucnLevel1,
    IucnLevel2,
    IucnLevel3,
    FirstNations,
    FieldMethod,
    EcologicalSeason,
    VantageCode,
    IntendedOutcome,
}

impl CodeSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeSet::ProjectType => "project_type",
            CodeSet::Activity => "activity",
            CodeSet::IucnLevel1 => "iucn_level_1",
            CodeSet::IucnLevel2 => "iucn_level_2",
            CodeSet::IucnLevel3 => "iucn_level_3",
            CodeSet::FirstNations => "first_nations",
            CodeSet::FieldMethod => "field_method",
            CodeSet::EcologicalSeason => "ecological_season",
            CodeSet::VantageCode => "vantage_code",
            CodeSet::IntendedOutcome => "intended_outcome",
        }
    }
}

impl fmt::Display for CodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub trait CodeTableResolver: Send + Sync {
    /// Label for `id` in `code_set`, or `None` when it does not resolve.
    fn resolve(&self, code_set: CodeSet, id: u64) -> Option<String>;
}

/// In-memory code tables, keyed by code set then id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeTables(BTreeMap<CodeSet, BTreeMap<u64, String>>);

impl CodeTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code_set: CodeSet, id: u64, label: impl Into<String>) {
        self.0.entry(code_set).or_default().insert(id, label.into());
    }

    pub fn with(mut self, code_set: CodeSet, id: u64, label: impl Into<String>) -> Self {
        self.insert(code_set, id, label);
        self
    }

    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CodeTableResolver for CodeTables {
    fn resolve(&self, code_set: CodeSet, id: u64) -> Option<String> {
        self.0
            .get(&code_set)?
            .get(&id)
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
            .map(str::to_string)
    }
}
