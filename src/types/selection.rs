use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// Criterion for replacing the selection in one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "criteria", content = "value", rename_all = "snake_case")]
pub enum SelectCriterion {
    /// Every account in the active folder.
    All,
    /// Accounts whose cooldown has completed.
    Cooldown,
    /// Accounts tagged with exactly this geo (case-sensitive).
    Geo(String),
}

impl SelectCriterion {
    /// Builds a criterion from its wire name and optional value.
    pub fn parse(name: &str, value: Option<&str>) -> Result<Self, ValidationError> {
        match name {
            "all" => Ok(SelectCriterion::All),
            "cooldown" => Ok(SelectCriterion::Cooldown),
            "geo" => match value {
                Some(v) if !v.is_empty() => Ok(SelectCriterion::Geo(v.to_string())),
                _ => Err(ValidationError::MissingGeoValue),
            },
            other => Err(ValidationError::UnknownCriterion(other.to_string())),
        }
    }

    /// Wire name of the criterion.
    pub fn name(&self) -> &'static str {
        match self {
            SelectCriterion::All => "all",
            SelectCriterion::Cooldown => "cooldown",
            SelectCriterion::Geo(_) => "geo",
        }
    }

    /// Wire value of the criterion, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            SelectCriterion::Geo(v) => Some(v),
            _ => None,
        }
    }
}

/// The account IDs targeted by the next bulk action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Keeps only the IDs for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.ids.retain(|id| keep(id));
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.ids.iter()
    }

    /// IDs as an owned list, for request payloads.
    pub fn to_vec(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}

impl FromIterator<String> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self { ids: iter.into_iter().collect() }
    }
}

impl<'a> FromIterator<&'a str> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self { ids: iter.into_iter().map(str::to_string).collect() }
    }
}
