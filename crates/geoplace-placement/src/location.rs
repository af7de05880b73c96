//! Location constraints carried as workload labels.
//!
//! A constraint is a single label value of the form
//! `city1_city2-country1_country2-continent1_continent2`. Segments are
//! hyphen-separated, items within a segment underscore-separated, and a
//! missing or empty segment is simply an empty set.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a constraint must be met or is only a preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Required,
    Preferred,
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationKind::Required => f.write_str("required"),
            LocationKind::Preferred => f.write_str("preferred"),
        }
    }
}

/// Workload label keys holding location constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationLabels {
    pub required: String,
    pub preferred: String,
}

impl Default for LocationLabels {
    fn default() -> Self {
        Self {
            required: "deployment.geoplace.io/requiredLocation".to_string(),
            preferred: "deployment.geoplace.io/preferredLocation".to_string(),
        }
    }
}

/// A parsed location constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationConstraint {
    pub kind: LocationKind,
    pub cities: Vec<String>,
    pub countries: Vec<String>,
    pub continents: Vec<String>,
}

impl LocationConstraint {
    /// Parse a compound label value. Never fails.
    pub fn parse(kind: LocationKind, value: &str) -> Self {
        let mut segments = value.split('-');
        let mut next = || segments.next().map(split_items).unwrap_or_default();

        Self {
            kind,
            cities: next(),
            countries: next(),
            continents: next(),
        }
    }

    /// Read the constraint from workload labels.
    ///
    /// A required constraint takes precedence over a preferred one; an empty
    /// label value counts as absent.
    pub fn from_labels(labels: &HashMap<String, String>, keys: &LocationLabels) -> Option<Self> {
        let value = |key: &str| labels.get(key).filter(|value| !value.is_empty());

        if let Some(value) = value(&keys.required) {
            return Some(Self::parse(LocationKind::Required, value));
        }
        value(&keys.preferred).map(|value| Self::parse(LocationKind::Preferred, value))
    }

    /// Whether every segment is empty.
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty() && self.countries.is_empty() && self.continents.is_empty()
    }
}

impl fmt::Display for LocationConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} location {}-{}-{}",
            self.kind,
            self.cities.join("_"),
            self.countries.join("_"),
            self.continents.join("_")
        )
    }
}

fn split_items(segment: &str) -> Vec<String> {
    segment
        .split('_')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
