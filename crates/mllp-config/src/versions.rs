//! The configured set of HL7 versions.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HL7 version identifiers the daemon should accept, for example `2.3`.
///
/// On the command line and in environment variables the set is written as a
/// comma-separated list (`2.3,2.4`); configuration files may use either that
/// form or an array of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSet(BTreeSet<String>);

impl VersionSet {
    /// Returns `true` when `version` is part of the set.
    #[must_use]
    pub fn contains(&self, version: &str) -> bool {
        self.0.contains(version)
    }

    /// Iterates the versions in ascending lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of versions in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no version is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for VersionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Errors raised while parsing a [`VersionSet`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionSetError {
    /// The list named no versions at all.
    #[error("at least one HL7 version must be listed")]
    Empty,
    /// An entry is not a dotted numeric version.
    #[error("'{0}' is not an HL7 version identifier")]
    Invalid(String),
}

impl FromStr for VersionSet {
    type Err = VersionSetError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        collect_versions(input.split(',').map(str::trim).filter(|part| !part.is_empty()))
    }
}

impl fmt::Display for VersionSet {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for version in &self.0 {
            if !first {
                formatter.write_str(",")?;
            }
            formatter.write_str(version)?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for VersionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for version in &self.0 {
            seq.serialize_element(version)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for VersionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(VersionSetVisitor)
    }
}

fn collect_versions<'a>(
    entries: impl Iterator<Item = &'a str>,
) -> Result<VersionSet, VersionSetError> {
    let mut versions = BTreeSet::new();
    for entry in entries {
        if !is_version_identifier(entry) {
            return Err(VersionSetError::Invalid(entry.to_owned()));
        }
        versions.insert(entry.to_owned());
    }
    if versions.is_empty() {
        return Err(VersionSetError::Empty);
    }
    Ok(VersionSet(versions))
}

fn is_version_identifier(text: &str) -> bool {
    !text.is_empty()
        && text
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|ch| ch.is_ascii_digit()))
}

struct VersionSetVisitor;

impl<'de> Visitor<'de> for VersionSetVisitor {
    type Value = VersionSet;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a list of HL7 versions or a comma-separated string")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        value.parse().map_err(E::custom)
    }

    // Environment providers hand single numeric-looking values over as numbers.
    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        self.visit_str(&value.to_string())
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        self.visit_str(&value.to_string())
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        self.visit_str(&value.to_string())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::new();
        while let Some(VersionText(entry)) = seq.next_element()? {
            entries.push(entry);
        }
        collect_versions(entries.iter().map(String::as_str)).map_err(de::Error::custom)
    }
}

struct VersionText(String);

impl<'de> Deserialize<'de> for VersionText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(VersionTextVisitor)
    }
}

struct VersionTextVisitor;

impl Visitor<'_> for VersionTextVisitor {
    type Value = VersionText;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an HL7 version such as \"2.4\"")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(VersionText(value.trim().to_owned()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(VersionText(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(VersionText(value.to_string()))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(VersionText(value.to_string()))
    }
}
