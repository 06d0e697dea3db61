// pathgate-core/src/core/path.rs
// ============================================================================
// Module: PathGate Configuration Paths
// Description: gNMI-style schema paths with per-element key maps.
// Purpose: Provide the canonical path representation used by rules and requests.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines [`ConfigPath`] and [`PathElem`], the schema-path types
//! shared by authorization rules and authorization requests. Paths display in
//! xpath-like form (`/interfaces/interface[name=eth0]/mtu`), which is also the
//! key used by the per-path decision counters. The wildcard token `*` is legal
//! only as a key value; wildcard element names are rejected by policy
//! validation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Wildcard token matching any value in a key position.
pub const WILDCARD: &str = "*";

// ============================================================================
// SECTION: Path Types
// ============================================================================

/// One element of a schema path: a name plus optional list keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathElem {
    /// Schema node name for this element.
    pub name: String,
    /// List keys qualifying this element, sorted by key name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub keys: BTreeMap<String, String>,
}

impl PathElem {
    /// Creates an element with no keys.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: BTreeMap::new(),
        }
    }

    /// Adds a list key to this element.
    #[must_use]
    pub fn key(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.keys.insert(name.into(), value.into());
        self
    }

    /// Returns the number of keys on this element whose value is the wildcard.
    #[must_use]
    pub fn wildcard_key_count(&self) -> usize {
        self.keys.values().filter(|value| *value == WILDCARD).count()
    }
}

impl fmt::Display for PathElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (key, value) in &self.keys {
            write!(f, "[{key}={value}]")?;
        }
        Ok(())
    }
}

/// A schema path: an optional origin plus an ordered element list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPath {
    /// Path origin (schema namespace); empty means the default origin.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin: String,
    /// Ordered path elements from the schema root.
    #[serde(default)]
    pub elems: Vec<PathElem>,
}

impl ConfigPath {
    /// Creates a path with the given origin and elements.
    #[must_use]
    pub fn new(origin: impl Into<String>, elems: Vec<PathElem>) -> Self {
        Self {
            origin: origin.into(),
            elems,
        }
    }

    /// Creates the empty root path, displayed as `/`.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a path from element names only, with no origin or keys.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origin: String::new(),
            elems: names.into_iter().map(PathElem::new).collect(),
        }
    }

    /// Returns true when the path has no elements.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.elems.is_empty()
    }

    /// Returns the xpath-style string form used as a counter key.
    #[must_use]
    pub fn xpath(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elems.is_empty() {
            return f.write_str("/");
        }
        for elem in &self.elems {
            write!(f, "/{elem}")?;
        }
        Ok(())
    }
}
