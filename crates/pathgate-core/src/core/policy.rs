// pathgate-core/src/core/policy.rs
// ============================================================================
// Module: PathGate Policy Model
// Description: Authorization rules, groups, policies, and policy snapshots.
// Purpose: Provide the canonical serializable policy types and their validator.
// Dependencies: crate::core::path, serde, thiserror
// ============================================================================

//! ## Overview
//! This module defines the policy data model: rules binding a principal and a
//! path pattern to a permit/deny action, groups resolving names to user sets,
//! and [`PolicySnapshot`], the immutable versioned unit staged and committed
//! by rotation. [`validate_policy`] enforces the structural invariants every
//! uploaded policy must satisfy before it may reach the sandbox.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::path::ConfigPath;
use crate::core::path::WILDCARD;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Version string of the snapshot substituted when every durable policy copy
/// fails to decode at startup.
pub const CORRUPT_FALLBACK_VERSION: &str = "Cisco-Deny-All-Bad-File-Encoding";

// ============================================================================
// SECTION: Policy Types
// ============================================================================

/// Operation class an authorization rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Read-class operations (gNMI Get, Subscribe).
    Read,
    /// Write-class operations (gNMI Set update/replace/delete).
    Write,
}

impl Mode {
    /// Returns the stable string form of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome a rule assigns to the operations it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// The operation is allowed.
    Permit,
    /// The operation is rejected.
    Deny,
}

impl Action {
    /// Returns the stable string form of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Permit => "permit",
            Self::Deny => "deny",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subject of an authorization rule: a single user or a named group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Principal {
    /// A single user name.
    User(String),
    /// A group name resolved through the policy's group list.
    Group(String),
}

/// One authorization rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRule {
    /// Free-form rule identifier; bookkeeping only, not required to be unique.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Path pattern the rule covers; keys may carry the wildcard value.
    pub path: ConfigPath,
    /// Principal the rule applies to.
    pub principal: Principal,
    /// Operation class the rule applies to.
    pub mode: Mode,
    /// Outcome assigned when the rule is the winning match.
    pub action: Action,
}

/// A named set of users referenced by group-principal rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group name, unique within a policy.
    pub name: String,
    /// User names belonging to the group.
    pub users: Vec<String>,
}

/// A complete authorization policy: groups plus rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationPolicy {
    /// Group definitions available to rule principals.
    #[serde(default)]
    pub groups: Vec<Group>,
    /// Authorization rules; order carries no precedence meaning.
    #[serde(default)]
    pub rules: Vec<AuthorizationRule>,
}

/// An immutable versioned policy, the unit staged and committed by rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    /// Producer-supplied version string; not interpreted by the engine.
    pub version: String,
    /// Producer-supplied creation time in Unix microseconds.
    pub created_on: u64,
    /// The policy content.
    pub policy: AuthorizationPolicy,
}

impl PolicySnapshot {
    /// Creates a snapshot from its parts.
    #[must_use]
    pub fn new(version: impl Into<String>, created_on: u64, policy: AuthorizationPolicy) -> Self {
        Self {
            version: version.into(),
            created_on,
            policy,
        }
    }

    /// Creates the deny-all snapshot substituted when durable policy copies
    /// exist but none decodes. Zero rules under a committed policy deny every
    /// operation.
    #[must_use]
    pub fn corrupt_fallback(created_on: u64) -> Self {
        Self {
            version: CORRUPT_FALLBACK_VERSION.to_string(),
            created_on,
            policy: AuthorizationPolicy::default(),
        }
    }
}

/// Policy instance selector for get and probe requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyInstance {
    /// The committed policy consulted by live authorization.
    Active,
    /// The staged policy awaiting finalize.
    Sandbox,
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Error produced when an uploaded policy fails structural validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// A rule path element uses the wildcard token as its name.
    #[error("invalid policy: wildcard path names are not permitted")]
    WildcardPathName,
    /// A rule carries a path with no elements.
    #[error("invalid policy: rule path not specified")]
    RulePathNotSpecified,
    /// A rule references a principal with an empty name.
    #[error("invalid policy: rule principal not specified")]
    PrincipalNotSpecified,
    /// Two groups share the same name.
    #[error("invalid policy: duplicate group name {0:?}")]
    DuplicateGroup(String),
}

/// Validates the structural invariants of an uploaded policy.
///
/// A policy with zero rules is valid; committed, it denies every operation.
///
/// # Errors
///
/// Returns [`PolicyError`] naming the first violated invariant: wildcard
/// element names, a rule with an empty path, a rule with an empty principal
/// name, or duplicate group names.
pub fn validate_policy(policy: &AuthorizationPolicy) -> Result<(), PolicyError> {
    for rule in &policy.rules {
        validate_rule(rule)?;
    }
    validate_groups(&policy.groups)
}

/// Validates one rule: non-empty path, no wildcard names, named principal.
fn validate_rule(rule: &AuthorizationRule) -> Result<(), PolicyError> {
    if rule.path.elems.is_empty() {
        return Err(PolicyError::RulePathNotSpecified);
    }
    for elem in &rule.path.elems {
        if elem.name == WILDCARD {
            return Err(PolicyError::WildcardPathName);
        }
    }
    let named = match &rule.principal {
        Principal::User(name) | Principal::Group(name) => !name.is_empty(),
    };
    if !named {
        return Err(PolicyError::PrincipalNotSpecified);
    }
    Ok(())
}

/// Validates that group names are unique within the policy.
fn validate_groups(groups: &[Group]) -> Result<(), PolicyError> {
    let mut seen = BTreeSet::new();
    for group in groups {
        if !seen.insert(group.name.as_str()) {
            return Err(PolicyError::DuplicateGroup(group.name.clone()));
        }
    }
    Ok(())
}
