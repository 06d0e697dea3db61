// pathgate-core/src/core/mod.rs
// ============================================================================
// Module: PathGate Core Types
// Description: Canonical path, policy, and counter structures.
// Purpose: Provide stable, serializable types for policies and decisions.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! PathGate core types define schema paths, authorization policies and their
//! snapshots, and the decision counter surface. These types are the canonical
//! source of truth for the wire and storage representations derived from
//! them.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod counters;
pub mod path;
pub mod policy;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use counters::AccessTally;
pub use counters::EngineStats;
pub use counters::PathCounters;
pub use path::ConfigPath;
pub use path::PathElem;
pub use path::WILDCARD;
pub use policy::Action;
pub use policy::AuthorizationPolicy;
pub use policy::AuthorizationRule;
pub use policy::CORRUPT_FALLBACK_VERSION;
pub use policy::Group;
pub use policy::Mode;
pub use policy::PolicyError;
pub use policy::PolicyInstance;
pub use policy::PolicySnapshot;
pub use policy::Principal;
pub use policy::validate_policy;
