// pathgate-core/src/lib.rs
// ============================================================================
// Module: PathGate Core Library
// Description: Public API surface for the PathGate core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! PathGate core provides path-based authorization over configuration
//! operations: a validated policy model, a specificity-ordered rule matcher,
//! atomic two-phase policy rotation, and startup recovery semantics. It is
//! transport-agnostic and integrates through explicit interfaces rather than
//! embedding into a management stack.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::AuthorizeError;
pub use interfaces::PersistenceError;
pub use interfaces::PolicyPersistence;
pub use interfaces::RecoveredPolicy;
pub use interfaces::RequestAuthorizer;
pub use interfaces::TimeSource;
pub use interfaces::WallClock;
pub use runtime::EngineError;
pub use runtime::GetError;
pub use runtime::PolicyEngine;
pub use runtime::ProbeError;
pub use runtime::ProbeOutcome;
pub use runtime::RecoveryOutcome;
pub use runtime::RotateError;
pub use runtime::RotateSession;
pub use runtime::RuleIndex;
