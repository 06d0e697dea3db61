// pathgate-core/src/runtime/mod.rs
// ============================================================================
// Module: PathGate Runtime
// Description: Rule matching, the policy engine, and the rotation session.
// Purpose: Provide the decision and rotation runtime over the core model.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The runtime layer evaluates authorization requests against the committed
//! policy and drives the two-phase rotation protocol. It is deterministic:
//! all I/O and clock access flow through the interfaces layer.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod engine;
pub mod matcher;
pub mod rotation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use engine::EngineError;
pub use engine::GetError;
pub use engine::PolicyEngine;
pub use engine::ProbeError;
pub use engine::ProbeOutcome;
pub use engine::RecoveryOutcome;
pub use engine::RotateError;
pub use matcher::RuleIndex;
pub use rotation::RotateSession;
