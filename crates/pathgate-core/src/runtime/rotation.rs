// pathgate-core/src/runtime/rotation.rs
// ============================================================================
// Module: PathGate Rotation Session
// Description: Per-stream upload/finalize state machine with abort rollback.
// Purpose: Drive the two-phase rotation protocol against the policy engine.
// Dependencies: crate::core, crate::runtime::engine
// ============================================================================

//! ## Overview
//! One [`RotateSession`] exists per rotate stream. An upload validates and
//! stages the snapshot into the shared sandbox slot, remembering whatever it
//! displaced; finalize promotes the staged policy atomically. Dropping the
//! session before finalize rolls the sandbox back to its pre-upload content
//! and releases the staging lease, leaving the active policy untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::mem;
use std::sync::Arc;

use crate::core::policy::PolicySnapshot;
use crate::runtime::engine::IndexedPolicy;
use crate::runtime::engine::PolicyEngine;
use crate::runtime::engine::RotateError;

// ============================================================================
// SECTION: Session State
// ============================================================================

/// Lifecycle state of a rotate stream.
#[derive(Debug)]
enum SessionState {
    /// No upload accepted yet; uploads are permitted.
    Idle,
    /// An upload is staged; only finalize or abort may follow.
    AwaitingFinalize {
        /// Sandbox content displaced by this session's upload, restored on
        /// abort.
        displaced: Option<Arc<IndexedPolicy>>,
    },
    /// The session finalized or aborted; no further transitions.
    Closed,
}

// ============================================================================
// SECTION: Rotate Session
// ============================================================================

/// Per-stream rotation state machine.
#[derive(Debug)]
pub struct RotateSession {
    /// Engine holding the shared sandbox slot and active policy.
    engine: Arc<PolicyEngine>,
    /// Current lifecycle state.
    state: SessionState,
}

impl RotateSession {
    /// Opens a session for one rotate stream.
    #[must_use]
    pub fn new(engine: Arc<PolicyEngine>) -> Self {
        Self {
            engine,
            state: SessionState::Idle,
        }
    }

    /// Validates and stages an uploaded snapshot, taking the staging lease.
    ///
    /// A validation failure leaves the session idle so the same stream may
    /// retry with a corrected policy. A stream that already staged an upload,
    /// or any stream arriving while another holds the lease, is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`RotateError::InvalidPolicy`] for a policy failing
    /// validation, [`RotateError::UploadInProgress`] when the staging lease
    /// is unavailable, and [`RotateError::LockPoisoned`] for poisoned engine
    /// state.
    pub fn upload(&mut self, snapshot: PolicySnapshot) -> Result<(), RotateError> {
        self.engine
            .with_stats(|stats| {
                stats.upload_requests = stats.upload_requests.saturating_add(1);
            })
            .map_err(|_| RotateError::LockPoisoned)?;
        if !matches!(self.state, SessionState::Idle) {
            self.engine
                .with_stats(|stats| {
                    stats.upload_errors = stats.upload_errors.saturating_add(1);
                })
                .map_err(|_| RotateError::LockPoisoned)?;
            return Err(RotateError::UploadInProgress);
        }
        let displaced = self.engine.begin_upload(snapshot)?;
        self.state = SessionState::AwaitingFinalize { displaced };
        Ok(())
    }

    /// Promotes this session's staged policy to ACTIVE and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`RotateError::FinalizeBeforeUpload`] when the session holds
    /// no staged upload, [`RotateError::Persistence`] when the durable write
    /// fails (the promotion itself has already happened), and
    /// [`RotateError::LockPoisoned`] for poisoned engine state.
    pub fn finalize(&mut self) -> Result<(), RotateError> {
        self.engine
            .with_stats(|stats| {
                stats.finalize_requests = stats.finalize_requests.saturating_add(1);
            })
            .map_err(|_| RotateError::LockPoisoned)?;
        if !matches!(self.state, SessionState::AwaitingFinalize { .. }) {
            self.engine
                .with_stats(|stats| {
                    stats.finalize_errors = stats.finalize_errors.saturating_add(1);
                })
                .map_err(|_| RotateError::LockPoisoned)?;
            return Err(RotateError::FinalizeBeforeUpload);
        }
        self.state = SessionState::Closed;
        if let Err(err) = self.engine.complete_rotation() {
            self.engine
                .with_stats(|stats| {
                    stats.finalize_errors = stats.finalize_errors.saturating_add(1);
                })
                .map_err(|_| RotateError::LockPoisoned)?;
            return Err(err);
        }
        Ok(())
    }
}

impl Drop for RotateSession {
    fn drop(&mut self) {
        let state = mem::replace(&mut self.state, SessionState::Closed);
        if let SessionState::AwaitingFinalize { displaced } = state {
            self.engine.abort_rotation(displaced);
        }
    }
}
