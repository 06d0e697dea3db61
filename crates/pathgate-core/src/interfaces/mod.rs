// pathgate-core/src/interfaces/mod.rs
// ============================================================================
// Module: PathGate Interfaces
// Description: Seams between the policy engine and its collaborators.
// Purpose: Define persistence, authorization, and time traits with stable errors.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The engine reaches the outside world only through these traits: durable
//! policy storage ([`PolicyPersistence`]), the request-authorization seam
//! consumed by transport adapters ([`RequestAuthorizer`]), and wall-clock time
//! ([`TimeSource`]). Core logic never reads the clock or touches the
//! filesystem directly, which keeps decisions deterministic under test.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use thiserror::Error;

use crate::core::path::ConfigPath;
use crate::core::policy::Action;
use crate::core::policy::Mode;
use crate::core::policy::PolicySnapshot;

// ============================================================================
// SECTION: Persistence
// ============================================================================

/// Error produced by a [`PolicyPersistence`] implementation.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Underlying storage I/O failed.
    #[error("policy store i/o: {0}")]
    Io(String),
    /// Snapshot serialization failed.
    #[error("policy encoding: {0}")]
    Encode(String),
}

/// Outcome of startup recovery from durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveredPolicy {
    /// A durable copy decoded cleanly; commit it as the active policy.
    Recovered(PolicySnapshot),
    /// Copies exist but none decodes; commit the named deny-all fallback.
    CorruptFallback(PolicySnapshot),
    /// No durable copy exists; the engine enters the open state.
    Absent,
}

/// Durable storage for the committed policy.
///
/// Implementations persist on finalize and recover at startup. The sandbox is
/// never persisted.
pub trait PolicyPersistence: Send + Sync {
    /// Writes the snapshot durably, replacing any previous committed policy.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the snapshot cannot be encoded or
    /// written.
    fn persist(&self, snapshot: &PolicySnapshot) -> Result<(), PersistenceError>;

    /// Recovers the committed policy from durable storage.
    ///
    /// Corrupt copies are never an error: they recover into
    /// [`RecoveredPolicy::CorruptFallback`].
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] only for storage faults unrelated to
    /// content, such as an unreadable policy directory.
    fn recover(&self) -> Result<RecoveredPolicy, PersistenceError>;
}

// ============================================================================
// SECTION: Authorization Seam
// ============================================================================

/// Error produced by a [`RequestAuthorizer`].
#[derive(Debug, Error)]
pub enum AuthorizeError {
    /// Shared engine state was poisoned by a panicking holder.
    #[error("policy state lock poisoned")]
    LockPoisoned,
}

/// Authorization seam consumed by transport adapters such as the gNMI
/// boundary. Implementations decide one user/path/mode triple at a time.
pub trait RequestAuthorizer: Send + Sync {
    /// Decides whether `user` may perform a `mode`-class operation on `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizeError`] for internal engine faults; policy outcomes
    /// are expressed as [`Action`], never as errors.
    fn authorize(&self, user: &str, path: &ConfigPath, mode: Mode) -> Result<Action, AuthorizeError>;
}

// ============================================================================
// SECTION: Time
// ============================================================================

/// Wall-clock seam; core code obtains time only through this trait.
pub trait TimeSource: Send + Sync {
    /// Returns the current time as Unix microseconds.
    fn now_micros(&self) -> u64;
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl TimeSource for WallClock {
    fn now_micros(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX))
    }
}
