// pathgate-core/src/core/counters.rs
// ============================================================================
// Module: PathGate Decision Counters
// Description: Per-path access tallies and aggregate engine statistics.
// Purpose: Provide the observable counter surface updated by every decision.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every authorization decision updates two layers of counters: a per-path
//! [`PathCounters`] entry keyed by the request xpath (plus the `/` root
//! aggregate), and the engine-wide [`EngineStats`] snapshot mirroring the
//! rotation, probe, get, and gNMI statistics a device would publish.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Per-Path Counters
// ============================================================================

/// Accept/reject tally for one operation class on one path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTally {
    /// Number of permitted operations.
    pub accepts: u64,
    /// Number of denied operations.
    pub rejects: u64,
    /// Unix microseconds of the most recent permit; zero if none.
    pub last_accept: u64,
    /// Unix microseconds of the most recent deny; zero if none.
    pub last_reject: u64,
}

impl AccessTally {
    /// Records a permitted operation at the given time.
    pub fn record_accept(&mut self, now_micros: u64) {
        self.accepts = self.accepts.saturating_add(1);
        self.last_accept = now_micros;
    }

    /// Records a denied operation at the given time.
    pub fn record_reject(&mut self, now_micros: u64) {
        self.rejects = self.rejects.saturating_add(1);
        self.last_reject = now_micros;
    }
}

/// Read and write tallies for one path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCounters {
    /// Tally of read-class decisions.
    pub reads: AccessTally,
    /// Tally of write-class decisions.
    pub writes: AccessTally,
}

// ============================================================================
// SECTION: Engine Statistics
// ============================================================================

/// Aggregate engine statistics, snapshotted on request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Rotate streams holding the staging lease right now.
    pub rotations_in_progress: u64,
    /// Completed policy rotations (successful finalizes).
    pub policy_rotations: u64,
    /// Upload requests received, valid or not.
    pub upload_requests: u64,
    /// Upload requests rejected (validation or sequencing).
    pub upload_errors: u64,
    /// Finalize requests received.
    pub finalize_requests: u64,
    /// Finalize requests rejected.
    pub finalize_errors: u64,
    /// Probe requests received.
    pub probe_requests: u64,
    /// Probe requests rejected.
    pub probe_errors: u64,
    /// Get requests received.
    pub get_requests: u64,
    /// Get requests rejected.
    pub get_errors: u64,
    /// Durable policy copies that failed to decode during recovery.
    pub decode_errors: u64,
    /// Authorization requests decided while no committed policy was present.
    pub no_policy_requests: u64,
    /// Write-class (Set path) decisions that permitted.
    pub set_path_permits: u64,
    /// Write-class (Set path) decisions that denied.
    pub set_path_denies: u64,
    /// Read-class (Get path) decisions that permitted.
    pub get_path_permits: u64,
    /// Read-class (Get path) decisions that denied.
    pub get_path_denies: u64,
}
