// pathgate-service/src/gnmi.rs
// ============================================================================
// Module: PathGate gNMI Boundary
// Description: Authorization adapter for configuration-management requests.
// Purpose: Gate every path of a Set or Get before anything is applied.
// Dependencies: pathgate-core, thiserror, tonic, tracing
// ============================================================================

//! ## Overview
//! [`GnmiAuthorizer`] sits between a gNMI front end and its datastore. A Set
//! carries update, replace, and delete paths; a Get carries read paths. Every
//! path is checked against the active policy before the operation touches
//! state, and a single denial fails the whole request, so a multi-path Set is
//! never partially applied. The adapter also exposes the policy-info and
//! per-path counter views a device publishes as operational state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use pathgate_core::Action;
use pathgate_core::ConfigPath;
use pathgate_core::EngineError;
use pathgate_core::Mode;
use pathgate_core::PathCounters;
use pathgate_core::PolicyEngine;
use thiserror::Error;
use tonic::Status;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Error produced when a configuration request is not authorized.
#[derive(Debug, Error)]
pub enum GnmiAuthzError {
    /// The active policy denied one of the request paths.
    #[error("user {user} is not authorized to {mode} path {path}")]
    Denied {
        /// Requesting user.
        user: String,
        /// Operation class that was denied.
        mode: Mode,
        /// xpath form of the denied path.
        path: String,
    },
    /// Internal engine fault.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<GnmiAuthzError> for Status {
    fn from(err: GnmiAuthzError) -> Self {
        match err {
            GnmiAuthzError::Denied { .. } => Self::permission_denied(err.to_string()),
            GnmiAuthzError::Engine(_) => Self::internal(err.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Authorizer
// ============================================================================

/// Version and creation time of the active policy, as published by the
/// device's policy-info state leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePolicyInfo {
    /// Version of the active policy; empty in the open state.
    pub version: String,
    /// Creation time in Unix microseconds; zero in the open state.
    pub created_on: u64,
}

/// gNMI-side authorization gate over the policy engine.
#[derive(Debug, Clone)]
pub struct GnmiAuthorizer {
    /// Shared policy engine.
    engine: Arc<PolicyEngine>,
}

impl GnmiAuthorizer {
    /// Creates the adapter over a shared engine.
    #[must_use]
    pub fn new(engine: Arc<PolicyEngine>) -> Self {
        Self { engine }
    }

    /// Authorizes every path of a Set request (update, replace, delete).
    ///
    /// # Errors
    ///
    /// Returns [`GnmiAuthzError::Denied`] on the first denied path; nothing
    /// may be applied when this fails.
    pub fn authorize_set(&self, user: &str, paths: &[ConfigPath]) -> Result<(), GnmiAuthzError> {
        self.authorize_all(user, paths, Mode::Write)
    }

    /// Authorizes every path of a Get request.
    ///
    /// # Errors
    ///
    /// Returns [`GnmiAuthzError::Denied`] on the first denied path.
    pub fn authorize_get(&self, user: &str, paths: &[ConfigPath]) -> Result<(), GnmiAuthzError> {
        self.authorize_all(user, paths, Mode::Read)
    }

    /// Checks all paths under one mode; all-or-nothing.
    fn authorize_all(
        &self,
        user: &str,
        paths: &[ConfigPath],
        mode: Mode,
    ) -> Result<(), GnmiAuthzError> {
        for path in paths {
            if self.engine.authorize(user, path, mode)? == Action::Deny {
                tracing::info!(%user, %mode, path = %path, "request denied");
                return Err(GnmiAuthzError::Denied {
                    user: user.to_string(),
                    mode,
                    path: path.xpath(),
                });
            }
        }
        Ok(())
    }

    /// Returns the active policy's version and creation time, if a policy is
    /// committed or the engine is open.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when engine state is poisoned.
    pub fn active_policy_info(&self) -> Result<Option<ActivePolicyInfo>, EngineError> {
        Ok(self.engine.active_policy_info()?.map(|(version, created_on)| ActivePolicyInfo {
            version,
            created_on,
        }))
    }

    /// Returns the per-path decision counters keyed by xpath.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when engine state is poisoned.
    pub fn path_counters(&self) -> Result<BTreeMap<String, PathCounters>, EngineError> {
        self.engine.all_path_counters()
    }
}
