// pathgate-core/src/runtime/engine.rs
// ============================================================================
// Module: PathGate Policy Engine
// Description: Active/sandbox policy state, decisions, recovery, statistics.
// Purpose: Hold the committed policy and decide authorization requests.
// Dependencies: crate::core, crate::interfaces, crate::runtime::matcher, thiserror
// ============================================================================

//! ## Overview
//! [`PolicyEngine`] owns the two policy instances. ACTIVE is an immutable
//! snapshot behind a read/write lock; readers clone the `Arc` and decide
//! against a consistent policy while finalize swaps the pointer in a single
//! writer critical section. SANDBOX is a mutex-guarded slot with a staging
//! lease that serializes concurrent rotate streams. A fresh engine denies
//! everything until recovery or a finalize installs a policy; recovery that
//! finds no durable copy at all enters the open state, which permits
//! everything and reports an empty version.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;

use thiserror::Error;

use crate::core::counters::EngineStats;
use crate::core::counters::PathCounters;
use crate::core::path::ConfigPath;
use crate::core::policy::Action;
use crate::core::policy::AuthorizationPolicy;
use crate::core::policy::Mode;
use crate::core::policy::PolicyError;
use crate::core::policy::PolicyInstance;
use crate::core::policy::PolicySnapshot;
use crate::core::policy::validate_policy;
use crate::interfaces::AuthorizeError;
use crate::interfaces::PersistenceError;
use crate::interfaces::PolicyPersistence;
use crate::interfaces::RecoveredPolicy;
use crate::interfaces::RequestAuthorizer;
use crate::interfaces::TimeSource;
use crate::runtime::matcher::RuleIndex;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Internal engine fault.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Shared engine state was poisoned by a panicking holder.
    #[error("policy state lock poisoned")]
    LockPoisoned,
    /// Durable storage failed during recovery or finalize.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Error produced by the rotate flow (upload and finalize).
#[derive(Debug, Error)]
pub enum RotateError {
    /// The uploaded policy failed structural validation.
    #[error(transparent)]
    InvalidPolicy(#[from] PolicyError),
    /// An upload arrived while the staging lease was already held.
    #[error("single upload request per Rotate stream")]
    UploadInProgress,
    /// Finalize arrived on a stream that has not uploaded.
    #[error("Finalize rotation called before upload request")]
    FinalizeBeforeUpload,
    /// The finalized policy could not be written durably.
    #[error("failed to persist policy: {0}")]
    Persistence(#[from] PersistenceError),
    /// Shared engine state was poisoned by a panicking holder.
    #[error("policy state lock poisoned")]
    LockPoisoned,
}

/// Error produced by probe requests.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe named no user.
    #[error("user not specified")]
    UserNotSpecified,
    /// The requested instance holds no policy.
    #[error("requested policy instance is nil")]
    NilInstance,
    /// Shared engine state was poisoned by a panicking holder.
    #[error("policy state lock poisoned")]
    LockPoisoned,
}

/// Error produced by get requests.
#[derive(Debug, Error)]
pub enum GetError {
    /// The requested instance holds no policy.
    #[error("requested policy instance is nil")]
    NilInstance,
    /// Shared engine state was poisoned by a panicking holder.
    #[error("policy state lock poisoned")]
    LockPoisoned,
}

// ============================================================================
// SECTION: Engine State
// ============================================================================

/// A snapshot paired with its rule index, built once when staged or committed.
#[derive(Debug)]
pub(crate) struct IndexedPolicy {
    /// The immutable snapshot.
    pub(crate) snapshot: PolicySnapshot,
    /// Rule index over the snapshot's policy.
    index: RuleIndex,
}

impl IndexedPolicy {
    /// Indexes a snapshot.
    fn new(snapshot: PolicySnapshot) -> Self {
        let index = RuleIndex::build(&snapshot.policy);
        Self { snapshot, index }
    }

    /// Decides a request against this policy. A committed policy with zero
    /// rules denies everything; an unmatched request under a non-degenerate
    /// policy permits.
    fn decide(&self, user: &str, path: &ConfigPath, mode: Mode) -> Action {
        if self.index.rule_count() == 0 {
            return Action::Deny;
        }
        self.index.decide(user, path, mode).unwrap_or(Action::Permit)
    }
}

/// State of the ACTIVE instance.
#[derive(Debug)]
enum ActiveState {
    /// Fresh engine: nothing recovered, nothing finalized. Denies everything.
    FailSafe,
    /// Recovery found no durable copy. Permits everything and reports an
    /// empty version.
    Open,
    /// A committed policy.
    Committed(Arc<IndexedPolicy>),
}

/// State of the SANDBOX instance.
#[derive(Debug, Default)]
struct SandboxSlot {
    /// The staged policy, if any.
    staged: Option<Arc<IndexedPolicy>>,
    /// True while a rotate stream holds the staging lease.
    leased: bool,
}

/// Probe outcome: the consulted version and the decided action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Version of the policy the probe evaluated against.
    pub version: String,
    /// Decided action.
    pub action: Action,
}

/// Outcome kind of startup recovery, for caller-side logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// A durable copy was committed.
    Recovered,
    /// The named deny-all fallback was committed.
    CorruptFallback,
    /// No durable copy existed; the engine is open.
    Absent,
}

// ============================================================================
// SECTION: Policy Engine
// ============================================================================

/// The authorization policy engine.
pub struct PolicyEngine {
    /// ACTIVE instance; readers briefly take the read lock and clone the arc.
    active: RwLock<ActiveState>,
    /// SANDBOX slot shared by all rotate streams.
    sandbox: Mutex<SandboxSlot>,
    /// Aggregate statistics.
    stats: Mutex<EngineStats>,
    /// Per-path decision counters keyed by request xpath.
    counters: Mutex<BTreeMap<String, PathCounters>>,
    /// Durable storage seam.
    store: Arc<dyn PolicyPersistence>,
    /// Wall-clock seam for counter timestamps.
    clock: Arc<dyn TimeSource>,
}

impl PolicyEngine {
    /// Creates an engine in the fail-safe state.
    #[must_use]
    pub fn new(store: Arc<dyn PolicyPersistence>, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            active: RwLock::new(ActiveState::FailSafe),
            sandbox: Mutex::new(SandboxSlot::default()),
            stats: Mutex::new(EngineStats::default()),
            counters: Mutex::new(BTreeMap::new()),
            store,
            clock,
        }
    }

    /// Recovers the committed policy from durable storage at startup.
    ///
    /// Corrupt durable copies commit the named deny-all fallback; a missing
    /// policy leaves the engine open. The sandbox is empty after every start.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] for storage faults or poisoned engine state.
    pub fn recover_at_start(&self) -> Result<RecoveryOutcome, EngineError> {
        let recovered = self.store.recover()?;
        let (state, outcome) = match recovered {
            RecoveredPolicy::Recovered(snapshot) => (
                ActiveState::Committed(Arc::new(IndexedPolicy::new(snapshot))),
                RecoveryOutcome::Recovered,
            ),
            RecoveredPolicy::CorruptFallback(snapshot) => {
                self.with_stats(|stats| {
                    stats.decode_errors = stats.decode_errors.saturating_add(1);
                })?;
                (
                    ActiveState::Committed(Arc::new(IndexedPolicy::new(snapshot))),
                    RecoveryOutcome::CorruptFallback,
                )
            }
            RecoveredPolicy::Absent => (ActiveState::Open, RecoveryOutcome::Absent),
        };
        let mut active = self.active.write().map_err(|_| EngineError::LockPoisoned)?;
        *active = state;
        drop(active);
        let mut sandbox = self.sandbox.lock().map_err(|_| EngineError::LockPoisoned)?;
        *sandbox = SandboxSlot::default();
        drop(sandbox);
        Ok(outcome)
    }

    /// Decides whether `user` may perform a `mode`-class operation on `path`,
    /// updating per-path counters and aggregate statistics.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LockPoisoned`] when engine state is poisoned.
    pub fn authorize(
        &self,
        user: &str,
        path: &ConfigPath,
        mode: Mode,
    ) -> Result<Action, EngineError> {
        let committed = {
            let active = self.active.read().map_err(|_| EngineError::LockPoisoned)?;
            match &*active {
                ActiveState::FailSafe => None,
                ActiveState::Open => Some(None),
                ActiveState::Committed(policy) => Some(Some(Arc::clone(policy))),
            }
        };
        let (decision, no_policy) = match committed {
            None => (Action::Deny, true),
            Some(None) => (Action::Permit, true),
            Some(Some(policy)) => (policy.decide(user, path, mode), false),
        };
        self.record_decision(path, mode, decision, no_policy)?;
        Ok(decision)
    }

    /// Probes the named instance with a hypothetical request. Does not touch
    /// per-path counters; probe statistics are updated instead.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] for an unnamed user, an instance holding no
    /// policy, or poisoned engine state.
    pub fn probe(
        &self,
        user: &str,
        path: &ConfigPath,
        mode: Mode,
        instance: PolicyInstance,
    ) -> Result<ProbeOutcome, ProbeError> {
        self.with_stats(|stats| {
            stats.probe_requests = stats.probe_requests.saturating_add(1);
        })
        .map_err(|_| ProbeError::LockPoisoned)?;
        match self.probe_inner(user, path, mode, instance) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.with_stats(|stats| {
                    stats.probe_errors = stats.probe_errors.saturating_add(1);
                })
                .map_err(|_| ProbeError::LockPoisoned)?;
                Err(err)
            }
        }
    }

    /// Probe body; separated so every error path counts exactly once.
    fn probe_inner(
        &self,
        user: &str,
        path: &ConfigPath,
        mode: Mode,
        instance: PolicyInstance,
    ) -> Result<ProbeOutcome, ProbeError> {
        if user.is_empty() {
            return Err(ProbeError::UserNotSpecified);
        }
        match instance {
            PolicyInstance::Active => {
                let active = self.active.read().map_err(|_| ProbeError::LockPoisoned)?;
                match &*active {
                    ActiveState::FailSafe => Err(ProbeError::NilInstance),
                    ActiveState::Open => Ok(ProbeOutcome {
                        version: String::new(),
                        action: Action::Permit,
                    }),
                    ActiveState::Committed(policy) => Ok(ProbeOutcome {
                        version: policy.snapshot.version.clone(),
                        action: policy.decide(user, path, mode),
                    }),
                }
            }
            PolicyInstance::Sandbox => {
                let sandbox = self.sandbox.lock().map_err(|_| ProbeError::LockPoisoned)?;
                sandbox.staged.as_ref().map_or(Err(ProbeError::NilInstance), |policy| {
                    Ok(ProbeOutcome {
                        version: policy.snapshot.version.clone(),
                        action: policy.decide(user, path, mode),
                    })
                })
            }
        }
    }

    /// Returns the snapshot held by the named instance.
    ///
    /// The open ACTIVE instance reports an empty version, zero creation time,
    /// and an empty policy. Repeated gets with no intervening finalize return
    /// identical snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`GetError`] when the instance holds no policy or engine state
    /// is poisoned.
    pub fn get(&self, instance: PolicyInstance) -> Result<PolicySnapshot, GetError> {
        self.with_stats(|stats| {
            stats.get_requests = stats.get_requests.saturating_add(1);
        })
        .map_err(|_| GetError::LockPoisoned)?;
        match self.get_inner(instance) {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                self.with_stats(|stats| {
                    stats.get_errors = stats.get_errors.saturating_add(1);
                })
                .map_err(|_| GetError::LockPoisoned)?;
                Err(err)
            }
        }
    }

    /// Get body; separated so every error path counts exactly once.
    fn get_inner(&self, instance: PolicyInstance) -> Result<PolicySnapshot, GetError> {
        match instance {
            PolicyInstance::Active => {
                let active = self.active.read().map_err(|_| GetError::LockPoisoned)?;
                match &*active {
                    ActiveState::FailSafe => Err(GetError::NilInstance),
                    ActiveState::Open => Ok(PolicySnapshot::new(
                        String::new(),
                        0,
                        AuthorizationPolicy::default(),
                    )),
                    ActiveState::Committed(policy) => Ok(policy.snapshot.clone()),
                }
            }
            PolicyInstance::Sandbox => {
                let sandbox = self.sandbox.lock().map_err(|_| GetError::LockPoisoned)?;
                sandbox
                    .staged
                    .as_ref()
                    .map_or(Err(GetError::NilInstance), |policy| Ok(policy.snapshot.clone()))
            }
        }
    }

    /// Returns a snapshot of the aggregate statistics.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LockPoisoned`] when engine state is poisoned.
    pub fn stats(&self) -> Result<EngineStats, EngineError> {
        let stats = self.stats.lock().map_err(|_| EngineError::LockPoisoned)?;
        Ok(stats.clone())
    }

    /// Returns the decision counters for one path, if any decision touched it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LockPoisoned`] when engine state is poisoned.
    pub fn path_counters(&self, path: &ConfigPath) -> Result<Option<PathCounters>, EngineError> {
        let counters = self.counters.lock().map_err(|_| EngineError::LockPoisoned)?;
        Ok(counters.get(&path.xpath()).copied())
    }

    /// Returns every per-path counter entry, keyed by xpath.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LockPoisoned`] when engine state is poisoned.
    pub fn all_path_counters(&self) -> Result<BTreeMap<String, PathCounters>, EngineError> {
        let counters = self.counters.lock().map_err(|_| EngineError::LockPoisoned)?;
        Ok(counters.clone())
    }

    /// Returns the version and creation time of the ACTIVE policy, if one is
    /// committed. The open state reports an empty version and zero time.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LockPoisoned`] when engine state is poisoned.
    pub fn active_policy_info(&self) -> Result<Option<(String, u64)>, EngineError> {
        let active = self.active.read().map_err(|_| EngineError::LockPoisoned)?;
        Ok(match &*active {
            ActiveState::FailSafe => None,
            ActiveState::Open => Some((String::new(), 0)),
            ActiveState::Committed(policy) => {
                Some((policy.snapshot.version.clone(), policy.snapshot.created_on))
            }
        })
    }

    // ------------------------------------------------------------------
    // Rotation internals, driven by `RotateSession`.
    // ------------------------------------------------------------------

    /// Validates and stages an upload, taking the staging lease. Returns the
    /// displaced sandbox content for session rollback.
    pub(crate) fn begin_upload(
        &self,
        snapshot: PolicySnapshot,
    ) -> Result<Option<Arc<IndexedPolicy>>, RotateError> {
        if let Err(err) = validate_policy(&snapshot.policy) {
            self.with_stats(|stats| {
                stats.upload_errors = stats.upload_errors.saturating_add(1);
            })
            .map_err(|_| RotateError::LockPoisoned)?;
            return Err(RotateError::InvalidPolicy(err));
        }
        let mut sandbox = self.sandbox.lock().map_err(|_| RotateError::LockPoisoned)?;
        if sandbox.leased {
            drop(sandbox);
            self.with_stats(|stats| {
                stats.upload_errors = stats.upload_errors.saturating_add(1);
            })
            .map_err(|_| RotateError::LockPoisoned)?;
            return Err(RotateError::UploadInProgress);
        }
        let displaced = sandbox.staged.replace(Arc::new(IndexedPolicy::new(snapshot)));
        sandbox.leased = true;
        drop(sandbox);
        self.with_stats(|stats| {
            stats.rotations_in_progress = stats.rotations_in_progress.saturating_add(1);
        })
        .map_err(|_| RotateError::LockPoisoned)?;
        Ok(displaced)
    }

    /// Promotes the staged policy to ACTIVE, persists it, and clears SANDBOX.
    pub(crate) fn complete_rotation(&self) -> Result<(), RotateError> {
        let staged = {
            let mut sandbox = self.sandbox.lock().map_err(|_| RotateError::LockPoisoned)?;
            let staged = sandbox.staged.take().ok_or(RotateError::FinalizeBeforeUpload)?;
            sandbox.leased = false;
            staged
        };
        {
            let mut active = self.active.write().map_err(|_| RotateError::LockPoisoned)?;
            *active = ActiveState::Committed(Arc::clone(&staged));
        }
        self.with_stats(|stats| {
            stats.rotations_in_progress = stats.rotations_in_progress.saturating_sub(1);
            stats.policy_rotations = stats.policy_rotations.saturating_add(1);
        })
        .map_err(|_| RotateError::LockPoisoned)?;
        self.store.persist(&staged.snapshot)?;
        Ok(())
    }

    /// Restores the sandbox to its pre-upload content and releases the lease.
    /// Called from session teardown; best effort, never panics.
    pub(crate) fn abort_rotation(&self, displaced: Option<Arc<IndexedPolicy>>) {
        if let Ok(mut sandbox) = self.sandbox.lock() {
            sandbox.staged = displaced;
            sandbox.leased = false;
        }
        if let Ok(mut stats) = self.stats.lock() {
            stats.rotations_in_progress = stats.rotations_in_progress.saturating_sub(1);
        }
    }

    /// Applies a closure to the aggregate statistics under the stats lock.
    pub(crate) fn with_stats(
        &self,
        apply: impl FnOnce(&mut EngineStats),
    ) -> Result<(), EngineError> {
        let mut stats = self.stats.lock().map_err(|_| EngineError::LockPoisoned)?;
        apply(&mut stats);
        Ok(())
    }

    /// Notes a wire-level decode failure observed by the transport layer.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LockPoisoned`] when engine state is poisoned.
    pub fn note_decode_error(&self) -> Result<(), EngineError> {
        self.with_stats(|stats| {
            stats.decode_errors = stats.decode_errors.saturating_add(1);
        })
    }

    /// Updates per-path counters and aggregate statistics for one decision.
    fn record_decision(
        &self,
        path: &ConfigPath,
        mode: Mode,
        decision: Action,
        no_policy: bool,
    ) -> Result<(), EngineError> {
        let now = self.clock.now_micros();
        let mut keys = vec![path.xpath()];
        if !path.is_root() {
            keys.push(ConfigPath::root().xpath());
        }
        {
            let mut counters = self.counters.lock().map_err(|_| EngineError::LockPoisoned)?;
            for key in keys {
                let entry = counters.entry(key).or_default();
                let tally = match mode {
                    Mode::Read => &mut entry.reads,
                    Mode::Write => &mut entry.writes,
                };
                match decision {
                    Action::Permit => tally.record_accept(now),
                    Action::Deny => tally.record_reject(now),
                }
            }
        }
        self.with_stats(|stats| {
            if no_policy {
                stats.no_policy_requests = stats.no_policy_requests.saturating_add(1);
            }
            match (mode, decision) {
                (Mode::Write, Action::Permit) => {
                    stats.set_path_permits = stats.set_path_permits.saturating_add(1);
                }
                (Mode::Write, Action::Deny) => {
                    stats.set_path_denies = stats.set_path_denies.saturating_add(1);
                }
                (Mode::Read, Action::Permit) => {
                    stats.get_path_permits = stats.get_path_permits.saturating_add(1);
                }
                (Mode::Read, Action::Deny) => {
                    stats.get_path_denies = stats.get_path_denies.saturating_add(1);
                }
            }
        })
    }
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine").finish_non_exhaustive()
    }
}

impl RequestAuthorizer for PolicyEngine {
    fn authorize(
        &self,
        user: &str,
        path: &ConfigPath,
        mode: Mode,
    ) -> Result<Action, AuthorizeError> {
        Self::authorize(self, user, path, mode).map_err(|_| AuthorizeError::LockPoisoned)
    }
}
