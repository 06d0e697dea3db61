// crates/pathgate-core/tests/rotation.rs
// ============================================================================
// Module: Rotation Protocol Tests
// Description: Upload/finalize sequencing, lease exclusivity, and rollback.
// Purpose: Verify the two-phase rotation state machine and its error strings.
// ============================================================================

//! Tests for [`pathgate_core::RotateSession`].

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;

use pathgate_core::Action;
use pathgate_core::AuthorizationPolicy;
use pathgate_core::AuthorizationRule;
use pathgate_core::ConfigPath;
use pathgate_core::Mode;
use pathgate_core::PathElem;
use pathgate_core::PersistenceError;
use pathgate_core::PolicyEngine;
use pathgate_core::PolicyInstance;
use pathgate_core::PolicyPersistence;
use pathgate_core::PolicySnapshot;
use pathgate_core::Principal;
use pathgate_core::RecoveredPolicy;
use pathgate_core::RotateSession;
use pathgate_core::TimeSource;

/// In-memory persistence stub recording every persisted snapshot.
#[derive(Default)]
struct MemoryStore {
    saved: Mutex<Vec<PolicySnapshot>>,
}

impl PolicyPersistence for MemoryStore {
    fn persist(&self, snapshot: &PolicySnapshot) -> Result<(), PersistenceError> {
        self.saved.lock().unwrap().push(snapshot.clone());
        Ok(())
    }

    fn recover(&self) -> Result<RecoveredPolicy, PersistenceError> {
        Ok(RecoveredPolicy::Absent)
    }
}

/// Fixed clock; rotation never reads time, decisions do.
struct FixedClock;

impl TimeSource for FixedClock {
    fn now_micros(&self) -> u64 {
        7
    }
}

fn engine() -> (Arc<PolicyEngine>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let engine = Arc::new(PolicyEngine::new(
        Arc::clone(&store) as Arc<dyn PolicyPersistence>,
        Arc::new(FixedClock),
    ));
    (engine, store)
}

fn valid_snapshot(version: &str) -> PolicySnapshot {
    PolicySnapshot::new(
        version,
        100,
        AuthorizationPolicy {
            groups: vec![],
            rules: vec![AuthorizationRule {
                id: String::new(),
                path: ConfigPath::from_names(["system"]),
                principal: Principal::User("oper".to_string()),
                mode: Mode::Write,
                action: Action::Permit,
            }],
        },
    )
}

fn invalid_snapshot() -> PolicySnapshot {
    PolicySnapshot::new(
        "bad",
        100,
        AuthorizationPolicy {
            groups: vec![],
            rules: vec![AuthorizationRule {
                id: String::new(),
                path: ConfigPath::new("", vec![PathElem::new("*")]),
                principal: Principal::User("oper".to_string()),
                mode: Mode::Write,
                action: Action::Permit,
            }],
        },
    )
}

/// Upload then finalize commits the staged policy and persists it.
#[test]
fn upload_then_finalize_promotes_and_persists() {
    let (engine, store) = engine();
    let snapshot = valid_snapshot("v1");
    let mut session = RotateSession::new(Arc::clone(&engine));
    session.upload(snapshot.clone()).unwrap();
    session.finalize().unwrap();
    assert_eq!(engine.get(PolicyInstance::Active).unwrap(), snapshot);
    assert_eq!(store.saved.lock().unwrap().as_slice(), &[snapshot]);
    let stats = engine.stats().unwrap();
    assert_eq!(stats.policy_rotations, 1);
    assert_eq!(stats.rotations_in_progress, 0);
}

/// Finalize clears the sandbox back to the no-staged-policy state.
#[test]
fn finalize_clears_the_sandbox() {
    let (engine, _store) = engine();
    let mut session = RotateSession::new(Arc::clone(&engine));
    session.upload(valid_snapshot("v1")).unwrap();
    session.finalize().unwrap();
    let err = engine.get(PolicyInstance::Sandbox).unwrap_err();
    assert_eq!(err.to_string(), "requested policy instance is nil");
}

/// A second upload on the same stream is rejected.
#[test]
fn second_upload_on_same_stream_is_rejected() {
    let (engine, _store) = engine();
    let mut session = RotateSession::new(Arc::clone(&engine));
    session.upload(valid_snapshot("v1")).unwrap();
    let err = session.upload(valid_snapshot("v2")).unwrap_err();
    assert_eq!(err.to_string(), "single upload request per Rotate stream");
    // The staged policy is the first upload, untouched.
    assert_eq!(engine.get(PolicyInstance::Sandbox).unwrap().version, "v1");
}

/// A concurrent stream cannot upload while another holds the staging lease.
#[test]
fn concurrent_upload_is_rejected_while_lease_is_held() {
    let (engine, _store) = engine();
    let mut first = RotateSession::new(Arc::clone(&engine));
    first.upload(valid_snapshot("v1")).unwrap();
    let mut second = RotateSession::new(Arc::clone(&engine));
    let err = second.upload(valid_snapshot("v2")).unwrap_err();
    assert_eq!(err.to_string(), "single upload request per Rotate stream");
    // The first stream can still finalize.
    first.finalize().unwrap();
    assert_eq!(engine.get(PolicyInstance::Active).unwrap().version, "v1");
}

/// Finalize without a prior upload is rejected with the sequencing message.
#[test]
fn finalize_before_upload_is_rejected() {
    let (engine, store) = engine();
    let mut session = RotateSession::new(Arc::clone(&engine));
    let err = session.finalize().unwrap_err();
    assert_eq!(err.to_string(), "Finalize rotation called before upload request");
    assert!(store.saved.lock().unwrap().is_empty());
    assert_eq!(engine.stats().unwrap().finalize_errors, 1);
}

/// An invalid upload reports the validation error, stages nothing, and
/// leaves the stream free to retry.
#[test]
fn invalid_upload_leaves_session_retryable() {
    let (engine, _store) = engine();
    let mut session = RotateSession::new(Arc::clone(&engine));
    let err = session.upload(invalid_snapshot()).unwrap_err();
    assert_eq!(err.to_string(), "invalid policy: wildcard path names are not permitted");
    assert!(engine.get(PolicyInstance::Sandbox).is_err());
    // Same stream may retry with a corrected policy.
    session.upload(valid_snapshot("v1")).unwrap();
    session.finalize().unwrap();
    let stats = engine.stats().unwrap();
    assert_eq!(stats.upload_requests, 2);
    assert_eq!(stats.upload_errors, 1);
}

/// An upload with a single empty rule fails validation and nothing commits;
/// the engine stays fail-safe and denies.
#[test]
fn empty_rule_upload_commits_nothing() {
    let (engine, _store) = engine();
    let snapshot = PolicySnapshot::new(
        "empty-rule",
        1,
        AuthorizationPolicy {
            groups: vec![],
            rules: vec![AuthorizationRule {
                id: String::new(),
                path: ConfigPath::root(),
                principal: Principal::User("oper".to_string()),
                mode: Mode::Write,
                action: Action::Permit,
            }],
        },
    );
    let mut session = RotateSession::new(Arc::clone(&engine));
    let err = session.upload(snapshot).unwrap_err();
    assert!(err.to_string().contains("invalid policy"));
    drop(session);
    let path = ConfigPath::from_names(["system"]);
    assert_eq!(engine.authorize("oper", &path, Mode::Write).unwrap(), Action::Deny);
}

/// Dropping a session before finalize restores the sandbox and releases the
/// lease; the active policy is untouched.
#[test]
fn abandoned_session_rolls_back_the_sandbox() {
    let (engine, _store) = engine();
    let mut committed = RotateSession::new(Arc::clone(&engine));
    committed.upload(valid_snapshot("v1")).unwrap();
    committed.finalize().unwrap();

    let mut abandoned = RotateSession::new(Arc::clone(&engine));
    abandoned.upload(valid_snapshot("v2")).unwrap();
    assert_eq!(engine.get(PolicyInstance::Sandbox).unwrap().version, "v2");
    drop(abandoned);

    // Sandbox reverted to its pre-upload (empty) state, ACTIVE untouched.
    assert!(engine.get(PolicyInstance::Sandbox).is_err());
    assert_eq!(engine.get(PolicyInstance::Active).unwrap().version, "v1");
    assert_eq!(engine.stats().unwrap().rotations_in_progress, 0);

    // The lease is free again.
    let mut next = RotateSession::new(Arc::clone(&engine));
    next.upload(valid_snapshot("v3")).unwrap();
    next.finalize().unwrap();
    assert_eq!(engine.get(PolicyInstance::Active).unwrap().version, "v3");
}

/// The active snapshot never mixes versions across a finalize.
#[test]
fn finalize_swaps_the_whole_snapshot() {
    let (engine, _store) = engine();
    let mut first = RotateSession::new(Arc::clone(&engine));
    first.upload(valid_snapshot("v1")).unwrap();
    first.finalize().unwrap();
    let before = engine.get(PolicyInstance::Active).unwrap();

    let mut second = RotateSession::new(Arc::clone(&engine));
    second.upload(valid_snapshot("v2")).unwrap();
    // Until finalize, ACTIVE still serves the old snapshot in its entirety.
    assert_eq!(engine.get(PolicyInstance::Active).unwrap(), before);
    second.finalize().unwrap();
    let after = engine.get(PolicyInstance::Active).unwrap();
    assert_eq!(after, valid_snapshot("v2"));
}
