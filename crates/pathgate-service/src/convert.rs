// pathgate-service/src/convert.rs
// ============================================================================
// Module: PathGate Wire Conversions
// Description: Conversions between pathgate.v1 messages and core types.
// Purpose: Decode uploads fail-closed and encode snapshots for queries.
// Dependencies: crate::pb, pathgate-core, thiserror
// ============================================================================

//! ## Overview
//! Protobuf messages are weaker than the core model: principals, modes, and
//! actions can all be absent on the wire. Decoding enforces the required
//! fields here, so the engine only ever sees fully specified policies, and
//! every shape failure surfaces in the `invalid policy` taxonomy the rotate
//! stream reports.

// ============================================================================
// SECTION: Imports
// ============================================================================

use pathgate_core::Action;
use pathgate_core::AuthorizationPolicy;
use pathgate_core::AuthorizationRule;
use pathgate_core::ConfigPath;
use pathgate_core::Group;
use pathgate_core::Mode;
use pathgate_core::PathElem;
use pathgate_core::PolicyInstance;
use pathgate_core::PolicySnapshot;
use pathgate_core::Principal;
use thiserror::Error;

use crate::pb::v1 as pb;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Error produced when an uploaded policy message is structurally incomplete.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The upload carried no policy message at all.
    #[error("invalid policy: policy not specified")]
    PolicyNotSpecified,
    /// A rule carried no path message.
    #[error("invalid policy: rule path not specified")]
    RulePathNotSpecified,
    /// A rule carried no principal.
    #[error("invalid policy: rule principal not specified")]
    PrincipalNotSpecified,
    /// A rule carried an unspecified or unknown mode.
    #[error("invalid policy: rule mode not specified")]
    ModeNotSpecified,
    /// A rule carried an unspecified or unknown action.
    #[error("invalid policy: rule action not specified")]
    ActionNotSpecified,
}

// ============================================================================
// SECTION: Wire to Core
// ============================================================================

/// Decodes an upload request into a policy snapshot.
///
/// # Errors
///
/// Returns [`DecodeError`] when the policy or any rule field required by the
/// core model is absent on the wire.
pub fn snapshot_from_upload(upload: pb::UploadRequest) -> Result<PolicySnapshot, DecodeError> {
    let policy = upload.policy.ok_or(DecodeError::PolicyNotSpecified)?;
    Ok(PolicySnapshot::new(upload.version, upload.created_on, policy_from_pb(policy)?))
}

/// Decodes a wire policy into the core model.
///
/// # Errors
///
/// Returns [`DecodeError`] when any rule is structurally incomplete.
pub fn policy_from_pb(policy: pb::AuthorizationPolicy) -> Result<AuthorizationPolicy, DecodeError> {
    let groups = policy
        .groups
        .into_iter()
        .map(|group| Group {
            name: group.name,
            users: group.users,
        })
        .collect();
    let rules = policy
        .rules
        .into_iter()
        .map(rule_from_pb)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AuthorizationPolicy { groups, rules })
}

/// Decodes one wire rule, enforcing every required field.
fn rule_from_pb(rule: pb::AuthorizationRule) -> Result<AuthorizationRule, DecodeError> {
    let path = rule.path.ok_or(DecodeError::RulePathNotSpecified)?;
    let principal = match rule.principal {
        Some(pb::authorization_rule::Principal::User(user)) => Principal::User(user),
        Some(pb::authorization_rule::Principal::Group(group)) => Principal::Group(group),
        None => return Err(DecodeError::PrincipalNotSpecified),
    };
    let mode = mode_from_pb(rule.mode).ok_or(DecodeError::ModeNotSpecified)?;
    let action = action_from_pb(rule.action).ok_or(DecodeError::ActionNotSpecified)?;
    Ok(AuthorizationRule {
        id: rule.id,
        path: path_from_pb(path),
        principal,
        mode,
        action,
    })
}

/// Decodes a wire path.
#[must_use]
pub fn path_from_pb(path: pb::Path) -> ConfigPath {
    ConfigPath::new(
        path.origin,
        path.elem
            .into_iter()
            .map(|elem| PathElem {
                name: elem.name,
                keys: elem.key.into_iter().collect(),
            })
            .collect(),
    )
}

/// Decodes a wire mode; unspecified and unknown values are `None`.
#[must_use]
pub fn mode_from_pb(value: i32) -> Option<Mode> {
    match pb::Mode::try_from(value) {
        Ok(pb::Mode::Read) => Some(Mode::Read),
        Ok(pb::Mode::Write) => Some(Mode::Write),
        Ok(pb::Mode::Unspecified) | Err(_) => None,
    }
}

/// Decodes a wire action; unspecified and unknown values are `None`.
#[must_use]
pub fn action_from_pb(value: i32) -> Option<Action> {
    match pb::Action::try_from(value) {
        Ok(pb::Action::Permit) => Some(Action::Permit),
        Ok(pb::Action::Deny) => Some(Action::Deny),
        Ok(pb::Action::Unspecified) | Err(_) => None,
    }
}

/// Decodes a wire instance selector; unspecified and unknown are `None`.
#[must_use]
pub fn instance_from_pb(value: i32) -> Option<PolicyInstance> {
    match pb::PolicyInstance::try_from(value) {
        Ok(pb::PolicyInstance::Active) => Some(PolicyInstance::Active),
        Ok(pb::PolicyInstance::Sandbox) => Some(PolicyInstance::Sandbox),
        Ok(pb::PolicyInstance::Unspecified) | Err(_) => None,
    }
}

// ============================================================================
// SECTION: Core to Wire
// ============================================================================

/// Encodes a core path.
#[must_use]
pub fn path_to_pb(path: &ConfigPath) -> pb::Path {
    pb::Path {
        origin: path.origin.clone(),
        elem: path
            .elems
            .iter()
            .map(|elem| pb::PathElem {
                name: elem.name.clone(),
                key: elem.keys.clone().into_iter().collect(),
            })
            .collect(),
    }
}

/// Encodes a core action.
#[must_use]
pub fn action_to_pb(action: Action) -> pb::Action {
    match action {
        Action::Permit => pb::Action::Permit,
        Action::Deny => pb::Action::Deny,
    }
}

/// Encodes a core policy.
#[must_use]
pub fn policy_to_pb(policy: &AuthorizationPolicy) -> pb::AuthorizationPolicy {
    pb::AuthorizationPolicy {
        groups: policy
            .groups
            .iter()
            .map(|group| pb::Group {
                name: group.name.clone(),
                users: group.users.clone(),
            })
            .collect(),
        rules: policy.rules.iter().map(rule_to_pb).collect(),
    }
}

/// Encodes one core rule.
fn rule_to_pb(rule: &AuthorizationRule) -> pb::AuthorizationRule {
    let principal = match &rule.principal {
        Principal::User(user) => pb::authorization_rule::Principal::User(user.clone()),
        Principal::Group(group) => pb::authorization_rule::Principal::Group(group.clone()),
    };
    let mode = match rule.mode {
        Mode::Read => pb::Mode::Read,
        Mode::Write => pb::Mode::Write,
    };
    pb::AuthorizationRule {
        id: rule.id.clone(),
        principal: Some(principal),
        path: Some(path_to_pb(&rule.path)),
        mode: i32::from(mode),
        action: i32::from(action_to_pb(rule.action)),
    }
}

/// Encodes a snapshot as a get response.
#[must_use]
pub fn snapshot_to_get_response(snapshot: &PolicySnapshot) -> pb::GetResponse {
    pb::GetResponse {
        version: snapshot.version.clone(),
        created_on: snapshot.created_on,
        policy: Some(policy_to_pb(&snapshot.policy)),
    }
}
