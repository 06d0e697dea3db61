// crates/pathgate-core/tests/policy_validation.rs
// ============================================================================
// Module: Policy Validation Tests
// Description: Structural validation of uploaded authorization policies.
// Purpose: Verify the invalid-policy taxonomy and the valid degenerate cases.
// ============================================================================

//! Tests for [`pathgate_core::validate_policy`].

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

use pathgate_core::Action;
use pathgate_core::AuthorizationPolicy;
use pathgate_core::AuthorizationRule;
use pathgate_core::ConfigPath;
use pathgate_core::Group;
use pathgate_core::Mode;
use pathgate_core::PathElem;
use pathgate_core::Principal;
use pathgate_core::validate_policy;

fn rule(path: ConfigPath, principal: Principal) -> AuthorizationRule {
    AuthorizationRule {
        id: String::new(),
        path,
        principal,
        mode: Mode::Write,
        action: Action::Permit,
    }
}

/// A rule path element named `*` is rejected with the wildcard-name message.
#[test]
fn wildcard_element_name_is_rejected() {
    let policy = AuthorizationPolicy {
        groups: vec![],
        rules: vec![rule(
            ConfigPath::new("", vec![PathElem::new("interfaces"), PathElem::new("*")]),
            Principal::User("admin".to_string()),
        )],
    };
    let err = validate_policy(&policy).unwrap_err();
    assert_eq!(err.to_string(), "invalid policy: wildcard path names are not permitted");
}

/// A rule with an empty path is rejected; this is what makes the classic
/// single-empty-rule upload invalid.
#[test]
fn empty_rule_path_is_rejected() {
    let policy = AuthorizationPolicy {
        groups: vec![],
        rules: vec![rule(ConfigPath::root(), Principal::User("admin".to_string()))],
    };
    let err = validate_policy(&policy).unwrap_err();
    assert_eq!(err.to_string(), "invalid policy: rule path not specified");
    assert!(err.to_string().contains("invalid policy"));
}

/// A rule principal with an empty name is rejected.
#[test]
fn unnamed_principal_is_rejected() {
    let policy = AuthorizationPolicy {
        groups: vec![],
        rules: vec![rule(
            ConfigPath::from_names(["system"]),
            Principal::Group(String::new()),
        )],
    };
    let err = validate_policy(&policy).unwrap_err();
    assert_eq!(err.to_string(), "invalid policy: rule principal not specified");
}

/// Duplicate group names within one policy are rejected.
#[test]
fn duplicate_group_names_are_rejected() {
    let policy = AuthorizationPolicy {
        groups: vec![
            Group {
                name: "operators".to_string(),
                users: vec!["alice".to_string()],
            },
            Group {
                name: "operators".to_string(),
                users: vec!["bob".to_string()],
            },
        ],
        rules: vec![],
    };
    let err = validate_policy(&policy).unwrap_err();
    assert!(err.to_string().starts_with("invalid policy"));
}

/// A policy with zero rules is structurally valid; committed, it denies
/// everything, but it must be uploadable.
#[test]
fn zero_rule_policy_is_valid() {
    let policy = AuthorizationPolicy::default();
    assert!(validate_policy(&policy).is_ok());
}

/// Wildcard key values are legal; only wildcard names are not.
#[test]
fn wildcard_key_values_are_valid() {
    let policy = AuthorizationPolicy {
        groups: vec![],
        rules: vec![rule(
            ConfigPath::new(
                "",
                vec![
                    PathElem::new("interfaces"),
                    PathElem::new("interface").key("name", "*"),
                ],
            ),
            Principal::User("admin".to_string()),
        )],
    };
    assert!(validate_policy(&policy).is_ok());
}
