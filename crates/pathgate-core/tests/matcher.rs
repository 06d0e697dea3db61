// crates/pathgate-core/tests/matcher.rs
// ============================================================================
// Module: Rule Matcher Tests
// Description: Precedence, longest-match, and principal resolution.
// Purpose: Verify the specificity contract of the rule index.
// ============================================================================

//! Tests for [`pathgate_core::RuleIndex`].

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
use pathgate_core::RuleIndex;

fn rule(path: ConfigPath, principal: Principal, mode: Mode, action: Action) -> AuthorizationRule {
    AuthorizationRule {
        id: String::new(),
        path,
        principal,
        mode,
        action,
    }
}

fn user(name: &str) -> Principal {
    Principal::User(name.to_string())
}

/// The ISIS protocol path with concrete identifier and name keys.
fn isis_path(identifier: &str, name: &str) -> ConfigPath {
    ConfigPath::new(
        "",
        vec![
            PathElem::new("network-instances"),
            PathElem::new("network-instance").key("name", "default"),
            PathElem::new("protocols"),
            PathElem::new("protocol").key("identifier", identifier).key("name", name),
        ],
    )
}

/// A concrete-keyed rule beats a wildcard-keyed rule on the same path.
#[test]
fn concrete_keys_beat_wildcard_keys() {
    let policy = AuthorizationPolicy {
        groups: vec![],
        rules: vec![
            rule(isis_path("*", "*"), user("cafyauto"), Mode::Write, Action::Deny),
            rule(isis_path("ISIS", "B4"), user("cafyauto"), Mode::Write, Action::Permit),
        ],
    };
    let index = RuleIndex::build(&policy);
    assert_eq!(
        index.decide("cafyauto", &isis_path("ISIS", "B4"), Mode::Write),
        Some(Action::Permit)
    );
    // A sibling instance only matches the wildcard rule.
    assert_eq!(
        index.decide("cafyauto", &isis_path("ISIS", "B7"), Mode::Write),
        Some(Action::Deny)
    );
}

/// The concrete-over-wildcard ordering is insensitive to rule insert order
/// and to which action sits on which rule.
#[test]
fn concrete_keys_beat_wildcard_keys_reversed_actions() {
    let policy = AuthorizationPolicy {
        groups: vec![],
        rules: vec![
            rule(isis_path("ISIS", "B4"), user("cafyauto"), Mode::Write, Action::Deny),
            rule(isis_path("*", "*"), user("cafyauto"), Mode::Write, Action::Permit),
        ],
    };
    let index = RuleIndex::build(&policy);
    assert_eq!(
        index.decide("cafyauto", &isis_path("ISIS", "B4"), Mode::Write),
        Some(Action::Deny)
    );
}

/// Within one branch the deeper rule wins over its prefix.
#[test]
fn deeper_rule_wins_within_branch() {
    let policy = AuthorizationPolicy {
        groups: vec![],
        rules: vec![
            rule(ConfigPath::from_names(["system"]), user("oper"), Mode::Read, Action::Deny),
            rule(
                ConfigPath::from_names(["system", "config", "hostname"]),
                user("oper"),
                Mode::Read,
                Action::Permit,
            ),
        ],
    };
    let index = RuleIndex::build(&policy);
    let request = ConfigPath::from_names(["system", "config", "hostname"]);
    assert_eq!(index.decide("oper", &request, Mode::Read), Some(Action::Permit));
    // Off the deep rule's path, the prefix rule still decides.
    let other = ConfigPath::from_names(["system", "aaa"]);
    assert_eq!(index.decide("oper", &other, Mode::Read), Some(Action::Deny));
}

/// A concrete key at the first point of difference beats a wildcard branch
/// even when the wildcard branch matches deeper.
#[test]
fn concrete_branch_beats_deeper_wildcard_branch() {
    let shallow_concrete = ConfigPath::new(
        "",
        vec![
            PathElem::new("interfaces"),
            PathElem::new("interface").key("name", "eth0"),
        ],
    );
    let deep_wildcard = ConfigPath::new(
        "",
        vec![
            PathElem::new("interfaces"),
            PathElem::new("interface").key("name", "*"),
            PathElem::new("config"),
            PathElem::new("mtu"),
        ],
    );
    let policy = AuthorizationPolicy {
        groups: vec![],
        rules: vec![
            rule(shallow_concrete, user("oper"), Mode::Write, Action::Permit),
            rule(deep_wildcard, user("oper"), Mode::Write, Action::Deny),
        ],
    };
    let index = RuleIndex::build(&policy);
    let request = ConfigPath::new(
        "",
        vec![
            PathElem::new("interfaces"),
            PathElem::new("interface").key("name", "eth0"),
            PathElem::new("config"),
            PathElem::new("mtu"),
        ],
    );
    assert_eq!(index.decide("oper", &request, Mode::Write), Some(Action::Permit));
}

/// Two rules of equal depth and equal specificity resolve to deny.
#[test]
fn equal_specificity_tie_resolves_to_deny() {
    let path = ConfigPath::from_names(["system", "config"]);
    let policy = AuthorizationPolicy {
        groups: vec![
            Group {
                name: "operators".to_string(),
                users: vec!["oper".to_string()],
            },
        ],
        rules: vec![
            rule(path.clone(), user("oper"), Mode::Write, Action::Permit),
            rule(
                path.clone(),
                Principal::Group("operators".to_string()),
                Mode::Write,
                Action::Deny,
            ),
        ],
    };
    let index = RuleIndex::build(&policy);
    assert_eq!(index.decide("oper", &path, Mode::Write), Some(Action::Deny));
}

/// Group principals resolve through the policy's group list.
#[test]
fn group_principal_covers_members_only() {
    let path = ConfigPath::from_names(["system"]);
    let policy = AuthorizationPolicy {
        groups: vec![Group {
            name: "admins".to_string(),
            users: vec!["alice".to_string(), "bob".to_string()],
        }],
        rules: vec![rule(
            path.clone(),
            Principal::Group("admins".to_string()),
            Mode::Write,
            Action::Permit,
        )],
    };
    let index = RuleIndex::build(&policy);
    assert_eq!(index.decide("alice", &path, Mode::Write), Some(Action::Permit));
    assert_eq!(index.decide("mallory", &path, Mode::Write), None);
}

/// A rule naming an undefined group matches no one.
#[test]
fn undefined_group_matches_no_one() {
    let path = ConfigPath::from_names(["system"]);
    let policy = AuthorizationPolicy {
        groups: vec![],
        rules: vec![rule(
            path.clone(),
            Principal::Group("ghosts".to_string()),
            Mode::Write,
            Action::Deny,
        )],
    };
    let index = RuleIndex::build(&policy);
    assert_eq!(index.decide("alice", &path, Mode::Write), None);
}

/// Mode is a hard filter: a write rule never decides a read request.
#[test]
fn mode_filters_candidates() {
    let path = ConfigPath::from_names(["system"]);
    let policy = AuthorizationPolicy {
        groups: vec![],
        rules: vec![rule(path.clone(), user("oper"), Mode::Write, Action::Deny)],
    };
    let index = RuleIndex::build(&policy);
    assert_eq!(index.decide("oper", &path, Mode::Read), None);
    assert_eq!(index.decide("oper", &path, Mode::Write), Some(Action::Deny));
}

/// A rule deeper than the request path does not match it.
#[test]
fn longer_rule_does_not_match_shorter_request() {
    let policy = AuthorizationPolicy {
        groups: vec![],
        rules: vec![rule(
            ConfigPath::from_names(["system", "config", "hostname"]),
            user("oper"),
            Mode::Read,
            Action::Permit,
        )],
    };
    let index = RuleIndex::build(&policy);
    let request = ConfigPath::from_names(["system", "config"]);
    assert_eq!(index.decide("oper", &request, Mode::Read), None);
}

/// With no matching rule the index reports no decision at all.
#[test]
fn unmatched_request_yields_no_decision() {
    let policy = AuthorizationPolicy {
        groups: vec![],
        rules: vec![rule(
            ConfigPath::from_names(["system"]),
            user("oper"),
            Mode::Write,
            Action::Deny,
        )],
    };
    let index = RuleIndex::build(&policy);
    let request = ConfigPath::from_names(["interfaces"]);
    assert_eq!(index.decide("oper", &request, Mode::Write), None);
}
