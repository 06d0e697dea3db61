// crates/pathgate-core/tests/path_display.rs
// ============================================================================
// Module: Path Display Tests
// Description: xpath-style rendering of configuration paths.
// Purpose: Verify the string form used as the per-path counter key.
// ============================================================================

//! Tests for [`pathgate_core::ConfigPath`] display.

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

use pathgate_core::ConfigPath;
use pathgate_core::PathElem;

/// The empty path renders as the root slash.
#[test]
fn root_path_renders_as_slash() {
    assert_eq!(ConfigPath::root().xpath(), "/");
}

/// Elements render slash-separated with bracketed keys in key order.
#[test]
fn keyed_path_renders_in_xpath_form() {
    let path = ConfigPath::new(
        "",
        vec![
            PathElem::new("interfaces"),
            PathElem::new("interface").key("name", "eth0"),
            PathElem::new("mtu"),
        ],
    );
    assert_eq!(path.xpath(), "/interfaces/interface[name=eth0]/mtu");
}

/// Multiple keys on one element render sorted by key name.
#[test]
fn multi_key_element_renders_sorted_keys() {
    let path = ConfigPath::new(
        "",
        vec![PathElem::new("protocol").key("name", "B4").key("identifier", "ISIS")],
    );
    assert_eq!(path.xpath(), "/protocol[identifier=ISIS][name=B4]");
}

/// Wildcard key counting sees only wildcard values.
#[test]
fn wildcard_key_count_counts_values_only() {
    let elem = PathElem::new("protocol").key("identifier", "*").key("name", "B4");
    assert_eq!(elem.wildcard_key_count(), 1);
}
