// pathgate-core/src/runtime/matcher.rs
// ============================================================================
// Module: PathGate Rule Matcher
// Description: Trie-based rule index with specificity-ordered lookup.
// Purpose: Resolve the winning rule for a user/path/mode authorization request.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`RuleIndex`] stores a policy's rules in a trie keyed by element name.
//! Each edge carries its key pattern and the count of wildcard key values, so
//! lookup can exhaust more-specific edge groups (fewer wildcards) before less
//! specific ones at every depth. That ordering enforces the precedence
//! contract structurally: a concrete key beats a wildcard at the first point
//! of difference no matter what lies deeper in either branch. Within a branch
//! the deepest matching rule wins, and a residual tie resolves to deny.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::core::path::ConfigPath;
use crate::core::path::PathElem;
use crate::core::path::WILDCARD;
use crate::core::policy::Action;
use crate::core::policy::AuthorizationPolicy;
use crate::core::policy::Mode;
use crate::core::policy::Principal;

// ============================================================================
// SECTION: Trie Structure
// ============================================================================

/// A rule ending at some trie node.
#[derive(Debug, Clone)]
struct Terminal {
    /// Principal the rule applies to.
    principal: Principal,
    /// Operation class the rule applies to.
    mode: Mode,
    /// Outcome assigned when this rule wins.
    action: Action,
}

/// One outgoing edge of a trie node, labelled by an element pattern.
#[derive(Debug)]
struct Edge {
    /// Element name; never the wildcard token in a validated policy.
    name: String,
    /// Key pattern; values may be the wildcard token.
    keys: BTreeMap<String, String>,
    /// Number of wildcard values in `keys`; fewer means more specific.
    wildcard_keys: usize,
    /// Subtree reached through this edge.
    child: Node,
}

impl Edge {
    /// Returns true when this edge's pattern matches a request element.
    ///
    /// Names must be equal. Every concrete key value must be present on the
    /// request element with the same value; a wildcard value matches any.
    fn matches(&self, elem: &PathElem) -> bool {
        if self.name != elem.name {
            return false;
        }
        self.keys.iter().all(|(key, value)| {
            value == WILDCARD || elem.keys.get(key).is_some_and(|have| have == value)
        })
    }
}

/// One trie node: outgoing edges plus the rules ending here.
#[derive(Debug, Default)]
struct Node {
    /// Outgoing edges, deduplicated by element pattern.
    edges: Vec<Edge>,
    /// Rules whose path ends at this node.
    terminals: Vec<Terminal>,
}

/// A candidate decision found during lookup.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    /// Depth (element count) of the matched rule path.
    depth: usize,
    /// Action of the matched rule.
    action: Action,
}

impl Candidate {
    /// Merges two candidates: deeper wins, equal depth resolves to deny.
    fn merge(self, other: Self) -> Self {
        if other.depth > self.depth {
            return other;
        }
        if other.depth == self.depth && other.action == Action::Deny {
            return other;
        }
        self
    }
}

// ============================================================================
// SECTION: Rule Index
// ============================================================================

/// Immutable rule index built once per committed or staged policy.
#[derive(Debug, Default)]
pub struct RuleIndex {
    /// Trie root; the empty rule path is rejected by validation, so the root
    /// itself never carries terminals.
    root: Node,
    /// Group name to member set, resolved at build time.
    membership: BTreeMap<String, BTreeSet<String>>,
    /// Total number of indexed rules.
    rule_count: usize,
}

impl RuleIndex {
    /// Builds an index over a validated policy.
    #[must_use]
    pub fn build(policy: &AuthorizationPolicy) -> Self {
        let mut index = Self {
            root: Node::default(),
            membership: policy
                .groups
                .iter()
                .map(|group| (group.name.clone(), group.users.iter().cloned().collect()))
                .collect(),
            rule_count: policy.rules.len(),
        };
        for rule in &policy.rules {
            index.insert(
                &rule.path.elems,
                Terminal {
                    principal: rule.principal.clone(),
                    mode: rule.mode,
                    action: rule.action,
                },
            );
        }
        index
    }

    /// Returns the number of rules in the index.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rule_count
    }

    /// Inserts one rule, reusing edges with an identical element pattern.
    fn insert(&mut self, elems: &[PathElem], terminal: Terminal) {
        let mut node = &mut self.root;
        for elem in elems {
            let position = node
                .edges
                .iter()
                .position(|edge| edge.name == elem.name && edge.keys == elem.keys);
            let position = match position {
                Some(found) => found,
                None => {
                    node.edges.push(Edge {
                        name: elem.name.clone(),
                        keys: elem.keys.clone(),
                        wildcard_keys: elem.wildcard_key_count(),
                        child: Node::default(),
                    });
                    node.edges.len() - 1
                }
            };
            node = &mut node.edges[position].child;
        }
        node.terminals.push(terminal);
    }

    /// Finds the winning action for a request, or `None` when no rule matches.
    #[must_use]
    pub fn decide(&self, user: &str, path: &ConfigPath, mode: Mode) -> Option<Action> {
        self.walk(&self.root, user, &path.elems, mode, 0).map(|best| best.action)
    }

    /// Recursive lookup honoring the specificity and longest-match contracts.
    ///
    /// At each node, matching edges are grouped by wildcard-key count and the
    /// most specific non-empty group decides; a group is non-empty when any of
    /// its subtrees yields an applicable rule. Only when every edge group
    /// comes up empty do this node's own terminals apply.
    fn walk(
        &self,
        node: &Node,
        user: &str,
        remaining: &[PathElem],
        mode: Mode,
        depth: usize,
    ) -> Option<Candidate> {
        if let Some((elem, rest)) = remaining.split_first() {
            let mut groups: BTreeMap<usize, Vec<&Edge>> = BTreeMap::new();
            for edge in node.edges.iter().filter(|edge| edge.matches(elem)) {
                groups.entry(edge.wildcard_keys).or_default().push(edge);
            }
            for edges in groups.values() {
                let mut best: Option<Candidate> = None;
                for edge in edges {
                    if let Some(found) = self.walk(&edge.child, user, rest, mode, depth + 1) {
                        best = Some(best.map_or(found, |have| have.merge(found)));
                    }
                }
                if best.is_some() {
                    return best;
                }
            }
        }
        self.best_terminal(node, user, mode, depth)
    }

    /// Returns the best applicable terminal at a node, deny winning ties.
    fn best_terminal(&self, node: &Node, user: &str, mode: Mode, depth: usize) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for terminal in &node.terminals {
            if terminal.mode != mode || !self.applies_to(&terminal.principal, user) {
                continue;
            }
            let found = Candidate {
                depth,
                action: terminal.action,
            };
            best = Some(best.map_or(found, |have| have.merge(found)));
        }
        best
    }

    /// Returns true when a principal covers the requesting user. A group
    /// principal naming an undefined group covers no one.
    fn applies_to(&self, principal: &Principal, user: &str) -> bool {
        match principal {
            Principal::User(name) => name == user,
            Principal::Group(name) => self
                .membership
                .get(name)
                .is_some_and(|members| members.contains(user)),
        }
    }
}
