//! Canonicalizer: three independent, idempotent tree walks (spec §4.3).

use crate::node::{Node, Value};

/// Scope/flow-control keys lowercased outright (exact match, case-insensitive).
/// Extends the later spec.md table with `FACTOR`/`MODIFIER`/`DEFAULT`, which
/// the earlier Python draft (`original_source/bin/logic_optimizer.py`,
/// `KEYWORDS_TO_LOWER`) lowercases and spec.md's own "…" ellipsis after
/// `FROMFROM` signals were only abbreviated, not dropped (see SPEC_FULL.md §10).
const LOWER_SCOPE_KEYS: &[&str] = &[
    "ROOT", "PREV", "FROMFROM", "FROM", "THIS", "OWNER", "CONTROLLER", "From", "FromFrom", "Root",
    "Prev", "BREAK", "CONTINUE", "FACTOR", "MODIFIER", "DEFAULT",
];

/// Block-entry-only keys lowercased (spec §4.3 rule 1, final clause).
const LOWER_SCOPE_BLOCK_KEYS: &[&str] = &[
    "FROM", "OWNER", "EFFECT", "TRIGGER", "SWITCH", "IF", "ELSE", "ELSE_IF", "LIMIT", "WHILE",
];

const SCOPE_SUFFIXES: &[&str] = &[".ROOT", ".PREV", ".FROM", ".OWNER", ".CONTROLLER"];
const SCOPE_PREFIXES: &[&str] = &["ROOT.", "PREV.", "FROM.", "OWNER.", "CONTROLLER."];

const LOGIC_OPERATOR_KEYS: &[&str] = &["OR", "AND", "NOR", "NAND", "NOT", "CALC_TRUE_IF"];

fn should_lowercase_key(key: &str, is_block: bool) -> bool {
    let upper = key.to_ascii_uppercase();
    if LOWER_SCOPE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key)) {
        return true;
    }
    if SCOPE_SUFFIXES.iter().any(|s| upper.ends_with(s)) {
        return true;
    }
    if SCOPE_PREFIXES.iter().any(|p| upper.starts_with(p)) {
        return true;
    }
    if is_block && LOWER_SCOPE_BLOCK_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key)) {
        return true;
    }
    false
}

/// Walk 1: lowercase scope/flow-control keys (spec §4.3 rule 1).
pub fn lowercase_scope_keys(nodes: &mut [Node]) -> bool {
    let mut changed = false;
    for node in nodes.iter_mut() {
        if let Node::Entry {
            key,
            val_key,
            value,
            ..
        } = node
        {
            let is_block = value.is_block();
            if should_lowercase_key(key, is_block) {
                let lower = key.to_ascii_lowercase();
                if *key != lower {
                    *key = lower;
                    changed = true;
                }
            }
            if let Some(vk) = val_key {
                if should_lowercase_key(vk, false) {
                    let lower = vk.to_ascii_lowercase();
                    if *vk != lower {
                        *vk = lower;
                        changed = true;
                    }
                }
            }
            if let Value::Block(children) = value {
                if lowercase_scope_keys(children) {
                    changed = true;
                }
            }
        }
    }
    changed
}

/// Walk 2: uppercase the five (six, counting `calc_true_if`) logical-operator
/// keys. `calc_true_if` is recognized case-insensitively for scope purposes
/// but stays lowercase in the rendered key (spec §4.3 rule 2).
pub fn uppercase_logic_keys(nodes: &mut [Node]) -> bool {
    let mut changed = false;
    for node in nodes.iter_mut() {
        if let Node::Entry { key, value, .. } = node {
            if value.is_block() && LOGIC_OPERATOR_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
            {
                let upper = key.to_ascii_uppercase();
                if upper != "CALC_TRUE_IF" && *key != upper {
                    *key = upper;
                    changed = true;
                } else if upper == "CALC_TRUE_IF" {
                    let lower = key.to_ascii_lowercase();
                    if *key != lower {
                        *key = lower;
                        changed = true;
                    }
                }
            }
            if let Value::Block(children) = value {
                if uppercase_logic_keys(children) {
                    changed = true;
                }
            }
        }
    }
    changed
}

/// Walk 3: lowercase `Yes`/`No`/`YES`/`NO`/`From`/`FROM` leaf values (spec §4.3
/// rule 3).
pub fn lowercase_yes_no_values(nodes: &mut [Node]) -> bool {
    let mut changed = false;
    for node in nodes.iter_mut() {
        if let Node::Entry { value, .. } = node {
            match value {
                Value::Leaf(v) => {
                    if matches!(v.as_str(), "Yes" | "No" | "YES" | "NO" | "From" | "FROM") {
                        let lower = v.to_ascii_lowercase();
                        if *v != lower {
                            *v = lower;
                            changed = true;
                        }
                    }
                }
                Value::Block(children) => {
                    if lowercase_yes_no_values(children) {
                        changed = true;
                    }
                }
                Value::Unset => {}
            }
        }
    }
    changed
}

/// Runs all three walks. Each is independently idempotent; running the
/// combination twice produces no further change.
pub fn canonicalize(nodes: &mut [Node]) -> bool {
    let a = lowercase_scope_keys(nodes);
    let b = uppercase_logic_keys(nodes);
    let c = lowercase_yes_no_values(nodes);
    a || b || c
}

/// Is `key` (case-insensitively) one of the scope-gate prefixes the rewriter
/// must not recurse through (`any_`, `count_`)? Exposed for the rewriter's use
/// in R1 and R6.
pub fn is_scope_gate(key: &str) -> bool {
    key.starts_with("any_") || key.starts_with("count_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    #[test]
    fn lowercases_root_and_owner() {
        let mut tree = parse_source("ROOT = { has_x = yes }");
        canonicalize(&mut tree);
        assert_eq!(tree[0].key(), Some("root"));
    }

    #[test]
    fn uppercases_or_and_and() {
        let mut tree = parse_source("or = { a = yes b = yes }");
        canonicalize(&mut tree);
        assert_eq!(tree[0].key(), Some("OR"));
    }

    #[test]
    fn calc_true_if_stays_lowercase() {
        let mut tree = parse_source("CALC_TRUE_IF = { a = yes b = yes }");
        canonicalize(&mut tree);
        assert_eq!(tree[0].key(), Some("calc_true_if"));
    }

    #[test]
    fn yes_no_lowercased() {
        let mut tree = parse_source("has_x = YES");
        canonicalize(&mut tree);
        match &tree[0] {
            Node::Entry { value, .. } => assert_eq!(value.as_leaf(), Some("yes")),
            _ => panic!(),
        }
    }

    #[test]
    fn idempotent() {
        let mut tree = parse_source("ROOT = { OR = { a = YES } }");
        let first = canonicalize(&mut tree);
        assert!(first);
        let second = canonicalize(&mut tree);
        assert!(!second);
    }
}
