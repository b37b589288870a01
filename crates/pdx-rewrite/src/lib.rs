//! The fixpoint Boolean rewriter (spec §4.4): rules R1–R16 applied to every
//! sibling list in the tree, repeated until nothing changes or a pass budget
//! is exhausted.

mod context;
mod ops;
mod options;
mod rules;
mod tables;

pub use context::{is_non_negatable, ParentKey};
pub use options::RewriteOptions;

use pdx_syntax::node::Node;

/// Applies one pass of every rule to `children`, which live directly inside a
/// block keyed by `parent` (or at the top level, for `ParentKey::Implicit`).
/// Recurses bottom-up: a block child's own children are settled before the
/// rules run on this list, so a rule here can see an already-simplified
/// child. Returns whether anything changed.
pub fn optimize(children: &mut Vec<Node>, parent: &ParentKey, opts: &RewriteOptions) -> bool {
    let mut changed = false;

    for child in children.iter_mut() {
        let key = child.key().map(|k| k.to_string());
        if let (Some(key), Some(inner)) = (key, child.as_block_mut()) {
            if optimize(inner, &ParentKey::named(key), opts) {
                changed = true;
            }
        }
    }

    changed |= rules::negation_absorption(children);
    changed |= rules::and_hoist(children, parent);
    changed |= rules::sibling_merge(children, parent);
    changed |= rules::flatten_nested(children, parent);
    changed |= rules::negation_sequence_fusion(children, parent);
    changed |= rules::any_count_conversion(children, opts);
    changed |= rules::or_merge_scope_siblings(children, parent);
    changed |= rules::and_dedup(children, parent);
    changed |= rules::de_morgan_collapse(children);
    changed |= rules::trivial_wrappers(children);
    changed |= rules::nor_common_factor(children);
    changed |= rules::not_simplifications(children, opts);
    changed |= rules::owner_shortcut(children);
    changed |= rules::or_and_not_absorption(children, parent);
    changed |= rules::or_and_common_factor(children);
    changed |= rules::nand_absorption(children, parent);

    changed
}

/// Runs [`optimize`] to a fixpoint starting at the top level: the first pass
/// plus up to three more while something changed (spec §4.4/§8: "at most
/// four passes").
pub fn optimize_fixpoint(children: &mut Vec<Node>, opts: &RewriteOptions) -> bool {
    let mut any_changed = false;
    for _ in 0..4 {
        if !optimize(children, &ParentKey::Implicit, opts) {
            break;
        }
        any_changed = true;
    }
    any_changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdx_syntax::parser::parse_source;

    fn rewrite(src: &str, opts: &RewriteOptions) -> Vec<Node> {
        let mut tree = parse_source(src);
        pdx_syntax::canon::canonicalize(&mut tree);
        optimize_fixpoint(&mut tree, opts);
        tree
    }

    fn render(nodes: &[Node]) -> String {
        pdx_fmt::render(nodes, &pdx_fmt::Options::default(), "")
    }

    #[test]
    fn and_flattens_into_implicit_parent() {
        let tree = rewrite("a = { AND = { has_x = yes has_y = yes } }", &RewriteOptions::default());
        let out = render(&tree);
        assert!(!out.contains("AND"));
        assert!(out.contains("has_x"));
        assert!(out.contains("has_y"));
    }

    #[test]
    fn double_negation_cancels() {
        let tree = rewrite("a = { NOT = { NOT = { has_x = yes } } }", &RewriteOptions::default());
        let out = render(&tree);
        assert!(!out.contains("NOT"));
        assert!(out.contains("has_x"));
    }

    #[test]
    fn de_morgan_collapses_and_of_nots() {
        let tree = rewrite(
            "a = { AND = { NOT = { has_x = yes } NOT = { has_y = yes } } }",
            &RewriteOptions::default(),
        );
        let out = render(&tree);
        assert!(out.contains("NOR"));
        assert!(!out.contains("AND"));
    }

    #[test]
    fn count_conversion_prefers_any() {
        let tree = rewrite(
            "a = { count_owned_planets = { count >= 1 limit = { is_capital = yes } } }",
            &RewriteOptions {
                use_any_triggers: true,
                use_count_triggers: false,
            },
        );
        let out = render(&tree);
        assert!(out.contains("any_owned_planets") || out.contains("any_owned_planet"));
    }

    #[test]
    fn nor_extracts_common_factor() {
        let tree = rewrite(
            "a = { NOR = { AND = { has_x = yes has_y = yes } AND = { has_x = yes has_z = yes } } }",
            &RewriteOptions::default(),
        );
        let out = render(&tree);
        assert!(out.contains("OR"));
    }

    #[test]
    fn owner_is_same_empire_becomes_is_owned_by() {
        let tree = rewrite("a = { owner = { is_same_empire = root } }", &RewriteOptions::default());
        let out = render(&tree);
        assert!(out.contains("is_owned_by"));
        assert!(!out.contains("owner"));
    }

    #[test]
    fn fixpoint_is_idempotent() {
        let opts = RewriteOptions::default();
        let once = rewrite("a = { NOT = { OR = { has_x = yes has_y = yes } } }", &opts);
        let mut twice = once.clone();
        let changed = optimize_fixpoint(&mut twice, &opts);
        assert!(!changed);
        assert_eq!(once, twice);
    }
}
