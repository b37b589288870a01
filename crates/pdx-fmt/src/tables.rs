//! The three key tables the compaction heuristic consults (spec §4.5),
//! ported from `force_compact_keys` / `compact_nodes` / `not_compact_nodes` /
//! `normal_nodes` in the original draft (`original_source/bin/logic_optimizer.py`),
//! extended per spec.md's richer lists.

/// `val_key`s that force a block compact outright (spec §4.5 step 4).
pub const FORCE_COMPACT_VAL_KEYS: &[&str] = &["hsv", "rgb", "rgb255"];

/// Suffix table for "try compact" (spec §4.5 steps 7, 8).
pub const COMPACT_SUFFIXES: &[&str] = &[
    "_event",
    "switch",
    "tags",
    "NOT",
    "_technology",
    "_offset",
    "_flag",
    "flags",
    "_opinion_modifier",
    "_variable",
    "give_tech_no_error_effect",
    "colors",
    "add_ship_type_from_debris",
];

/// Non-negatable scopes (spec §4.4) — also forbid compaction (spec §4.5).
pub const NON_NEGATABLE: &[&str] = &["if", "else_if", "else", "while", "switch", "calc_true_if"];

/// Suffix table that forbids compaction outright, plus the non-negatable set
/// (spec §4.5: `not_compact_nodes` ... "plus the non-negatable set").
pub fn not_compact_suffixes() -> Vec<&'static str> {
    let mut v = vec![
        "cost",
        "upkeep",
        "produces",
        "NOR",
        "OR",
        "NAND",
        "AND",
        "hidden_effect",
        "init_effect",
        "effect",
        "settings",
    ];
    v.extend_from_slice(NON_NEGATABLE);
    v
}

/// Exact-match keys that forbid compaction when a block has more than one
/// child (spec §4.5 step 6, `normal_nodes`).
pub const NORMAL_NODES: &[&str] = &[
    "limit",
    "trigger",
    "add_resource",
    "ai_chance",
    "traits",
    "civics",
    "ethos",
    "inline_scripts",
    "modify_species",
    "change_species_characteristics",
    "custom_tooltip",
];

/// Keys that suppress a blank line between two adjacent blocks of the same
/// grouping even when they don't share an exact key (spec §4.5, "Expanded
/// rendering").
pub const SPACING_GROUP_KEYS: &[&str] = &["exists", "optimize_memory"];

pub fn ends_with_any(key: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|s| key.ends_with(s))
}

/// A comment is a section-header style comment (spec §4.5: `## ` or `#}`
/// style), exempted from the "no blank line after a bare comment" rule.
pub fn is_header_comment(text: &str) -> bool {
    text.starts_with("##") || text.starts_with("#}")
}
