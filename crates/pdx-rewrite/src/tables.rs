//! Empirical exception tables for R6 (any/count trigger conversion), kept as
//! external configuration per spec §9 Open Questions: "the `NON_COUNT_TRIGGERS`
//! / `NON_ANY_TRIGGERS` sets are empirical and expected to be kept as external
//! configuration tables." Values below are a representative starter set drawn
//! from the Stellaris trigger vocabulary the scope regex in `canon.rs` already
//! recognizes; extend here rather than in `rules.rs`.

/// `any_X` keys that must never be rewritten to `count_X` even when
/// `use_count_triggers` is set — their `count_` form either doesn't exist in
/// the host game or changes meaning.
pub const NON_COUNT_TRIGGERS: &[&str] = &["any_owned_pop_amount", "any_neighbor_country"];

/// `count_X` keys that must never be rewritten to `any_X` even when
/// `use_any_triggers` is set.
pub const NON_ANY_TRIGGERS: &[&str] = &["count_owned_pop_amount"];

/// Pluralization exceptions for the `any_X` <-> `count_X` name conversion
/// (spec R6, example scenario 4's "per name table" hedge): most triggers
/// convert by a plain `any_`/`count_` prefix swap keeping the suffix
/// identical, but a handful of set-quantified triggers pluralize the noun in
/// their `count_` form. Each pair is `(any_suffix, count_suffix)`.
const PLURAL_EXCEPTIONS: &[(&str, &str)] = &[
    ("planet", "planets"),
    ("system", "systems"),
    ("country", "countries"),
    ("pop", "pops"),
    ("ship", "ships"),
    ("starbase", "starbases"),
];

/// The `count_X` name for an `any_X` key, per the pluralization table above,
/// falling back to a plain prefix swap (`any_foo` -> `count_foo`).
pub fn count_name_for_any(any_key: &str) -> String {
    let suffix = any_key.strip_prefix("any_").unwrap_or(any_key);
    for (singular, plural) in PLURAL_EXCEPTIONS {
        if suffix == *singular {
            return format!("count_{plural}");
        }
    }
    format!("count_{suffix}")
}

/// The `any_X` name for a `count_X` key, the inverse of [`count_name_for_any`].
pub fn any_name_for_count(count_key: &str) -> String {
    let suffix = count_key.strip_prefix("count_").unwrap_or(count_key);
    for (singular, plural) in PLURAL_EXCEPTIONS {
        if suffix == *plural {
            return format!("any_{singular}");
        }
    }
    format!("any_{suffix}")
}
