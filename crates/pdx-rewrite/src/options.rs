//! Process-wide rewriter options (spec §1, §5): read-only for the duration of
//! one `process` call, set once by the CLI entry point.

#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteOptions {
    /// Prefer `count_X { count >= 1, limit = {...} }` over `any_X { ... }`
    /// (spec R6). Mutually exclusive in effect with `use_any_triggers`: if
    /// both are set, neither conversion direction runs (R6 only fires when
    /// exactly one is true).
    pub use_count_triggers: bool,
    /// Prefer `any_X { ... }` over `count_X { count OP N, limit = {...} }`
    /// (spec R6).
    pub use_any_triggers: bool,
}
