//! Process-wide rendering options (spec §1, §5): read-only for the duration
//! of one `process` call, set once by the CLI entry point.

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Suppresses all compaction when set (spec §4.5 step 1).
    pub no_compact: bool,
}
