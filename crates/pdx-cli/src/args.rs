use clap::{Parser, ValueEnum};

/// Reads a Paradox-script document from stdin, rewrites and reformats it, and
/// prints a JSON envelope to stdout (spec.md §6).
#[derive(Clone, Parser)]
#[command(name = "pdxfmt", bin_name = "pdxfmt", version)]
pub struct PdxArgs {
    /// Suppress all compaction; every block renders expanded.
    #[arg(long)]
    pub no_compact: bool,
    /// Prefer `count_X { count >= 1, limit = {...} }` over `any_X` (R6).
    #[arg(long)]
    pub use_count_triggers: bool,
    /// Prefer `any_X` over `count_X { count OP N, limit = {...} }` (R6).
    #[arg(long)]
    pub use_any_triggers: bool,
    /// Colorize diagnostic output.
    #[arg(long, value_enum, default_value = "auto")]
    pub colors: Colors,
    /// Enable a verbose logging format (surfaces per-rule advisory notices).
    #[arg(long)]
    pub verbose: bool,
    /// Enable logging spans.
    #[arg(long)]
    pub log_spans: bool,
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum Colors {
    #[default]
    Auto,
    Always,
    Never,
}
