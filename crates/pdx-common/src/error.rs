//! The single error channel for the pipeline (spec §7).
//!
//! Every fault in the tokenizer, parser or rewriter is funneled through one of
//! these variants so the `process` boundary can log a single diagnostic line
//! and fall back to returning the original text unchanged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unbalanced braces: {open} unclosed block(s) at end of input")]
    UnbalancedBraces { open: usize },

    #[error("stray closing brace at line {line}")]
    StrayClosingBrace { line: u32 },

    #[error("unterminated macro block starting at line {line}")]
    UnterminatedMacro { line: u32 },

    #[error("rewriter produced an invalid tree: {reason}")]
    InvariantViolation { reason: String },
}
