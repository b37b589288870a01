//! Wires the tokenizer/parser/canonicalizer/rewriter/printer pipeline behind
//! one entry point (spec §6), the way `rhai-cli`'s `execute::fmt` wires the
//! formatting pipeline behind `RhaiArgs`.

pub mod args;

use serde::Serialize;

/// The three process-wide options named in spec.md §1.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    pub no_compact: bool,
    pub use_count_triggers: bool,
    pub use_any_triggers: bool,
}

impl From<&args::PdxArgs> for ProcessOptions {
    fn from(args: &args::PdxArgs) -> Self {
        ProcessOptions {
            no_compact: args.no_compact,
            use_count_triggers: args.use_count_triggers,
            use_any_triggers: args.use_any_triggers,
        }
    }
}

/// The JSON envelope printed to stdout (spec.md §6, ported from the original
/// draft's `__main__` block).
#[derive(Serialize)]
pub struct Envelope {
    pub content: String,
    pub changed: bool,
}

/// Runs the full pipeline over `text`, normalizing CRLF to LF first. Never
/// panics: an internal fault is logged and `text` is returned unchanged with
/// `changed = false` (spec §6/§7).
pub fn process(text: &str, opts: &ProcessOptions) -> (String, bool) {
    let normalized = text.replace("\r\n", "\n");
    let rw_opts = pdx_rewrite::RewriteOptions {
        use_count_triggers: opts.use_count_triggers,
        use_any_triggers: opts.use_any_triggers,
    };
    let fmt_opts = pdx_fmt::Options {
        no_compact: opts.no_compact,
    };

    let outcome = std::panic::catch_unwind(|| {
        let tokens = pdx_syntax::lexer::tokenize(&normalized);
        let mut tree = pdx_syntax::parser::Parser::new(&normalized, &tokens).parse();
        pdx_syntax::canon::canonicalize(&mut tree);
        pdx_rewrite::optimize_fixpoint(&mut tree, &rw_opts);
        pdx_fmt::render(&tree, &fmt_opts, &normalized)
    });

    match outcome {
        Ok(rendered) => {
            let changed = rendered != text;
            (rendered, changed)
        }
        Err(_) => {
            tracing::error!("internal error while processing input; returning it unchanged");
            (text.to_string(), false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_simple_script() {
        let (out, _) = process("has_x = yes\n", &ProcessOptions::default());
        assert_eq!(out, "has_x = yes\n");
    }

    #[test]
    fn normalizes_crlf() {
        let (out, _) = process("has_x = yes\r\nhas_y = no\r\n", &ProcessOptions::default());
        assert!(!out.contains('\r'));
    }

    #[test]
    fn reports_changed_when_rewritten() {
        let (out, changed) = process("AND = { has_x = yes }\n", &ProcessOptions::default());
        assert!(changed);
        assert!(!out.contains("AND"));
    }

    #[test]
    fn reports_unchanged_when_already_optimal() {
        let (_, changed) = process("has_x = yes\n", &ProcessOptions::default());
        assert!(!changed);
    }

    #[test]
    fn reports_changed_for_respacing_alone() {
        // No canonicalizer or rewriter rule fires here, but the printer's fixed
        // spacing and mandatory trailing newline still make the output differ
        // from this input.
        let (out, changed) = process("a=yes", &ProcessOptions::default());
        assert_eq!(out, "a = yes\n");
        assert!(changed);
    }
}
