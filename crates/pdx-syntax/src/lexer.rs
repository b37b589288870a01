//! Tokenizer (spec §4.1).
//!
//! The token grammar is a small set of ordered alternatives: comment, string,
//! two macro-block shapes, operators, word, newline. `logos` gives us
//! maximal-munch scanning the way the teacher's own lexer
//! (`crates/rowan/src/syntax.rs`) derives `SyntaxKind`; unlike that lexer we
//! don't build a lossless `rowan` tree, so spans are post-processed by hand
//! into a flat `Vec<Token>` carrying line numbers and preceding gaps (spec
//! §3's `Token` shape), which a CST doesn't model directly.

use logos::{Lexer, Logos};

use crate::token::{Token, TokenKind};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"\n")]
enum Raw {
    #[regex(r"#[^\n]*", priority = 100)]
    Comment,

    #[regex(r#""[^"]*""#, priority = 100)]
    Str,

    #[regex(r"@\\?\[", consume_math_macro, priority = 100)]
    MathMacro,

    #[token("[[", consume_macro_param, priority = 100)]
    MacroParam,

    #[token("!=", priority = 50)]
    Ne,
    #[token(">=", priority = 50)]
    Ge,
    #[token("<=", priority = 50)]
    Le,
    #[token("=", priority = 40)]
    Eq,
    #[token("{", priority = 40)]
    LBrace,
    #[token("}", priority = 40)]
    RBrace,
    #[token("<", priority = 40)]
    Lt,
    #[token(">", priority = 40)]
    Gt,
    #[token("!", priority = 40)]
    Bang,

    // Excludes `[`/`]` too (beyond the original draft's word class) so a
    // literal-token match on `[[` always wins at that position instead of
    // competing on logos's longest-match tie-break with a greedy `Word`.
    #[regex(r"[^\s=\{\}<>!\[\]]+", priority = 1)]
    Word,
}

/// Scans past the opening `@[`/`@\[` to the first `]`, spanning newlines.
/// Best-effort: if no closing bracket exists, the rest of the input is
/// consumed as one opaque word rather than erroring (spec §5: no timeout, a
/// malformed input still produces a best-effort tree).
fn consume_math_macro(lex: &mut Lexer<Raw>) -> bool {
    let rest = lex.remainder();
    match rest.find(']') {
        Some(idx) => lex.bump(idx + 1),
        None => {
            let line = line_at(lex.source(), lex.span().start);
            tracing::warn!("{}", pdx_common::Error::UnterminatedMacro { line });
            lex.bump(rest.len());
        }
    }
    true
}

/// 1-indexed line number of the byte offset `pos` within `src`.
fn line_at(src: &str, pos: usize) -> u32 {
    src.as_bytes()[..pos].iter().filter(|&&b| b == b'\n').count() as u32 + 1
}

/// Scans past `[[` to the first `]]`, spanning newlines. Handles the
/// `[[! ... ]]` negated-parameter shape identically since the body is opaque.
fn consume_macro_param(lex: &mut Lexer<Raw>) -> bool {
    let rest = lex.remainder();
    match rest.find("]]") {
        Some(idx) => lex.bump(idx + 2),
        None => {
            let line = line_at(lex.source(), lex.span().start);
            tracing::warn!("{}", pdx_common::Error::UnterminatedMacro { line });
            lex.bump(rest.len());
        }
    }
    true
}

/// Rewrites a comment per spec §4.1 rule 1: `#X` (no space, not a `##`
/// section header) becomes `# X`.
pub fn format_comment(raw: &str) -> String {
    if !raw.starts_with("##") {
        let mut chars = raw.chars();
        chars.next(); // leading '#'
        if let Some(c) = chars.next() {
            if !c.is_whitespace() {
                return format!("# {}", &raw[1..]);
            }
        }
    }
    raw.to_string()
}

/// Tokenizes `text` into a flat stream, preserving exact inter-token gaps and
/// line numbers (spec §4.1).
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = Raw::lexer(text);
    let mut last_end = 0usize;
    let mut line: u32 = 1;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let gap = &text[last_end..span.start];
        line += gap.matches('\n').count() as u32;
        last_end = span.end;

        let raw = match result {
            Ok(raw) => raw,
            Err(()) => {
                // A character outside every alternative (shouldn't happen given
                // Word's catch-all class, but stay best-effort per spec §5).
                tracing::warn!(
                    line,
                    text = %lexer.slice(),
                    "tokenizer skipped an unrecognized character"
                );
                continue;
            }
        };

        let slice = lexer.slice();
        let (kind, text_value) = match raw {
            Raw::Comment => (TokenKind::Comment, format_comment(slice)),
            Raw::Str => (TokenKind::String, slice.to_string()),
            Raw::MathMacro | Raw::MacroParam => (TokenKind::Word, slice.to_string()),
            Raw::Ne | Raw::Ge | Raw::Le | Raw::Eq | Raw::LBrace | Raw::RBrace | Raw::Lt
            | Raw::Gt | Raw::Bang => (TokenKind::Op, slice.to_string()),
            Raw::Word => (TokenKind::Word, slice.to_string()),
        };

        // A multi-line macro block's internal newlines must also advance the
        // line counter once we're past it.
        let internal_newlines = if matches!(raw, Raw::MathMacro | Raw::MacroParam) {
            text_value.matches('\n').count() as u32
        } else {
            0
        };

        tokens.push(Token {
            kind,
            text: text_value,
            line,
            preceding_whitespace: gap.to_string(),
            byte_span: (span.start, span.end),
        });

        line += internal_newlines;
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, String)> {
        tokenize(src)
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn simple_leaf() {
        let out = kinds("has_x = yes");
        assert_eq!(
            out,
            vec![
                (TokenKind::Word, "has_x".into()),
                (TokenKind::Op, "=".into()),
                (TokenKind::Word, "yes".into()),
            ]
        );
    }

    #[test]
    fn comment_reformatted() {
        let out = kinds("#comment\n## header\n# already spaced");
        assert_eq!(out[0].1, "# comment");
        assert_eq!(out[1].1, "## header");
        assert_eq!(out[2].1, "# already spaced");
    }

    #[test]
    fn operators_distinguished() {
        let out = kinds("a != b >= c <= d = e < f > g");
        let ops: Vec<_> = out
            .iter()
            .filter(|(k, _)| *k == TokenKind::Op)
            .map(|(_, t)| t.as_str())
            .collect();
        assert_eq!(ops, vec!["!=", ">=", "<=", "=", "<", ">"]);
    }

    #[test]
    fn math_macro_is_opaque_word() {
        let out = kinds("a = @[ 1 + 2 ]");
        assert_eq!(out.last().unwrap().0, TokenKind::Word);
        assert_eq!(out.last().unwrap().1, "@[ 1 + 2 ]");
    }

    #[test]
    fn macro_param_spans_lines() {
        let src = "x = [[PARAM\nfoo]]";
        let toks = tokenize(src);
        let last = toks.last().unwrap();
        assert_eq!(last.text, "[[PARAM\nfoo]]");
    }

    #[test]
    fn line_numbers_advance() {
        let src = "a = 1\nb = 2\n";
        let toks = tokenize(src);
        assert_eq!(toks[0].line, 1);
        assert_eq!(toks[3].line, 2);
    }

    #[test]
    fn string_no_escape_processing() {
        let out = kinds(r#"name = "hello \n world""#);
        assert_eq!(out[2].1, r#""hello \n world""#);
    }
}
