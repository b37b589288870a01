//! Iterative, stack-based parser (spec §4.2).
//!
//! Mirrors the original draft's `parse()` (`original_source/bin/logic_optimizer.py`)
//! one token-shape decision at a time, but targets the typed `Node` tree
//! (spec §3) instead of untyped dicts, and collapses preceding comments into
//! their owning entry's `attached_comments.preceding` so that moving a node
//! during rewriting carries its leading comments with it (spec §3 invariant).

use crate::node::{AttachedComments, Node, Op, Value};
use crate::token::{Token, TokenKind};

/// Block keys whose body the parser must preserve verbatim (spec §6).
const RAW_BLOCK_KEYS: &[&str] = &["in_breach_of", "inverted_switch"];

pub struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    /// Stack of enclosing child lists, one per open block.
    stack: Vec<Vec<Node>>,
    current: Vec<Node>,
}

/// A placeholder value installed on a block-entry node the moment its shape
/// is known, before the block's contents have been scanned. Replaced with the
/// real `Value::Block` once the matching `}` is found.
const PENDING: &str = "\u{0}pending-block\u{0}";

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        Parser {
            source,
            tokens,
            pos: 0,
            stack: Vec::new(),
            current: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    /// If the token right after `idx` is a comment on `line`, returns its text
    /// and the extra advance amount (spec §4.2 "Inline comment attachment").
    fn inline_comment_after(&self, idx: usize, line: u32) -> (Option<String>, usize) {
        if let Some(next) = self.tokens.get(idx + 1) {
            if next.kind == TokenKind::Comment && next.line == line {
                return (Some(next.text.clone()), 1);
            }
        }
        (None, 0)
    }

    /// Two-token lookahead past any comments, skipping from `from`. Returns
    /// the index of the first non-comment token at or after `from`.
    fn skip_comments(&self, from: usize) -> usize {
        let mut i = from;
        while let Some(t) = self.tokens.get(i) {
            if t.kind == TokenKind::Comment {
                i += 1;
            } else {
                break;
            }
        }
        i
    }

    pub fn parse(mut self) -> Vec<Node> {
        while let Some(token) = self.peek() {
            if token.kind == TokenKind::Comment {
                self.current.push(Node::Comment(token.text.clone()));
                self.pos += 1;
                continue;
            }

            if token.is_op("}") {
                let close_line = token.line;
                let close_idx = self.pos;
                if self.stack.is_empty() {
                    // Stray closing brace: terminate, dropping the remainder.
                    tracing::warn!(
                        "{}",
                        pdx_common::Error::StrayClosingBrace { line: close_line }
                    );
                    break;
                }
                let finished = collapse_preceding(std::mem::take(&mut self.current));
                self.current = self.stack.pop().unwrap();
                let close_end = token.byte_span.1;
                let (cm, adv) = self.inline_comment_after(close_idx, close_line);
                if let Some(parent) = self.current.last_mut() {
                    if is_pending(parent) {
                        set_pending_value(parent, finished, close_end);
                        if let Some(cm) = cm {
                            if let Some(ac) = parent.comments_mut() {
                                ac.close = Some(cm);
                            }
                            self.pos += adv;
                        }
                    }
                }
                self.pos += 1;
                continue;
            }

            if token.is_op("{") {
                let open_line = token.line;
                let open_idx = self.pos;
                let (cm, adv) = self.inline_comment_after(open_idx, open_line);
                if let Some(parent) = self.current.last_mut() {
                    if is_pending(parent) {
                        if let Some(cm) = cm {
                            if let Some(ac) = parent.comments_mut() {
                                ac.open = Some(cm);
                            }
                            self.pos += adv;
                        }
                    }
                }
                self.stack.push(std::mem::take(&mut self.current));
                self.current = Vec::new();
                self.pos += 1;
                continue;
            }

            self.parse_key_token(token.clone());
        }

        if !self.stack.is_empty() {
            // Unbalanced input: return the innermost unfinished block's
            // contents, matching the original draft's degrade-gracefully
            // behaviour (spec §4.2 failure mode).
            tracing::warn!(
                "{}",
                pdx_common::Error::UnbalancedBraces { open: self.stack.len() }
            );
            return collapse_preceding(self.current);
        }

        collapse_preceding(self.current)
    }

    /// Handles a token that starts a key/value/standalone-word shape.
    fn parse_key_token(&mut self, token: Token) {
        let key_idx = self.pos;
        let key_text = token.text.clone();
        let key_line = token.line;

        let lookahead_idx = self.skip_comments(key_idx + 1);
        let lookahead = self.tokens.get(lookahead_idx);

        let (is_key_op, is_key_block, op_text, op_idx) = match lookahead {
            Some(t) if t.kind == TokenKind::Op && t.text != "{" && t.text != "}" => {
                (true, false, Some(t.text.clone()), lookahead_idx)
            }
            Some(t) if t.is_op("{") => (false, true, None, lookahead_idx),
            _ => (false, false, None, lookahead_idx),
        };

        if !is_key_op && !is_key_block {
            // Standalone word.
            let (cm, adv) = self.inline_comment_after(key_idx, key_line);
            let mut node = Node::entry(key_text, None, Value::Unset);
            if let Some(cm) = cm {
                if let Some(ac) = node.comments_mut() {
                    ac.inline = Some(cm);
                }
            }
            self.current.push(node);
            self.pos = key_idx + 1 + adv;
            return;
        }

        let scan_from = if is_key_op { op_idx + 1 } else { op_idx };
        let value_idx = self.skip_comments(scan_from);
        let value_tok = match self.tokens.get(value_idx) {
            Some(t) => t,
            None => {
                // Truncated input right after the operator/key.
                self.current.push(Node::entry(
                    key_text,
                    op_text.as_deref().and_then(Op::parse),
                    Value::Unset,
                ));
                self.pos = self.tokens.len();
                return;
            }
        };

        if value_tok.is_op("{") {
            if is_key_op && op_text.as_deref() == Some("=") && RAW_BLOCK_KEYS.contains(&key_text.as_str())
            {
                self.parse_raw_block(key_text, value_idx);
                return;
            }

            let op = if is_key_op {
                op_text.as_deref().and_then(Op::parse)
            } else {
                None
            };
            let node = Node::Entry {
                key: key_text,
                op,
                val_key: None,
                value: Value::Leaf(PENDING.to_string()),
                attached_comments: AttachedComments::default(),
                byte_span: (token.byte_span.0, 0),
            };
            self.current.push(node);
            self.pos = value_idx;
            return;
        }

        // is_key_op guaranteed here: a plain leaf, or `key = val_key { ... }`.
        let block_scan_from = self.skip_comments(value_idx + 1);
        let block_follows = self
            .tokens
            .get(block_scan_from)
            .map(|t| t.is_op("{"))
            .unwrap_or(false);

        if block_follows {
            let node = Node::Entry {
                key: key_text,
                op: op_text.as_deref().and_then(Op::parse),
                val_key: Some(value_tok.text.clone()),
                value: Value::Leaf(PENDING.to_string()),
                attached_comments: AttachedComments::default(),
                byte_span: (token.byte_span.0, 0),
            };
            self.current.push(node);
            self.pos = block_scan_from;
            return;
        }

        let (cm, adv) = self.inline_comment_after(value_idx, value_tok.line);
        let mut node = Node::Entry {
            key: key_text,
            op: op_text.as_deref().and_then(Op::parse),
            val_key: None,
            value: Value::Leaf(value_tok.text.clone()),
            attached_comments: AttachedComments::default(),
            byte_span: (token.byte_span.0, value_tok.byte_span.1),
        };
        if let Some(cm) = cm {
            if let Some(ac) = node.comments_mut() {
                ac.inline = Some(cm);
            }
        }
        self.current.push(node);
        self.pos = value_idx + 1 + adv;
    }

    /// Consumes a `key = { ... }` span verbatim by brace counting over the
    /// token stream, starting at the `{` token index `open_idx`.
    fn parse_raw_block(&mut self, key: String, open_idx: usize) {
        let open_tok = &self.tokens[open_idx];
        let start = open_tok.byte_span.0;
        let mut depth = 0i32;
        let mut i = open_idx;
        let mut end = self.source.len();
        while i < self.tokens.len() {
            let t = &self.tokens[i];
            if t.is_op("{") {
                depth += 1;
            } else if t.is_op("}") {
                depth -= 1;
                if depth == 0 {
                    end = t.byte_span.1;
                    i += 1;
                    break;
                }
            }
            i += 1;
        }
        let text = format!("{} = {}", key, &self.source[start..end]);
        self.current.push(Node::RawBlock {
            text,
            byte_span: (
                self.tokens
                    .get(open_idx.saturating_sub(1))
                    .map(|t| t.byte_span.0)
                    .unwrap_or(start),
                end,
            ),
        });
        self.pos = i;
    }
}

fn is_pending(node: &Node) -> bool {
    matches!(node, Node::Entry { value: Value::Leaf(v), .. } if v == PENDING)
}

fn set_pending_value(node: &mut Node, children: Vec<Node>, close_end: usize) {
    if let Node::Entry { value, byte_span, .. } = node {
        *value = Value::Block(children);
        byte_span.1 = close_end;
    }
}

/// Absorbs runs of standalone `Comment` nodes that directly precede an
/// `Entry`/`RawBlock` into that node's `preceding` slot, per spec §3: a node's
/// preceding comments belong to it and move with it. Comments with nothing
/// following them (trailing in the list) remain standalone.
fn collapse_preceding(children: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len());
    let mut pending: Vec<String> = Vec::new();
    for child in children {
        match child {
            Node::Comment(text) => pending.push(text),
            mut other => {
                if !pending.is_empty() {
                    if let Some(ac) = other.comments_mut() {
                        ac.preceding = std::mem::take(&mut pending);
                    } else {
                        for c in pending.drain(..) {
                            out.push(Node::Comment(c));
                        }
                    }
                }
                out.push(other);
            }
        }
    }
    for c in pending {
        out.push(Node::Comment(c));
    }
    out
}

/// Tokenizes and parses `source` in one call.
pub fn parse_source(source: &str) -> Vec<Node> {
    let tokens = crate::lexer::tokenize(source);
    Parser::new(source, &tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_entry() {
        let tree = parse_source("has_x = yes");
        assert_eq!(tree.len(), 1);
        match &tree[0] {
            Node::Entry { key, op, value, .. } => {
                assert_eq!(key, "has_x");
                assert_eq!(*op, Some(Op::Eq));
                assert_eq!(value.as_leaf(), Some("yes"));
            }
            _ => panic!("expected entry"),
        }
    }

    #[test]
    fn operatorless_block() {
        let tree = parse_source("hsv { 0.5 0.3 0.1 }");
        match &tree[0] {
            Node::Entry { key, op, value, .. } => {
                assert_eq!(key, "hsv");
                assert_eq!(*op, None);
                assert_eq!(value.as_block().unwrap().len(), 3);
            }
            _ => panic!(),
        }
    }

    #[test]
    fn val_key_block() {
        let tree = parse_source("color = rgb { 10 20 30 }");
        match &tree[0] {
            Node::Entry { key, val_key, value, .. } => {
                assert_eq!(key, "color");
                assert_eq!(val_key.as_deref(), Some("rgb"));
                assert_eq!(value.as_block().unwrap().len(), 3);
            }
            _ => panic!(),
        }
    }

    #[test]
    fn standalone_word() {
        let tree = parse_source("always");
        match &tree[0] {
            Node::Entry { key, value, .. } => {
                assert_eq!(key, "always");
                assert_eq!(*value, Value::Unset);
            }
            _ => panic!(),
        }
    }

    #[test]
    fn nested_block_with_comments() {
        let src = "AND = {\n  # leading\n  a = yes # trailing\n}";
        let tree = parse_source(src);
        let block = tree[0].as_block().unwrap();
        assert_eq!(block.len(), 1);
        match &block[0] {
            Node::Entry {
                key,
                attached_comments,
                ..
            } => {
                assert_eq!(key, "a");
                assert_eq!(attached_comments.preceding, vec!["# leading".to_string()]);
                assert_eq!(attached_comments.inline.as_deref(), Some("# trailing"));
            }
            _ => panic!(),
        }
    }

    #[test]
    fn raw_block_preserved_verbatim() {
        let src = "in_breach_of = {\n  weird ? syntax <<\n}";
        let tree = parse_source(src);
        match &tree[0] {
            Node::RawBlock { text, .. } => {
                assert!(text.starts_with("in_breach_of = {"));
                assert!(text.contains("weird"));
            }
            _ => panic!("expected raw block, got {:?}", tree[0]),
        }
    }

    #[test]
    fn stray_closing_brace_terminates() {
        let tree = parse_source("a = yes } b = yes");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn missing_close_returns_partial() {
        let tree = parse_source("AND = { a = yes");
        // Innermost partial block contents are returned.
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].key(), Some("a"));
    }

    #[test]
    fn open_and_close_comments() {
        let src = "AND = { # open\n a = yes\n} # close";
        let tree = parse_source(src);
        match &tree[0] {
            Node::Entry {
                attached_comments, ..
            } => {
                assert_eq!(attached_comments.open.as_deref(), Some("# open"));
                assert_eq!(attached_comments.close.as_deref(), Some("# close"));
            }
            _ => panic!(),
        }
    }
}
