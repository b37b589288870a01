//! Compact/expanded pretty-printer (spec §4.5), ported from `should_be_compact`
//! / `node_to_string` / `block_to_string` in
//! `original_source/bin/logic_optimizer.py`, restructured around the typed
//! `Node` tree instead of dicts with optional fields.

use pdx_syntax::node::{self, Node, Op, Value};

use crate::tables;
use crate::Options;

/// Renders a whole tree to text, terminated by exactly one trailing newline
/// (spec §5). `source` is the original input the tree was parsed from, used
/// only for switch-preservation (spec §4.5): a `switch` block's byte span
/// into it is the fallback raw rendering.
pub fn render(nodes: &[Node], opts: &Options, source: &str) -> String {
    let mut lines = Vec::new();
    render_children_into(nodes, 0, opts, source, &mut lines);
    let mut out = lines.join("\n");
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Per-item facts the blank-line rule needs, cheap to compute and compare
/// without re-matching the node.
struct SpacingInfo {
    is_comment: bool,
    is_header: bool,
    is_block: bool,
    key: Option<String>,
}

fn spacing_info(n: &Node) -> SpacingInfo {
    match n {
        Node::Comment(text) => SpacingInfo {
            is_comment: true,
            is_header: tables::is_header_comment(text),
            is_block: false,
            key: None,
        },
        Node::RawBlock { .. } => SpacingInfo {
            is_comment: false,
            is_header: false,
            is_block: false,
            key: None,
        },
        Node::Entry { key, value, .. } => SpacingInfo {
            is_comment: false,
            is_header: false,
            is_block: value.is_block(),
            key: Some(key.clone()),
        },
    }
}

fn is_variable_assignment(n: &Node) -> bool {
    matches!(n, Node::Entry { key, value, .. } if key.starts_with('@') && !value.is_block())
}

/// Whether a blank line belongs between `prev` and `cur` (spec §4.5,
/// "Expanded rendering"): skip variable assignments, skip after a bare
/// comment unless it's a header, and only separate when at least one side is
/// a block — suppressing the line entirely when both sides are blocks that
/// share a key or belong to the same grouping.
fn wants_blank_line(prev: &SpacingInfo, cur_node: &Node) -> bool {
    if is_variable_assignment(cur_node) {
        return false;
    }
    let cur = spacing_info(cur_node);
    let base = (!cur.is_comment && (!prev.is_comment || prev.is_header))
        || (cur.is_comment && cur.is_header && !prev.is_comment)
        || (cur.is_comment && prev.is_block);
    if !base || !(cur.is_block || prev.is_block) {
        return false;
    }
    if cur.is_block && prev.is_block {
        if let (Some(ck), Some(pk)) = (&cur.key, &prev.key) {
            let same = ck == pk;
            let grouped = tables::SPACING_GROUP_KEYS.contains(&ck.as_str())
                && tables::SPACING_GROUP_KEYS.contains(&pk.as_str());
            if same || grouped {
                return false;
            }
        }
    }
    true
}

/// `depth` is the nesting depth of the items in `children` themselves (root
/// entries are depth 0). The blank-line rule only fires between depth-0
/// siblings and between a depth-0 block's direct (depth-1) children.
fn render_children_into(
    children: &[Node],
    depth: u32,
    opts: &Options,
    source: &str,
    lines: &mut Vec<String>,
) {
    let apply_spacing = depth <= 1;
    let mut prev: Option<SpacingInfo> = None;
    for (i, child) in children.iter().enumerate() {
        if apply_spacing && i > 0 {
            if let Some(p) = &prev {
                if wants_blank_line(p, child) {
                    lines.push(String::new());
                }
            }
        }
        lines.push(render_node(child, depth, opts, source));
        prev = Some(spacing_info(child));
    }
}

fn render_node(node: &Node, depth: u32, opts: &Options, source: &str) -> String {
    let indent = "\t".repeat(depth as usize);
    match node {
        Node::Comment(text) => format!("{indent}{}", text.trim_end()),
        Node::RawBlock { text, .. } => format!("{indent}{text}"),
        Node::Entry {
            attached_comments, ..
        } => {
            let mut out = String::new();
            for c in &attached_comments.preceding {
                out.push_str(&indent);
                out.push_str(c.trim_end());
                out.push('\n');
            }
            out.push_str(&render_entry(node, depth, opts, source));
            out
        }
    }
}

fn bytecount_newlines(s: &str) -> usize {
    s.matches('\n').count()
}

/// Re-bases a raw source span's leading-tab depth onto `depth`, preserving
/// the relative indentation of nested lines (spec §4.5 "re-indented").
fn reindent_raw(raw: &str, depth: u32) -> String {
    let base = "\t".repeat(depth as usize);
    let mut out = Vec::new();
    for (i, line) in raw.split('\n').enumerate() {
        if i == 0 {
            out.push(format!("{base}{}", line.trim_start_matches('\t')));
            continue;
        }
        if line.trim().is_empty() {
            out.push(String::new());
            continue;
        }
        let extra_tabs: String = line.chars().take_while(|c| *c == '\t').collect();
        out.push(format!("{base}{extra_tabs}{}", line.trim_start_matches('\t')));
    }
    out.join("\n")
}

fn render_entry(node: &Node, depth: u32, opts: &Options, source: &str) -> String {
    let indent = "\t".repeat(depth as usize);
    match node {
        Node::Entry {
            key,
            op,
            val_key,
            value: Value::Block(children),
            attached_comments,
            byte_span,
        } => {
            if is_compactable(node, depth, opts) {
                match children.iter().find(|c| c.is_comment() || matches!(c, Node::RawBlock { .. })) {
                    None => return format!("{indent}{}", render_compact_inner(node, true)),
                    Some(_) => tracing::warn!(
                        "{}",
                        pdx_common::Error::InvariantViolation {
                            reason: format!("compact block {key} contains a comment or raw block"),
                        }
                    ),
                }
            }
            let op_str = op.map(Op::as_str).unwrap_or("=");
            let val_key_str = val_key.as_deref().map(|v| format!("{v} ")).unwrap_or_default();
            let open_str = attached_comments.open.as_deref().unwrap_or("");
            let close_str = attached_comments.close.as_deref().unwrap_or("");
            let mut lines = vec![format!("{indent}{key} {op_str} {val_key_str}{{{open_str}")];
            render_children_into(children, depth + 1, opts, source, &mut lines);
            lines.push(format!("{indent}}}{close_str}"));
            let expanded = lines.join("\n");

            if key == "switch" {
                if let Some(raw) = source.get(byte_span.0..byte_span.1) {
                    if byte_span.1 > byte_span.0 {
                        let raw_rendered = reindent_raw(raw, depth);
                        if bytecount_newlines(&raw_rendered) < bytecount_newlines(&expanded) {
                            return raw_rendered;
                        }
                    }
                }
            }
            expanded
        }
        Node::Entry {
            key,
            op,
            value,
            attached_comments,
            ..
        } => {
            let inline = attached_comments.inline.as_deref().unwrap_or("");
            match value {
                Value::Unset => format!("{indent}{key}{inline}"),
                Value::Leaf(v) => {
                    let op_str = op.map(Op::as_str).unwrap_or("=");
                    format!("{indent}{key} {op_str} {v}{inline}")
                }
                Value::Block(_) => unreachable!("handled by the block arm above"),
            }
        }
        Node::Comment(_) | Node::RawBlock { .. } => {
            unreachable!("render_node handles comments and raw blocks directly")
        }
    }
}

/// Spec §4.5 steps 1–3, 5–8 (the gate) plus the recursive cost function
/// (step 9): whether `node` (an `Entry` whose value is a `Block`) should be
/// rendered as a single inline line.
fn is_compactable(node: &Node, depth: u32, opts: &Options) -> bool {
    if opts.no_compact || depth == 0 {
        return false;
    }
    let Node::Entry { key, value, .. } = node else {
        return false;
    };
    if !value.is_block() {
        return false;
    }
    let not_compact = tables::not_compact_suffixes();
    if tables::ends_with_any(key, &not_compact) {
        return false;
    }
    if !(depth > 1 || tables::ends_with_any(key, tables::COMPACT_SUFFIXES)) {
        return false;
    }
    should_be_compact(node)
}

fn should_be_compact(node: &Node) -> bool {
    let Node::Entry {
        key,
        op,
        val_key,
        value,
        attached_comments,
        ..
    } = node
    else {
        return false;
    };
    let Some(children) = value.as_block() else {
        return false;
    };
    if children.is_empty() {
        return true;
    }
    if children
        .iter()
        .any(|c| c.is_comment() || matches!(c, Node::RawBlock { .. }))
    {
        return false;
    }
    if attached_comments.open.is_some() {
        return false;
    }
    if matches!(op, Some(Op::Eq) | None) {
        if let Some(vk) = val_key {
            if tables::FORCE_COMPACT_VAL_KEYS.contains(&vk.as_str()) {
                return true;
            }
        }
    }

    let logical: Vec<&Node> = node::logical_children(children).collect();
    let n = logical.len();
    if n > 1 && tables::NORMAL_NODES.contains(&key.as_str()) {
        return false;
    }
    if n > 2 && !tables::ends_with_any(key, tables::COMPACT_SUFFIXES) {
        return false;
    }
    if n == 1 {
        let child = logical[0];
        let key_is_digits = !key.is_empty() && key.chars().all(|c| c.is_ascii_digit());
        if (key_is_digits || tables::ends_with_any(key, tables::COMPACT_SUFFIXES))
            && child.is_block_entry()
            && should_be_compact(child)
        {
            return true;
        }
    }

    let not_compact_exact = tables::not_compact_suffixes();
    let mut total = key.len() + 5;
    for child in &logical {
        let Node::Entry {
            key: ckey,
            value: cvalue,
            attached_comments: cac,
            ..
        } = child
        else {
            unreachable!("comments and raw blocks were excluded above");
        };
        if cvalue.is_block() {
            if not_compact_exact.iter().any(|s| *s == ckey) {
                return false;
            }
            if !should_be_compact(child) {
                return false;
            }
            let rendered = render_compact_inner(child, false);
            total += ckey.len() + rendered.len();
        } else {
            if cac.inline.is_some() || cac.close.is_some() {
                return false;
            }
            let vlen = match cvalue {
                Value::Leaf(v) => v.len(),
                Value::Unset => 0,
                Value::Block(_) => unreachable!(),
            };
            let child_len = ckey.len() + vlen + 3;
            if n != 1 && attached_comments.close.is_none() {
                if vlen > 9 && ckey.len() > 28 {
                    return false;
                }
                if child_len > 48 {
                    return false;
                }
            }
            total += child_len;
        }
    }
    if total > 80 && attached_comments.close.is_none() {
        return false;
    }
    true
}

/// Renders an already-confirmed-compactable block as one inline `{ ... }`
/// line, with no leading indent (the caller prefixes that). `is_outermost`
/// is true only for the block the top-level decision was made on: a nested
/// block's own close comment is hoisted up to become the parent's close
/// comment there, since an inline rendering has nowhere else to put it
/// (spec §4.5).
fn render_compact_inner(node: &Node, is_outermost: bool) -> String {
    let Node::Entry {
        key,
        op,
        val_key,
        value,
        attached_comments,
        ..
    } = node
    else {
        unreachable!("render_compact_inner only applies to block entries")
    };
    let children = value
        .as_block()
        .expect("render_compact_inner only applies to block entries");
    let op_str = op.map(Op::as_str).unwrap_or("=");
    let val_key_str = val_key.as_deref().map(|v| format!("{v} ")).unwrap_or_default();
    let mut close = attached_comments.close.clone();

    let mut parts = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Node::Entry {
                value: Value::Block(_),
                attached_comments: cac,
                ..
            } => {
                if is_outermost && close.is_none() {
                    close = cac.close.clone();
                }
                parts.push(render_compact_inner(child, false));
            }
            Node::Entry {
                key: ckey,
                op: cop,
                value: cvalue,
                attached_comments: cac,
                ..
            } => {
                if is_outermost && close.is_none() {
                    close = cac.inline.clone();
                }
                match cvalue {
                    Value::Leaf(v) => {
                        let cop_str = cop.map(Op::as_str).unwrap_or("=");
                        parts.push(format!("{ckey} {cop_str} {v}"));
                    }
                    Value::Unset => parts.push(ckey.clone()),
                    Value::Block(_) => unreachable!(),
                }
            }
            _ => unreachable!("comments and raw blocks were excluded by should_be_compact"),
        }
    }
    let joined = parts.join(" ");
    let close_str = close.unwrap_or_default();
    format!("{key} {op_str} {val_key_str}{{ {joined} }}{close_str}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdx_syntax::parser::parse_source;

    fn roundtrip(src: &str) -> String {
        let tree = parse_source(src);
        render(&tree, &Options::default(), src)
    }

    #[test]
    fn simple_leaf_has_trailing_newline() {
        assert_eq!(roundtrip("has_x = yes"), "has_x = yes\n");
    }

    #[test]
    fn nested_block_expands_by_default() {
        let out = roundtrip("root = {\n\tOR = {\n\t\thas_x = yes\n\t\thas_y = yes\n\t}\n}\n");
        assert!(out.contains("OR = {\n"), "got:\n{out}");
        assert!(out.contains("\t\thas_x = yes\n"));
    }

    #[test]
    fn small_event_block_compacts() {
        let out = roundtrip("root = {\n\ttriggered_desc = {\n\t\ttrigger = { has_x = yes }\n\t\ttext = some_event\n\t}\n}\n");
        assert!(out.contains("trigger = { has_x = yes }"), "got:\n{out}");
    }

    #[test]
    fn blank_line_between_distinct_blocks_at_depth_one() {
        let out = roundtrip("root = {\n\tOR = {\n\t\thas_x = yes\n\t}\n\tAND = {\n\t\thas_y = yes\n\t}\n}\n");
        let body: Vec<&str> = out.lines().collect();
        assert!(body.iter().any(|l| l.is_empty()), "expected a blank line, got:\n{out}");
    }

    #[test]
    fn no_blank_line_between_same_key_blocks() {
        let out = roundtrip("root = {\n\tOR = {\n\t\thas_x = yes\n\t}\n\tOR = {\n\t\thas_y = yes\n\t}\n}\n");
        let body: Vec<&str> = out.lines().collect();
        assert!(!body.iter().any(|l| l.is_empty()), "expected no blank line, got:\n{out}");
    }

    #[test]
    fn preceding_comment_rendered_above_entry() {
        let out = roundtrip("# a note\nhas_x = yes\n");
        assert_eq!(out, "# a note\nhas_x = yes\n");
    }

    #[test]
    fn raw_block_rendered_verbatim() {
        let out = roundtrip("in_breach_of = {\n  weird   spacing\n}\n");
        assert!(out.contains("weird   spacing"), "got:\n{out}");
    }

    #[test]
    fn root_level_blocks_never_compact() {
        let out = roundtrip("hsv = { 1 2 3 }\n");
        assert!(out.contains("hsv = {\n"), "got:\n{out}");
    }

    #[test]
    fn switch_preserves_compact_raw_layout() {
        let src = "root = {\n\tswitch = { trigger = x_value a_value = { has_x = yes } }\n}\n";
        let out = roundtrip(src);
        assert!(out.contains("switch = { trigger = x_value a_value = { has_x = yes } }"), "got:\n{out}");
    }

    #[test]
    fn switch_expands_when_raw_has_more_newlines() {
        let src = "root = {\n\tswitch = {\n\t\ttrigger\n\t\t=\n\t\tx_value\n\t\ta_value\n\t\t=\n\t\t{\n\t\t\thas_x\n\t\t\t=\n\t\t\tyes\n\t\t}\n\t}\n}\n";
        let out = roundtrip(src);
        assert!(out.contains("switch = {\n"), "got:\n{out}");
    }
}
