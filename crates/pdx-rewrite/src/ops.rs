//! Small node-construction and node-inspection helpers shared by the rule
//! modules, ported piecemeal from the dict helpers scattered through
//! `original_source/bin/logic_optimizer.py`'s `optimize_node_list`.

use pdx_syntax::node::{self, Node, Op, Value};

pub fn block(key: impl Into<String>, children: Vec<Node>) -> Node {
    Node::entry(key, Some(Op::Eq), Value::Block(children))
}

pub fn key_eq(n: &Node, k: &str) -> bool {
    matches!(n.key(), Some(key) if key == k)
}

pub fn is_block_keyed(n: &Node, k: &str) -> bool {
    n.is_block_entry() && key_eq(n, k)
}

/// `key = no` or `key = yes` leaf (spec R1/R5/R9's recurring atom).
pub fn leaf_bool_value(n: &Node) -> Option<(&str, bool)> {
    match n {
        Node::Entry {
            key,
            op: Some(Op::Eq),
            value: Value::Leaf(v),
            ..
        } => match v.as_str() {
            "yes" => Some((key, true)),
            "no" => Some((key, false)),
            _ => None,
        },
        _ => None,
    }
}

/// Flips a `key = yes` / `key = no` leaf's value in place. Panics if `n`
/// isn't such a leaf — callers check with `leaf_bool_value` first.
pub fn flip_bool_leaf(n: &mut Node) {
    if let Node::Entry {
        value: Value::Leaf(v),
        ..
    } = n
    {
        *v = if v == "yes" { "no".to_string() } else { "yes".to_string() };
    }
}

/// A negatable numerical comparison (spec R1): a leaf whose value parses as a
/// decimal and whose key begins with `has_`/`num_` (for `=`) or whose
/// operator is one of the six comparison operators (anything but `=`/`!=`
/// always qualifies; `=`/`!=` qualify only with that key prefix, matching the
/// "has_x = 3" / "num_x != 3" trigger-comparison idiom). Recurses through a
/// single-child wrapper block whose key isn't a scope gate (`any_`/`count_`)
/// or non-negatable, so e.g. `factor = { has_x > 3 }` counts too.
pub fn is_negatable_comparison(n: &Node) -> bool {
    if let Some((key, op, _)) = n.as_numeric_leaf() {
        return match op {
            Op::Eq | Op::Ne => key.starts_with("has_") || key.starts_with("num_"),
            _ => true,
        };
    }
    match single_child_wrapper(n) {
        Some(only) => is_negatable_comparison(only),
        None => false,
    }
}

/// If `n` is a block entry whose key isn't a scope gate or non-negatable, and
/// it has exactly one logical (non-comment) child, returns that child.
fn single_child_wrapper(n: &Node) -> Option<&Node> {
    let Node::Entry {
        key,
        value: Value::Block(children),
        ..
    } = n
    else {
        return None;
    };
    if crate::context::is_non_negatable(key) || pdx_syntax::canon::is_scope_gate(key) {
        return None;
    }
    let mut logical = node::logical_children(children);
    let only = logical.next()?;
    if logical.next().is_some() {
        return None;
    }
    Some(only)
}

/// Flips a negatable comparison's operator in place (`< <-> >=`, `> <-> <=`,
/// `= <-> !=`), recursing into a single-child wrapper block the same way
/// [`is_negatable_comparison`] does. Leaves everything else untouched — callers
/// check with `is_negatable_comparison` first.
pub fn flip_comparison(n: &mut Node) {
    if let Node::Entry {
        value: Value::Leaf(_),
        op: Some(op),
        ..
    } = n
    {
        *op = op.negated();
        return;
    }
    if let Node::Entry {
        value: Value::Block(children),
        ..
    } = n
    {
        if let Some(only) = children.iter_mut().find(|c| !c.is_comment()) {
            flip_comparison(only);
        }
    }
}

/// The "positive form" a node takes when a surrounding negation is discharged
/// (spec R5): unwraps `NOT`/`NOR`/`NAND` wrappers, flips `yes`/`no` and
/// comparison leaves, and recurses one level through a single-child scope
/// wrapper that isn't a gate (`any_`/`count_`) or non-negatable.
pub fn positive_form(node: Node) -> Vec<Node> {
    if is_block_keyed(&node, "NOT") {
        if let Node::Entry {
            value: Value::Block(children),
            ..
        } = node
        {
            return children;
        }
    }
    if is_block_keyed(&node, "NOR") {
        if let Node::Entry {
            value: Value::Block(children),
            ..
        } = node
        {
            let logical_count = node::logical_children(&children).count();
            if logical_count > 1 {
                return vec![block("OR", children)];
            }
            return children;
        }
    }
    if is_block_keyed(&node, "NAND") {
        if let Node::Entry {
            value: Value::Block(children),
            ..
        } = node
        {
            return vec![block("AND", children)];
        }
    }
    if leaf_bool_value(&node).is_some() {
        let mut n = node;
        flip_bool_leaf(&mut n);
        return vec![n];
    }
    if is_negatable_comparison(&node) {
        let mut n = node;
        flip_comparison(&mut n);
        return vec![n];
    }
    if let Node::Entry {
        key,
        value: Value::Block(children),
        ..
    } = &node
    {
        if !crate::context::is_non_negatable(key) && !pdx_syntax::canon::is_scope_gate(key) {
            let logical: Vec<&Node> = node::logical_children(children).collect();
            if logical.len() == 1 {
                let only = logical[0].clone();
                let comments: Vec<Node> = children
                    .iter()
                    .filter(|c| c.is_comment())
                    .cloned()
                    .collect();
                let Node::Entry { key, .. } = &node else {
                    unreachable!()
                };
                let key = key.clone();
                let mut new_children = positive_form(only);
                new_children.extend(comments);
                return vec![block(key, new_children)];
            }
        }
    }
    vec![node]
}

/// Strips a block's `Value::Block` children out, turning its `open`/`close`
/// comments into standalone comment nodes at the splice boundary (spec R2,
/// R4: "comments ... are preserved as standalone comment nodes at the
/// inlining position").
pub fn take_block_children(node: Node) -> Vec<Node> {
    if let Node::Entry {
        value: Value::Block(children),
        attached_comments,
        ..
    } = node
    {
        let mut v = Vec::with_capacity(children.len() + 2);
        if let Some(open) = attached_comments.open {
            v.push(Node::Comment(open.trim().to_string()));
        }
        v.extend(children);
        if let Some(close) = attached_comments.close {
            v.push(Node::Comment(close.trim().to_string()));
        }
        v
    } else {
        vec![node]
    }
}

/// The negated representation of a positive node `A` (the inverse of
/// `positive_form`): reuses the same table, the direction R11/R14/R15 need
/// when building `¬A` for a factored-out common child (spec R11: "Negation
/// of A uses the rules in R5").
pub fn negate(node: Node) -> Node {
    if is_block_keyed(&node, "NOT")
        || is_block_keyed(&node, "NOR")
        || is_block_keyed(&node, "NAND")
        || matches!(leaf_bool_value(&node), Some((_, false)))
        || is_negatable_comparison(&node)
    {
        let mut results = positive_form(node);
        return results.pop().unwrap_or_else(|| Node::Comment(String::new()));
    }
    if matches!(leaf_bool_value(&node), Some((_, true))) {
        let mut n = node;
        flip_bool_leaf(&mut n);
        return n;
    }
    if is_block_keyed(&node, "AND") {
        if let Node::Entry {
            value: Value::Block(children),
            ..
        } = node
        {
            return block("NAND", children);
        }
    }
    if is_block_keyed(&node, "OR") {
        if let Node::Entry {
            value: Value::Block(children),
            ..
        } = node
        {
            return block("NOR", children);
        }
    }
    block("NOT", vec![node])
}

/// Ports `_extract_common_and_children`: the child nodes common to every
/// `AND` block in `and_blocks`, plus each block with those children removed.
pub fn extract_common_and_children(and_blocks: &[Node]) -> (Vec<Node>, Vec<Node>) {
    if and_blocks.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let first_children: Vec<&Node> = match &and_blocks[0] {
        Node::Entry {
            value: Value::Block(c),
            ..
        } => node::logical_children(c).collect(),
        _ => Vec::new(),
    };
    let mut common = Vec::new();
    for candidate in first_children {
        let everywhere = and_blocks[1..].iter().all(|other| {
            let other_children: Vec<&Node> = match other {
                Node::Entry {
                    value: Value::Block(c),
                    ..
                } => node::logical_children(c).collect(),
                _ => Vec::new(),
            };
            other_children
                .iter()
                .any(|o| node::nodes_structurally_equal(candidate, o))
        });
        if everywhere {
            common.push(candidate.clone());
        }
    }

    let modified: Vec<Node> = and_blocks
        .iter()
        .map(|and_node| match and_node {
            Node::Entry {
                key,
                op,
                val_key,
                value: Value::Block(children),
                attached_comments,
                byte_span,
            } => {
                let new_children: Vec<Node> = children
                    .iter()
                    .filter(|c| {
                        c.is_comment()
                            || !common
                                .iter()
                                .any(|cm| node::nodes_structurally_equal(cm, c))
                    })
                    .cloned()
                    .collect();
                Node::Entry {
                    key: key.clone(),
                    op: *op,
                    val_key: val_key.clone(),
                    value: Value::Block(new_children),
                    attached_comments: attached_comments.clone(),
                    byte_span: *byte_span,
                }
            }
            other => other.clone(),
        })
        .collect();

    (common, modified)
}
