//! The rewriter's rule table (spec §4.4, R1–R16), applied in the stated order
//! by `optimize` in `lib.rs`. Each function operates on one sibling list and
//! the `ParentKey` context it lives under, mutating in place and returning
//! whether it changed anything — mirroring `optimize_node_list`'s in-place
//! mutation style in `original_source/bin/logic_optimizer.py`, generalized to
//! the richer rule set spec.md describes.

use std::collections::HashMap;

use pdx_syntax::canon::is_scope_gate;
use pdx_syntax::node::{self, Node, Op, Value};

use crate::context::{is_non_negatable, ParentKey};
use crate::ops::{
    block, extract_common_and_children, flip_bool_leaf, flip_comparison, is_block_keyed,
    is_negatable_comparison, key_eq, leaf_bool_value, negate, positive_form, take_block_children,
};
use crate::tables;
use crate::RewriteOptions;

fn logical_count(children: &[Node]) -> usize {
    node::logical_children(children).count()
}

fn is_structural_negation(n: &Node) -> bool {
    is_block_keyed(n, "NOT") || matches!(leaf_bool_value(n), Some((_, false)))
}

/// R1: fuse adjacent `(NOT|NOR)` blocks with a negatable comparison into one
/// `NOR`, in either order, plus the three-node sandwich variant.
pub fn negation_absorption(children: &mut Vec<Node>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < children.len() {
        let is_wrap = |n: &Node| is_block_keyed(n, "NOT") || is_block_keyed(n, "NOR");

        // Three-node sandwich: wrap - comparison - wrap.
        if i + 2 < children.len()
            && is_wrap(&children[i])
            && is_negatable_comparison(&children[i + 1])
            && is_wrap(&children[i + 2])
        {
            let right = children.remove(i + 2);
            let mut comp = children.remove(i + 1);
            let left = children.remove(i);
            flip_comparison(&mut comp);
            let mut merged = take_block_children(left);
            merged.push(comp);
            merged.extend(take_block_children(right));
            children.insert(i, block("NOR", merged));
            changed = true;
            continue;
        }

        if i + 1 < children.len() {
            if is_wrap(&children[i]) && is_negatable_comparison(&children[i + 1]) {
                let mut comp = children.remove(i + 1);
                let left = children.remove(i);
                flip_comparison(&mut comp);
                let mut merged = take_block_children(left);
                merged.push(comp);
                children.insert(i, block("NOR", merged));
                changed = true;
                continue;
            }
            if is_negatable_comparison(&children[i]) && is_wrap(&children[i + 1]) {
                let right = children.remove(i + 1);
                let mut comp = children.remove(i);
                flip_comparison(&mut comp);
                let mut merged = vec![comp];
                merged.extend(take_block_children(right));
                children.insert(i, block("NOR", merged));
                changed = true;
                continue;
            }
        }
        i += 1;
    }
    changed
}

/// R2: inline any immediate `AND` child's children when the parent isn't
/// explicit logic.
pub fn and_hoist(children: &mut Vec<Node>, parent: &ParentKey) -> bool {
    if parent.is_explicit_logic() {
        return false;
    }
    let mut changed = false;
    let mut i = 0;
    while i < children.len() {
        if is_block_keyed(&children[i], "AND") {
            let node = children.remove(i);
            let spliced = take_block_children(node);
            let n = spliced.len();
            for (offset, item) in spliced.into_iter().enumerate() {
                children.insert(i + offset, item);
            }
            changed = true;
            tracing::debug!(parent = ?parent, "hoisted children from AND block");
            i += n.max(1).saturating_sub(1); // rescan from the first spliced item
            continue;
        }
        i += 1;
    }
    changed
}

/// R3: merge sibling `OR` blocks inside `OR`/`NOR`, and sibling `AND` blocks
/// inside `AND`/`NAND`/implicit — matching keys merge even when not
/// physically adjacent (ported from the original's `keys_to_merge_indices`).
pub fn sibling_merge(children: &mut Vec<Node>, parent: &ParentKey) -> bool {
    let or_mergeable = parent.is_or() || parent.is_nor();
    let and_mergeable = parent.is_and() || parent.is_nand() || matches!(parent, ParentKey::Implicit);
    if !or_mergeable && !and_mergeable {
        return false;
    }
    let mut changed = false;
    let mut targets: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<Node> = Vec::with_capacity(children.len());
    for node in children.drain(..) {
        let can_merge = match node.key() {
            Some("OR") if or_mergeable && node.is_block_entry() => true,
            Some("AND") if and_mergeable && node.is_block_entry() => true,
            _ => false,
        };
        if can_merge {
            let key = node.key().unwrap().to_string();
            if let Some(&idx) = targets.get(&key) {
                if let Some(Node::Entry {
                    value: Value::Block(extra),
                    ..
                }) = Some(node)
                {
                    if let Node::Entry {
                        value: Value::Block(target_children),
                        ..
                    } = &mut merged[idx]
                    {
                        target_children.extend(extra);
                    }
                }
                changed = true;
                continue;
            }
            targets.insert(key, merged.len());
        }
        merged.push(node);
    }
    *children = merged;
    changed
}

/// R4: flatten a child whose key matches the enclosing block's own kind
/// (`OR`/`AND`/`NOR`/`NAND` inline same-key children; `NOR` also inlines
/// `OR`, `NAND` also inlines `AND`). Comments on the inlined child's
/// open/close become standalone comments (`take_block_children`).
pub fn flatten_nested(children: &mut Vec<Node>, parent: &ParentKey) -> bool {
    let targets: &[&str] = if parent.is_or() {
        &["OR"]
    } else if parent.is_and() {
        &["AND"]
    } else if parent.is_nor() {
        &["NOR", "OR"]
    } else if parent.is_nand() {
        &["NAND", "AND"]
    } else {
        return false;
    };
    let mut changed = false;
    let mut i = 0;
    while i < children.len() {
        let matches = children[i].is_block_entry()
            && targets.iter().any(|k| key_eq(&children[i], k));
        if matches {
            let node = children.remove(i);
            let spliced = take_block_children(node);
            let n = spliced.len().max(1);
            for (offset, item) in spliced.into_iter().enumerate() {
                children.insert(i + offset, item);
            }
            changed = true;
            i += n - 1;
            continue;
        }
        i += 1;
    }
    changed
}

fn is_r5_candidate(n: &Node) -> bool {
    is_block_keyed(n, "NOT") || is_block_keyed(n, "NOR") || is_block_keyed(n, "NAND")
        || matches!(leaf_bool_value(n), Some((_, false)))
}

/// R5: fuse a maximal run of `NOT`/`NOR`/`NAND`/`key = no` siblings (and
/// interspersed comments) into one block, keyed `NAND` under an
/// `OR`/`NOR`/`NOT` parent, `NOR` otherwise. Each item contributes its
/// positive form.
pub fn negation_sequence_fusion(children: &mut Vec<Node>, parent: &ParentKey) -> bool {
    if is_non_negatable(match parent {
        ParentKey::Named(k) => k.as_str(),
        ParentKey::Implicit => "",
    }) {
        return false;
    }
    if let ParentKey::Named(k) = parent {
        if is_non_negatable(k) {
            return false;
        }
    }
    let merged_key = if parent.is_or() || parent.is_nor() || parent.is_not() {
        "NAND"
    } else {
        "NOR"
    };

    let mut changed = false;
    let mut out: Vec<Node> = Vec::with_capacity(children.len());
    let mut i = 0;
    let n = children.len();
    while i < n {
        if !is_r5_candidate(&children[i]) {
            out.push(children[i].clone());
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < n && (children[j].is_comment() || is_r5_candidate(&children[j])) {
            j += 1;
        }
        let run = &children[i..j];
        let candidate_count = run.iter().filter(|c| is_r5_candidate(c)).count();
        if candidate_count > 1 {
            let mut merged_children = Vec::new();
            for item in run {
                if item.is_comment() {
                    merged_children.push(item.clone());
                } else {
                    merged_children.extend(positive_form(item.clone()));
                }
            }
            out.push(block(merged_key, merged_children));
            changed = true;
            i = j;
        } else {
            out.push(children[i].clone());
            i += 1;
        }
    }
    *children = out;
    changed
}

/// R6: `any_X`/`count_X` conversion, per the process-wide trigger preference.
pub fn any_count_conversion(children: &mut [Node], opts: &RewriteOptions) -> bool {
    let mut changed = false;
    for node in children.iter_mut() {
        let Node::Entry {
            key,
            value: Value::Block(inner),
            ..
        } = node
        else {
            continue;
        };

        // (a) an `any_X` block holding an (invalid) `count` comparison is
        // really a mis-keyed `count_X`.
        if key.starts_with("any_") {
            let has_count_child = node::logical_children(inner).any(|c| {
                matches!(c, Node::Entry { key: k, op: Some(_), value: Value::Leaf(_), .. } if k == "count")
            });
            if has_count_child {
                *key = format!("count_{}", &key["any_".len()..]);
                changed = true;
                continue;
            }
        }

        if opts.use_count_triggers
            && !opts.use_any_triggers
            && key.starts_with("any_")
            && !tables::NON_COUNT_TRIGGERS.contains(&key.as_str())
        {
            let new_key = tables::count_name_for_any(key);
            tracing::debug!(from = %key, to = %new_key, "converted any_X to count_X");
            let body = std::mem::take(inner);
            let limit = block("limit", body);
            *key = new_key;
            *inner = vec![Node::entry("count", Some(Op::Ge), Value::Leaf("1".to_string())), limit];
            changed = true;
            continue;
        }

        if opts.use_any_triggers
            && !opts.use_count_triggers
            && key.starts_with("count_")
            && !tables::NON_ANY_TRIGGERS.contains(&key.as_str())
        {
            let logical: Vec<&Node> = node::logical_children(inner).collect();
            if logical.len() == 2 {
                let count_entry = logical.iter().find(|n| matches!(n.key(), Some("count")));
                let limit_entry = logical.iter().find(|n| key_eq(n, "limit") && n.is_block_entry());
                if let (Some(count_entry), Some(limit_entry)) = (count_entry, limit_entry) {
                    if let Some((_, op, val)) = count_entry.as_numeric_leaf() {
                        let limit_body = limit_entry.as_block().unwrap().to_vec();
                        let any_key = tables::any_name_for_count(key);
                        let positive = matches!(
                            (op, val as i64),
                            (Op::Gt, 0) | (Op::Ge, 1) | (Op::Ne, 0)
                        );
                        let negative = matches!(
                            (op, val as i64),
                            (Op::Lt, 1) | (Op::Le, 0) | (Op::Eq, 0)
                        );
                        if positive {
                            tracing::debug!(from = %key, to = %any_key, "converted count_X to any_X");
                            *key = any_key;
                            *inner = limit_body;
                            changed = true;
                            continue;
                        } else if negative {
                            tracing::debug!(from = %key, to = %any_key, "converted count_X to NOT any_X");
                            let any_entry = block(any_key, limit_body);
                            *key = "NOT".to_string();
                            *inner = vec![any_entry];
                            changed = true;
                            continue;
                        }
                    }
                }
            }
        }

        // (d) reorder `count` before `limit` if both present, in the wrong order.
        if key.starts_with("count_") {
            let count_idx = inner.iter().position(|n| matches!(n.key(), Some("count")));
            let limit_idx = inner.iter().position(|n| key_eq(n, "limit") && n.is_block_entry());
            if let (Some(ci), Some(li)) = (count_idx, limit_idx) {
                if ci > li {
                    let count_node = inner.remove(ci);
                    inner.insert(li, count_node);
                    changed = true;
                }
            }
        }
    }
    changed
}

/// A canonical scope-switch key (spec glossary), reusing the canonicalizer's
/// own lowercase-scope vocabulary as the "fixed vocabulary" the regex names.
fn is_scope_key(key: &str) -> bool {
    matches!(
        key,
        "root" | "prev" | "from" | "this" | "owner" | "controller" | "fromfrom"
    )
}

/// R7: inside `OR`/`NOR`, collapse identically-keyed scope-switch siblings
/// into one, OR-ing their bodies together.
pub fn or_merge_scope_siblings(children: &mut Vec<Node>, parent: &ParentKey) -> bool {
    if !(parent.is_or() || parent.is_nor()) {
        return false;
    }
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, n) in children.iter().enumerate() {
        if n.is_block_entry() {
            if let Some(k) = n.key() {
                if is_scope_key(k) {
                    groups.entry(k.to_string()).or_default().push(i);
                }
            }
        }
    }
    let group = groups.into_iter().find(|(_, idxs)| idxs.len() >= 2);
    let Some((key, idxs)) = group else {
        return false;
    };

    let mut or_children = Vec::new();
    let mut comments = Vec::new();
    for &i in &idxs {
        let Node::Entry {
            value: Value::Block(body),
            attached_comments,
            ..
        } = &children[i]
        else {
            continue;
        };
        comments.extend(attached_comments.preceding.iter().cloned().map(Node::Comment));
        let logical: Vec<Node> = body.iter().filter(|n| !n.is_comment()).cloned().collect();
        if logical.len() > 1 {
            or_children.push(block("AND", logical));
        } else if let Some(only) = logical.into_iter().next() {
            or_children.push(only);
        }
        if let Some(close) = &attached_comments.close {
            comments.push(Node::Comment(close.clone()));
        }
    }
    let mut new_children = comments;
    new_children.push(block("OR", or_children));
    let replacement = block(key, new_children);

    let first = idxs[0];
    for &i in idxs[1..].iter().rev() {
        children.remove(i);
    }
    children[first] = replacement;
    true
}

/// R8: inside `AND`, drop a child structurally equal to an earlier one.
pub fn and_dedup(children: &mut Vec<Node>, parent: &ParentKey) -> bool {
    if !parent.is_and() {
        return false;
    }
    let mut changed = false;
    let mut seen: Vec<Node> = Vec::new();
    let mut out = Vec::with_capacity(children.len());
    for node in children.drain(..) {
        if !node.is_comment() && seen.iter().any(|s| node::nodes_structurally_equal(s, &node)) {
            changed = true;
            continue;
        }
        if !node.is_comment() {
            seen.push(node.clone());
        }
        out.push(node);
    }
    *children = out;
    changed
}

/// R9: De Morgan collapse. `AND` of all-negations -> `NOR`; `OR` of all-`NOT`
/// (or a broader negation mix with at least one structural negation) -> `NAND`.
pub fn de_morgan_collapse(children: &mut [Node]) -> bool {
    let mut changed = false;
    for entry in children.iter_mut() {
        if !entry.is_block_entry() {
            continue;
        }
        let is_and = key_eq(entry, "AND");
        let is_or = key_eq(entry, "OR");
        if !is_and && !is_or {
            continue;
        }
        let body = entry.as_block().unwrap();
        let logical: Vec<&Node> = node::logical_children(body).collect();
        if logical.is_empty() {
            continue;
        }

        let collapses = if is_and {
            logical.iter().all(|n| is_structural_negation(n))
        } else {
            let all_not = logical.iter().all(|n| is_block_keyed(n, "NOT"));
            let broader = logical
                .iter()
                .all(|n| is_structural_negation(n) || is_negatable_comparison(n))
                && logical.iter().any(|n| is_structural_negation(n));
            all_not || broader
        };
        if !collapses {
            continue;
        }

        let body = body.to_vec();
        let mut new_children = Vec::new();
        for n in body {
            if n.is_comment() {
                new_children.push(n);
            } else {
                new_children.extend(positive_form(n));
            }
        }
        let new_key = if is_and { "NOR" } else { "NAND" };
        if let Node::Entry { key, value, .. } = entry {
            *key = new_key.to_string();
            *value = Value::Block(new_children);
        }
        changed = true;
    }
    changed
}

/// R10: simplify single-child `AND`/`OR`/`this` (replace with its child,
/// preserving open/close as standalone comments), single-child `NOR`/`NAND`
/// (-> `NOT`), and multi-child `NOT` (-> `NOR`).
pub fn trivial_wrappers(children: &mut Vec<Node>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < children.len() {
        let node = &children[i];
        if !node.is_block_entry() {
            i += 1;
            continue;
        }
        let key = node.key().unwrap().to_string();
        if matches!(key.as_str(), "AND" | "OR" | "this") {
            let count = logical_count(node.as_block().unwrap());
            if count == 1 {
                let node = children.remove(i);
                let spliced = take_block_children(node);
                let n = spliced.len().max(1);
                for (offset, item) in spliced.into_iter().enumerate() {
                    children.insert(i + offset, item);
                }
                changed = true;
                tracing::debug!(key, "simplified AND/OR/this with single item");
                i += n;
                continue;
            }
        } else if (key == "NOR" || key == "NAND") && logical_count(node.as_block().unwrap()) == 1 {
            if let Node::Entry { key, .. } = &mut children[i] {
                *key = "NOT".to_string();
            }
            changed = true;
        } else if key == "NOT" && logical_count(node.as_block().unwrap()) > 1 {
            if let Node::Entry { key, .. } = &mut children[i] {
                *key = "NOR".to_string();
            }
            changed = true;
        }
        i += 1;
    }
    changed
}

/// R11: `NOR { AND{A B…} AND{A C…} … }` with a common factor `A` across every
/// `AND` child becomes `OR { ¬A, NOR { AND{B…} AND{C…} … } }`.
pub fn nor_common_factor(children: &mut [Node]) -> bool {
    let mut changed = false;
    for entry in children.iter_mut() {
        if !key_eq(entry, "NOR") {
            continue;
        }
        let and_children: Vec<Node> = match entry.as_block() {
            Some(c) => node::logical_children(c).cloned().collect(),
            None => continue,
        };
        if and_children.len() < 2 || !and_children.iter().all(|n| key_eq(n, "AND") && n.is_block_entry()) {
            continue;
        }
        let (common, modified) = extract_common_and_children(&and_children);
        if common.is_empty() {
            continue;
        }
        let mut new_children: Vec<Node> = common.into_iter().map(negate).collect();
        new_children.push(block("NOR", modified));
        if let Node::Entry { key, value, .. } = entry {
            *key = "OR".to_string();
            *value = Value::Block(new_children);
        }
        changed = true;
        tracing::debug!("extracted common factor from NOR of ANDs");
    }
    changed
}

/// R12: double-negation and related `NOT` single-child simplifications.
pub fn not_simplifications(children: &mut [Node], opts: &RewriteOptions) -> bool {
    let mut changed = false;
    for entry in children.iter_mut() {
        if !key_eq(entry, "NOT") || !entry.is_block_entry() {
            continue;
        }
        let logical: Vec<Node> = node::logical_children(entry.as_block().unwrap())
            .cloned()
            .collect();
        if logical.len() != 1 {
            continue;
        }
        let c = &logical[0];

        if is_negatable_comparison(c) {
            let mut flipped = c.clone();
            flip_comparison(&mut flipped);
            *entry = flipped;
            changed = true;
            continue;
        }
        if key_eq(c, "AND") && c.is_block_entry() {
            let inner = c.as_block().unwrap().to_vec();
            *entry = block("NAND", inner);
            changed = true;
            tracing::debug!("created NAND from NOT-AND");
            continue;
        }
        if key_eq(c, "OR") && c.is_block_entry() {
            let inner = c.as_block().unwrap().to_vec();
            *entry = block("NOR", inner);
            changed = true;
            tracing::debug!("created NOR from NOT-OR");
            continue;
        }
        if key_eq(c, "NOT") && c.is_block_entry() {
            let inner = c.as_block().unwrap().to_vec();
            *entry = block("AND", inner);
            changed = true;
            continue;
        }
        if let Some((key, val)) = leaf_bool_value(c) {
            let mut n = c.clone();
            if let Node::Entry { key: k, .. } = &mut n {
                *k = key.to_string();
            }
            flip_bool_leaf(&mut n);
            let _ = val;
            *entry = n;
            changed = true;
            continue;
        }
        if c.is_block_entry() {
            let grandchildren: Vec<&Node> = c
                .as_block()
                .map(|b| node::logical_children(b).collect())
                .unwrap_or_default();
            let ck = c.key().unwrap_or_default();
            if grandchildren.len() == 1
                && !is_scope_gate(ck)
                && !is_non_negatable(ck)
            {
                if let Some((gkey, gval)) = leaf_bool_value(grandchildren[0]) {
                    let mut new_grandchild = grandchildren[0].clone();
                    if let Node::Entry { key: k, .. } = &mut new_grandchild {
                        *k = gkey.to_string();
                    }
                    flip_bool_leaf(&mut new_grandchild);
                    let _ = gval;
                    *entry = block(ck, vec![new_grandchild]);
                    changed = true;
                    continue;
                }
            }
        }
        if opts.use_count_triggers
            && ck_starts_with_any_except(c.key().unwrap_or_default())
        {
            let any_key = c.key().unwrap().to_string();
            let limit_body = c.as_block().map(|b| b.to_vec()).unwrap_or_default();
            let count_key = tables::count_name_for_any(&any_key);
            let new_children = vec![
                Node::entry("count", Some(Op::Eq), Value::Leaf("0".to_string())),
                block("limit", limit_body),
            ];
            *entry = block(count_key, new_children);
            changed = true;
        }
    }
    changed
}

fn ck_starts_with_any_except(key: &str) -> bool {
    key.starts_with("any_") && key != "any_owned_pop_amount"
}

/// R13: `owner { is_same_empire = X }` / `owner { is_same_value = X }` ->
/// `is_owned_by = X`.
pub fn owner_shortcut(children: &mut [Node]) -> bool {
    let mut changed = false;
    for node in children.iter_mut() {
        if !key_eq(node, "owner") || !node.is_block_entry() {
            continue;
        }
        let logical: Vec<&Node> = node::logical_children(node.as_block().unwrap()).collect();
        if logical.len() != 1 {
            continue;
        }
        let is_shortcut = matches!(logical[0].key(), Some("is_same_empire") | Some("is_same_value"));
        if !is_shortcut {
            continue;
        }
        let Node::Entry { op, value, .. } = logical[0] else {
            continue;
        };
        let new_node = Node::Entry {
            key: "is_owned_by".to_string(),
            op: *op,
            val_key: None,
            value: value.clone(),
            attached_comments: Default::default(),
            byte_span: (0, 0),
        };
        *node = new_node;
        changed = true;
    }
    changed
}

fn are_negations(a: &Node, b: &Node) -> bool {
    if let (Some((ka, va)), Some((kb, vb))) = (leaf_bool_value(a), leaf_bool_value(b)) {
        return ka == kb && va != vb;
    }
    if is_block_keyed(b, "NOT") {
        if let Some(inner) = b.as_block() {
            let logical: Vec<&Node> = node::logical_children(inner).collect();
            if logical.len() == 1 {
                return node::nodes_structurally_equal(logical[0], a);
            }
        }
    }
    if is_block_keyed(a, "NOT") {
        return are_negations(b, a);
    }
    if let (Some((ka, opa, va)), Some((kb, opb, vb))) = (a.as_numeric_leaf(), b.as_numeric_leaf()) {
        return ka == kb && opa.negated() == opb && (va - vb).abs() < f64::EPSILON;
    }
    false
}

/// R14: `OR { AND{A B} NOT{B} }` (or `key=no` for `B`) reduces to
/// `OR { ¬B A }`, the AND losing `B`. Repeats until no more matches exist.
pub fn or_and_not_absorption(children: &mut Vec<Node>, parent: &ParentKey) -> bool {
    if !parent.is_or() {
        return false;
    }
    let mut changed = false;
    loop {
        let mut found = None;
        'outer: for (ai, and_node) in children.iter().enumerate() {
            if !key_eq(and_node, "AND") || !and_node.is_block_entry() {
                continue;
            }
            let and_body: Vec<Node> = and_node.as_block().unwrap().to_vec();
            for (bi, b) in node::logical_children(&and_body).enumerate() {
                for (oi, other) in children.iter().enumerate() {
                    if oi == ai {
                        continue;
                    }
                    if are_negations(b, other) {
                        found = Some((ai, bi, oi));
                        break 'outer;
                    }
                }
            }
        }
        let Some((ai, bi, oi)) = found else {
            break;
        };
        let negation = children.remove(oi);
        let ai = if oi < ai { ai - 1 } else { ai };
        let Node::Entry {
            value: Value::Block(and_body),
            ..
        } = &mut children[ai]
        else {
            break;
        };
        let mut logical_idx = 0usize;
        let mut remove_at = None;
        for (idx, n) in and_body.iter().enumerate() {
            if n.is_comment() {
                continue;
            }
            if logical_idx == bi {
                remove_at = Some(idx);
                break;
            }
            logical_idx += 1;
        }
        if let Some(idx) = remove_at {
            and_body.remove(idx);
        }
        children.insert(ai, negation);
        changed = true;
    }
    changed
}

/// R15: symmetric to R11 for `OR`: every immediate child an `AND` -> factor
/// out the common sub-children as siblings of the (reduced) `OR`.
pub fn or_and_common_factor(children: &mut Vec<Node>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < children.len() {
        if !key_eq(&children[i], "OR") || !children[i].is_block_entry() {
            i += 1;
            continue;
        }
        let and_children: Vec<Node> = node::logical_children(children[i].as_block().unwrap())
            .cloned()
            .collect();
        if and_children.len() < 2 || !and_children.iter().all(|n| key_eq(n, "AND") && n.is_block_entry()) {
            i += 1;
            continue;
        }
        let (common, modified) = extract_common_and_children(&and_children);
        if common.is_empty() {
            i += 1;
            continue;
        }
        if let Node::Entry { value, .. } = &mut children[i] {
            *value = Value::Block(modified);
        }
        let n = common.len();
        for (offset, c) in common.into_iter().enumerate() {
            children.insert(i + offset, c);
        }
        i += n + 1;
        changed = true;
        tracing::debug!("extracted common factor from OR of ANDs");
    }
    changed
}

/// R16: inside `OR`, a single `NAND` child absorbs every other child that is
/// `NOT{xs}` or `key = no`, and the `OR` is promoted to that `NAND`.
pub fn nand_absorption(children: &mut Vec<Node>, parent: &ParentKey) -> bool {
    if !parent.is_or() {
        return false;
    }
    let logical: Vec<&Node> = node::logical_children(children).collect();
    let nand_positions: Vec<usize> = children
        .iter()
        .enumerate()
        .filter(|(_, n)| key_eq(n, "NAND") && n.is_block_entry())
        .map(|(i, _)| i)
        .collect();
    if nand_positions.len() != 1 {
        return false;
    }
    let nand_idx = nand_positions[0];
    let others_ok = logical
        .iter()
        .all(|n| std::ptr::eq(*n, &children[nand_idx]) || is_structural_negation(n));
    if !others_ok {
        return false;
    }
    let mut merged = children[nand_idx].as_block().unwrap().to_vec();
    for (i, n) in children.iter().enumerate() {
        if i == nand_idx || n.is_comment() {
            continue;
        }
        merged.extend(positive_form(n.clone()));
    }
    *children = vec![block("NAND", merged)];
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdx_syntax::parser::parse_source;
    use test_case::test_case;

    fn children_of(src: &str) -> Vec<Node> {
        let tree = parse_source(src);
        match tree.into_iter().next().unwrap() {
            Node::Entry {
                value: Value::Block(c),
                ..
            } => c,
            _ => panic!("expected a block entry"),
        }
    }

    #[test]
    fn r1_fuses_not_then_comparison() {
        let mut children = children_of("a = { NOT = { has_x = yes } has_y > 3 }");
        assert!(negation_absorption(&mut children));
        assert_eq!(children.len(), 1);
        assert!(key_eq(&children[0], "NOR"));
    }

    #[test]
    fn r1_fuses_comparison_then_nor() {
        let mut children = children_of("a = { has_y > 3 NOR = { has_x = yes } }");
        assert!(negation_absorption(&mut children));
        assert_eq!(children.len(), 1);
        assert!(key_eq(&children[0], "NOR"));
    }

    #[test]
    fn r1_fuses_through_scope_wrapped_comparison() {
        let mut children =
            children_of("a = { NOT = { has_x = yes } factor = { has_y > 3 } }");
        assert!(negation_absorption(&mut children));
        assert_eq!(children.len(), 1);
        assert!(key_eq(&children[0], "NOR"));
        let nor_children = children[0].as_block().unwrap();
        let wrapper = nor_children
            .iter()
            .find(|n| key_eq(n, "factor"))
            .expect("flipped comparison stays wrapped in its scope block");
        let inner = wrapper.as_block().unwrap();
        assert!(matches!(
            inner.first(),
            Some(Node::Entry { key, op: Some(Op::Le), .. }) if key == "has_y"
        ));
    }

    #[test_case("AND", &ParentKey::Implicit, true; "implicit parent hoists AND")]
    #[test_case("AND", &ParentKey::Named(String::new()), true; "unnamed-but-not-explicit parent still hoists")]
    fn r2_and_hoist_gating(inner_key: &str, parent: &ParentKey, should_change: bool) {
        let src = format!("a = {{ {inner_key} = {{ has_x = yes }} has_y = yes }}");
        let mut children = children_of(&src);
        assert_eq!(and_hoist(&mut children, parent), should_change);
    }

    #[test]
    fn r2_and_hoist_skips_explicit_logic_parent() {
        let mut children = children_of("a = { AND = { has_x = yes } has_y = yes }");
        assert!(!and_hoist(&mut children, &ParentKey::named("OR")));
    }

    #[test]
    fn r5_fuses_not_nor_sequence() {
        let mut children = children_of("a = { NOT = { has_x = yes } has_y = no NOR = { has_z = yes } }");
        assert!(negation_sequence_fusion(&mut children, &ParentKey::Implicit));
        assert_eq!(children.len(), 1);
        assert!(key_eq(&children[0], "NOR"));
        let body = children[0].as_block().unwrap();
        assert_eq!(node::logical_children(body).count(), 3);
    }

    #[test]
    fn r5_skips_non_negatable_parent() {
        let mut children = children_of("a = { NOT = { has_x = yes } has_y = no }");
        assert!(!negation_sequence_fusion(&mut children, &ParentKey::named("if")));
    }

    #[test]
    fn r6_fixes_misplaced_count_child() {
        let mut children = children_of("a = { any_owned_planet = { count > 2 } }");
        let opts = RewriteOptions::default();
        assert!(any_count_conversion(&mut children, &opts));
        assert!(key_eq(&children[0], "count_owned_planet"));
    }

    #[test]
    fn r6_any_to_count_respects_exception_table() {
        let mut children = children_of("a = { any_owned_pop_amount = { species = root } }");
        let opts = RewriteOptions {
            use_count_triggers: true,
            use_any_triggers: false,
        };
        assert!(!any_count_conversion(&mut children, &opts));
    }

    #[test]
    fn r8_dedups_and_children() {
        let mut children = children_of("a = { AND = { has_x = yes has_x = yes has_y = yes } }");
        let inner = match &mut children[0] {
            Node::Entry {
                value: Value::Block(c),
                ..
            } => c,
            _ => unreachable!(),
        };
        assert!(and_dedup(inner, &ParentKey::named("AND")));
        assert_eq!(node::logical_children(inner).count(), 2);
    }

    #[test]
    fn r9_and_of_negations_collapses_to_nor() {
        let mut children = children_of("a = { AND = { NOT = { has_x = yes } has_y = no } }");
        assert!(de_morgan_collapse(&mut children));
        assert!(key_eq(&children[0], "NOR"));
    }

    #[test]
    fn r10_single_child_and_unwraps() {
        let mut children = children_of("a = { AND = { has_x = yes } }");
        assert!(trivial_wrappers(&mut children));
        assert_eq!(children.len(), 1);
        assert!(key_eq(&children[0], "has_x"));
    }

    #[test]
    fn r10_multi_child_not_becomes_nor() {
        let mut children = children_of("a = { NOT = { has_x = yes has_y = yes } }");
        assert!(trivial_wrappers(&mut children));
        assert!(key_eq(&children[0], "NOR"));
    }

    #[test]
    fn r11_nor_of_ands_factors_common_child() {
        let mut children = children_of(
            "a = { NOR = { AND = { has_x = yes has_y = yes } AND = { has_x = yes has_z = yes } } }",
        );
        assert!(nor_common_factor(&mut children));
        assert!(key_eq(&children[0], "OR"));
        let body = children[0].as_block().unwrap();
        assert_eq!(node::logical_children(body).count(), 2);
    }

    #[test]
    fn r12_not_of_and_becomes_nand() {
        let mut children = children_of("a = { NOT = { AND = { has_x = yes has_y = yes } } }");
        let opts = RewriteOptions::default();
        assert!(not_simplifications(&mut children, &opts));
        assert!(key_eq(&children[0], "NAND"));
    }

    #[test]
    fn r13_owner_is_same_value_shortcut() {
        let mut children = children_of("a = { owner = { is_same_value = root } }");
        assert!(owner_shortcut(&mut children));
        assert_eq!(children[0].key(), Some("is_owned_by"));
    }

    #[test]
    fn r14_or_and_not_absorption_drops_the_shared_leaf() {
        let mut children =
            children_of("a = { OR = { AND = { has_x = yes has_y = yes } has_y = no } }");
        let inner = match &mut children[0] {
            Node::Entry {
                value: Value::Block(c),
                ..
            } => c,
            _ => unreachable!(),
        };
        assert!(or_and_not_absorption(inner, &ParentKey::named("OR")));
        let and_body: Vec<&Node> = inner
            .iter()
            .find(|n| key_eq(n, "AND"))
            .and_then(|n| n.as_block())
            .map(|b| node::logical_children(b).collect())
            .unwrap();
        assert_eq!(and_body.len(), 1);
    }

    #[test]
    fn r16_nand_absorbs_surrounding_negations() {
        let mut children =
            children_of("a = { OR = { NAND = { has_x = yes has_y = yes } has_z = no } }");
        let inner = match &mut children[0] {
            Node::Entry {
                value: Value::Block(c),
                ..
            } => c,
            _ => unreachable!(),
        };
        assert!(nand_absorption(inner, &ParentKey::named("OR")));
        assert_eq!(inner.len(), 1);
        assert!(key_eq(&inner[0], "NAND"));
        let body = inner[0].as_block().unwrap();
        assert_eq!(node::logical_children(body).count(), 3);
    }
}
