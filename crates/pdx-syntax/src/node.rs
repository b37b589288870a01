//! The tree produced by the parser (spec §3).
//!
//! A strong sum type replaces the source draft's untyped dict-with-optional-
//! fields representation (`original_source/bin/logic_optimizer.py`'s node
//! dicts carry `key`, `op`, `val`, `val_key`, `_cm_open`, ... all optional on
//! the same record): one enum for the three node shapes, and a nested enum
//! for an entry's value.

/// A comparison / assignment operator. `None` on an `Entry` means the key was
/// followed directly by a block with no operator (`hsv { ... }`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "=" => Some(Op::Eq),
            "!=" => Some(Op::Ne),
            "<" => Some(Op::Lt),
            "<=" => Some(Op::Le),
            ">" => Some(Op::Gt),
            ">=" => Some(Op::Ge),
            _ => None,
        }
    }

    /// The operator-flip used when a comparison is pushed through a negation
    /// (spec R1, R12): `< <-> >=`, `> <-> <=`, `= <-> !=`.
    pub fn negated(self) -> Op {
        match self {
            Op::Eq => Op::Ne,
            Op::Ne => Op::Eq,
            Op::Lt => Op::Ge,
            Op::Ge => Op::Lt,
            Op::Gt => Op::Le,
            Op::Le => Op::Gt,
        }
    }
}

/// The value an `Entry` carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A standalone word, e.g. `always` appearing bare in a list.
    Unset,
    /// A leaf string value.
    Leaf(String),
    /// An ordered list of children: a block.
    Block(Vec<Node>),
}

impl Value {
    pub fn as_block(&self) -> Option<&[Node]> {
        match self {
            Value::Block(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_block_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Value::Block(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Value::Leaf(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Value::Block(_))
    }
}

/// Up to four comment slots an `Entry` can own (spec §3).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachedComments {
    /// Comment lines immediately above this node; move with the node.
    pub preceding: Vec<String>,
    /// Trailing comment on the same source line as a leaf value.
    pub inline: Option<String>,
    /// Comment on the line of a block's opening brace.
    pub open: Option<String>,
    /// Comment on the line of a block's closing brace.
    pub close: Option<String>,
}

impl AttachedComments {
    pub fn is_empty(&self) -> bool {
        self.preceding.is_empty()
            && self.inline.is_none()
            && self.open.is_none()
            && self.close.is_none()
    }
}

/// One node in the parsed tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A standalone or attached comment line (already run through
    /// `format_comment`).
    Comment(String),
    /// A textual fragment preserved verbatim: `in_breach_of`/`inverted_switch`
    /// bodies (spec §4.2, §6).
    RawBlock {
        text: String,
        byte_span: (usize, usize),
    },
    /// An ordinary key/value or block.
    Entry {
        key: String,
        op: Option<Op>,
        val_key: Option<String>,
        value: Value,
        attached_comments: AttachedComments,
        byte_span: (usize, usize),
    },
}

impl Node {
    pub fn entry(key: impl Into<String>, op: Option<Op>, value: Value) -> Node {
        Node::Entry {
            key: key.into(),
            op,
            val_key: None,
            value,
            attached_comments: AttachedComments::default(),
            byte_span: (0, 0),
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Node::Entry { key, .. } => Some(key),
            _ => None,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Node::Comment(_))
    }

    pub fn is_block_entry(&self) -> bool {
        matches!(self, Node::Entry { value: Value::Block(_), .. })
    }

    pub fn as_block(&self) -> Option<&[Node]> {
        match self {
            Node::Entry { value, .. } => value.as_block(),
            _ => None,
        }
    }

    pub fn as_block_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Entry { value, .. } => value.as_block_mut(),
            _ => None,
        }
    }

    pub fn comments_mut(&mut self) -> Option<&mut AttachedComments> {
        match self {
            Node::Entry {
                attached_comments, ..
            } => Some(attached_comments),
            _ => None,
        }
    }

    /// Is this `key OP value` a leaf whose value looks like a decimal number?
    pub fn as_numeric_leaf(&self) -> Option<(&str, Op, f64)> {
        match self {
            Node::Entry {
                key,
                op: Some(op),
                value: Value::Leaf(v),
                ..
            } => v.parse::<f64>().ok().map(|n| (key.as_str(), *op, n)),
            _ => None,
        }
    }
}

/// Structural equality used by R8 (AND dedup) and R11/R15 (common-factor
/// extraction): type, key, op and value must match; for block values, the
/// *logical* (non-comment) children must be pairwise equal, in order (spec
/// §3, ported from `nodes_are_equal` in the original draft).
pub fn nodes_structurally_equal(a: &Node, b: &Node) -> bool {
    match (a, b) {
        (Node::Comment(x), Node::Comment(y)) => x == y,
        (Node::RawBlock { text: x, .. }, Node::RawBlock { text: y, .. }) => x == y,
        (
            Node::Entry {
                key: k1,
                op: o1,
                val_key: vk1,
                value: v1,
                ..
            },
            Node::Entry {
                key: k2,
                op: o2,
                val_key: vk2,
                value: v2,
                ..
            },
        ) => {
            if k1 != k2 || o1 != o2 || vk1 != vk2 {
                return false;
            }
            match (v1, v2) {
                (Value::Block(c1), Value::Block(c2)) => {
                    let c1: Vec<&Node> = c1.iter().filter(|n| !n.is_comment()).collect();
                    let c2: Vec<&Node> = c2.iter().filter(|n| !n.is_comment()).collect();
                    c1.len() == c2.len()
                        && c1
                            .iter()
                            .zip(c2.iter())
                            .all(|(x, y)| nodes_structurally_equal(x, y))
                }
                (Value::Leaf(x), Value::Leaf(y)) => x == y,
                (Value::Unset, Value::Unset) => true,
                _ => false,
            }
        }
        _ => false,
    }
}

/// Non-comment entries, in order (a recurring filter across the rewriter).
pub fn logical_children(children: &[Node]) -> impl Iterator<Item = &Node> {
    children.iter().filter(|n| !n.is_comment())
}
