//! The rewriter's one piece of context-sensitivity (spec §4.4): which block
//! this list of siblings lives directly inside. Kept as the parent's actual
//! key (mirroring `parent_key` in `original_source/bin/logic_optimizer.py`)
//! rather than a closed enum, since `calc_true_if` needs to answer "yes" to
//! both `is_explicit_logic` and `is_non_negatable` at once (spec §9 Open
//! Questions) — a single-variant enum can't express that overlap cleanly.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentKey {
    /// The top level, or any block whose key isn't one of the five logic
    /// operators or `calc_true_if` — rewritten rules treat these alike.
    Implicit,
    Named(String),
}

impl ParentKey {
    pub fn named(key: impl Into<String>) -> Self {
        ParentKey::Named(key.into())
    }

    fn is(&self, key: &str) -> bool {
        matches!(self, ParentKey::Named(s) if s == key)
    }

    pub fn is_or(&self) -> bool {
        self.is("OR")
    }
    pub fn is_and(&self) -> bool {
        self.is("AND")
    }
    pub fn is_nor(&self) -> bool {
        self.is("NOR")
    }
    pub fn is_nand(&self) -> bool {
        self.is("NAND")
    }
    pub fn is_not(&self) -> bool {
        self.is("NOT")
    }
    pub fn is_calc_true_if(&self) -> bool {
        self.is("calc_true_if")
    }

    /// Explicit logic: `OR`, `NOR`, `NAND`, `NOT`, `calc_true_if` (spec
    /// glossary). `AND` is notably absent — it's the implicit default.
    pub fn is_explicit_logic(&self) -> bool {
        self.is_or() || self.is_nor() || self.is_nand() || self.is_not() || self.is_calc_true_if()
    }
}

/// Non-negatable scopes (spec §4.4, glossary): pushing a negation into one of
/// these is forbidden regardless of what the rewriter would otherwise do.
pub fn is_non_negatable(key: &str) -> bool {
    matches!(
        key,
        "if" | "else_if" | "else" | "while" | "switch" | "calc_true_if"
    )
}
