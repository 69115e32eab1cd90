//! Per-parse state threaded through matching.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::dialects::Dialect;
use crate::grammar::GrammarId;
use crate::grammar::match_result::MatchResult;

/// Default recursion ceiling; pathological grammars are refused with a
/// diagnostic rather than a stack fault.
pub const DEFAULT_MAX_DEPTH: usize = 250;

/// Carries the active dialect, recursion bookkeeping, the terminator
/// stack and the memoisation table for one file's parse.
pub struct ParseContext<'a> {
    pub dialect: &'a Dialect,
    /// Enabled indentation flags for `Conditional` metas
    /// (e.g. `indented_joins`).
    indent_flags: FxHashSet<SmolStr>,
    depth: usize,
    max_depth: usize,
    depth_exceeded: bool,
    terminators: Vec<GrammarId>,
    /// Memo of named-grammar matches keyed by `(matcher, token index,
    /// terminator scope)`. The scope matters: grammars like `Anything`
    /// consume up to whichever terminators are live.
    memo: FxHashMap<(GrammarId, usize, u64), MatchResult>,
}

impl<'a> ParseContext<'a> {
    pub fn new(dialect: &'a Dialect, indent_flags: FxHashSet<SmolStr>) -> Self {
        Self {
            dialect,
            indent_flags,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            depth_exceeded: false,
            terminators: Vec::new(),
            memo: FxHashMap::default(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn indent_flag(&self, key: &str) -> bool {
        self.indent_flags.contains(key)
    }

    /// Run `f` one level deeper, refusing (empty match) past the limit.
    pub fn deeper<R>(
        &mut self,
        on_limit: R,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        if self.depth >= self.max_depth {
            self.depth_exceeded = true;
            return on_limit;
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Was the recursion limit hit anywhere during this parse?
    pub fn depth_was_exceeded(&self) -> bool {
        self.depth_exceeded
    }

    /// Run `f` with extra terminators in scope. When `replace` is true
    /// the existing stack is shadowed rather than extended (used inside
    /// brackets, where outer terminators no longer apply).
    pub fn with_terminators<R>(
        &mut self,
        extra: &[GrammarId],
        replace: bool,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved_len = self.terminators.len();
        let saved: Vec<GrammarId> = if replace {
            std::mem::take(&mut self.terminators)
        } else {
            Vec::new()
        };
        self.terminators.extend_from_slice(extra);
        let result = f(self);
        if replace {
            self.terminators = saved;
        } else {
            self.terminators.truncate(saved_len);
        }
        result
    }

    pub fn terminators(&self) -> &[GrammarId] {
        &self.terminators
    }

    /// A stable fingerprint of the live terminator stack.
    pub fn terminator_fingerprint(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = rustc_hash::FxHasher::default();
        self.terminators.hash(&mut hasher);
        hasher.finish()
    }

    pub fn memo_get(&self, key: (GrammarId, usize, u64)) -> Option<&MatchResult> {
        self.memo.get(&key)
    }

    pub fn memo_put(&mut self, key: (GrammarId, usize, u64), value: MatchResult) {
        self.memo.insert(key, value);
    }
}
