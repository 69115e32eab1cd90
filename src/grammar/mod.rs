//! The grammar engine.
//!
//! A grammar is a tree of combinators describing how to consume a prefix
//! of the token sequence. Dialects are authored with [`GrammarDef`]
//! values (which may contain late-binding [`GrammarDef::Ref`] nodes);
//! expansion compiles them into an arena of [`Grammar`] nodes addressed
//! by [`GrammarId`], which permits cycles.
//!
//! Matching is span-based: a [`MatchResult`] records which slice of the
//! flat raw-segment array was consumed and how to build the tree from
//! it, without allocating any segments until [`MatchResult::apply`].

mod context;
mod def;
mod engine;
mod hints;
mod match_result;

use smol_str::SmolStr;

use crate::segments::MetaKind;

pub use context::ParseContext;
pub use def::{
    GrammarDef, any_of, bracketed, delimited, g_anything, g_nothing, kw, meta, one_of, r,
    regex_parser, seq, string_parser, typed_parser,
};
pub use engine::{match_grammar, skip_gap};
pub use hints::SimpleHint;
pub(crate) use hints::compute_simple_hints;
pub use match_result::{Matched, MatchResult};

/// Index of a compiled grammar in a dialect's arena.
pub type GrammarId = u32;

/// Index of a segment-class definition in a dialect's node table.
pub type NodeId = u32;

/// How a parser primitive re-types the leaf it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recast {
    pub seg_type: SmolStr,
    pub extra_class_types: Vec<SmolStr>,
    pub instance_types: Vec<SmolStr>,
}

impl Recast {
    pub fn new(seg_type: &str) -> Self {
        Self {
            seg_type: SmolStr::new(seg_type),
            extra_class_types: Vec::new(),
            instance_types: Vec::new(),
        }
    }

    pub fn with_class_types(mut self, types: &[&str]) -> Self {
        self.extra_class_types = types.iter().map(|t| SmolStr::new(t)).collect();
        self
    }

    pub fn with_instance_types(mut self, types: &[&str]) -> Self {
        self.instance_types = types.iter().map(|t| SmolStr::new(t)).collect();
        self
    }
}

/// A segment-class definition: ties a grammar to a branch segment type.
///
/// `match_grammar` establishes the outer bounds of the segment. If
/// `parse_grammar` is present the parser applies it recursively to the
/// children afterwards (the two-phase match/parse pattern).
#[derive(Debug, Clone)]
pub struct NodeDef {
    pub name: SmolStr,
    pub seg_type: SmolStr,
    pub parent_types: Vec<SmolStr>,
    pub match_grammar: GrammarId,
    pub parse_grammar: Option<GrammarId>,
}

/// A compiled grammar node. Children are arena indices, so recursive
/// grammars are simply cyclic index references.
#[derive(Debug, Clone)]
pub enum Grammar {
    /// Match a single code leaf by exact raw text.
    StringParser {
        template: SmolStr,
        case_sensitive: bool,
        recast: Recast,
    },
    /// Match a single code leaf against any of several raw strings.
    MultiStringParser {
        templates: Vec<SmolStr>,
        recast: Recast,
    },
    /// Match a single leaf by segment type.
    TypedParser {
        match_type: SmolStr,
        recast: Option<Recast>,
    },
    /// Match a single code leaf by regex (with optional anti-pattern).
    RegexParser {
        regex: regex::Regex,
        anti: Option<regex::Regex>,
        recast: Recast,
    },
    /// Match a named segment class (wraps the match in a branch).
    Node(NodeId),
    /// A resolved reference carrying per-use flags.
    Wrapper {
        target: GrammarId,
        optional: bool,
        exclude: Option<GrammarId>,
    },
    Sequence {
        elements: Vec<GrammarId>,
        allow_gaps: bool,
        optional: bool,
        terminators: Vec<GrammarId>,
    },
    /// Longest-match alternation; declared order breaks ties.
    OneOf {
        options: Vec<GrammarId>,
        optional: bool,
        terminators: Vec<GrammarId>,
    },
    AnyNumberOf {
        options: Vec<GrammarId>,
        min_times: usize,
        max_times: Option<usize>,
        allow_gaps: bool,
        optional: bool,
        terminators: Vec<GrammarId>,
    },
    Delimited {
        element: GrammarId,
        delimiter: GrammarId,
        allow_trailing: bool,
        min_delimiters: usize,
        allow_gaps: bool,
        optional: bool,
        terminators: Vec<GrammarId>,
    },
    /// A bracketed block; the pair is resolved from the dialect's
    /// bracket table by kind (e.g. `round`, `square`).
    Bracketed {
        content: GrammarId,
        bracket_kind: SmolStr,
        optional: bool,
    },
    /// Consume up to (not including) the first token matching a stop.
    GreedyUntil { stops: Vec<GrammarId> },
    /// Only attempt if `head` matches at the cursor; consumption is
    /// bounded by the terminators.
    StartsWith {
        head: GrammarId,
        terminators: Vec<GrammarId>,
    },
    /// Matches any run of tokens (bounded by terminators in scope).
    Anything { terminators: Vec<GrammarId> },
    /// Matches nothing, ever.
    Nothing,
    /// Zero-width meta insertion.
    Meta(MetaKind),
    /// Meta insertion gated on a named indentation config flag.
    Conditional { meta: MetaKind, config_key: SmolStr },
}

impl Grammar {
    /// May this grammar be skipped inside a sequence without failing it?
    pub fn is_optional(&self) -> bool {
        match self {
            Grammar::Wrapper { optional, .. }
            | Grammar::Sequence { optional, .. }
            | Grammar::OneOf { optional, .. }
            | Grammar::Delimited { optional, .. }
            | Grammar::Bracketed { optional, .. } => *optional,
            Grammar::AnyNumberOf {
                optional, min_times, ..
            } => *optional || *min_times == 0,
            _ => false,
        }
    }

    /// Is this a zero-width meta insertion?
    pub fn as_meta(&self) -> Option<&MetaKind> {
        match self {
            Grammar::Meta(kind) => Some(kind),
            _ => None,
        }
    }
}
