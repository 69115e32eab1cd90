//! Dialects: named, frozen collections of lexer matchers, keyword sets,
//! bracket pairs and grammar definitions.
//!
//! A dialect is authored as a [`DialectKit`] (mutable, with late-binding
//! references permitted), usually by `copy_as` from a parent followed by
//! `replace`/`add`/`patch_lexer` mutations. Before use it is *expanded*:
//! every reference-by-name resolves into an arena of compiled
//! matchables (cycles become index references), after which the
//! [`Dialect`] is immutable and safely shared across threads.

mod ansi;
mod ansi_keywords;
mod mysql;
mod postgres;
mod registry;

use std::collections::BTreeSet;

use indexmap::IndexMap;
use regex::Regex;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::errors::CoreError;
use crate::grammar::{
    Grammar, GrammarDef, GrammarId, NodeDef, NodeId, Recast, SimpleHint, compute_simple_hints,
};
use crate::lexer::Matcher;
use crate::segments::Segment;

pub use ansi::ansi_dialect_kit;
pub use mysql::mysql_dialect_kit;
pub use postgres::postgres_dialect_kit;
pub use registry::dialect_by_name;

/// A bracket pair definition, by registry names.
#[derive(Debug, Clone)]
pub struct BracketPairDef {
    pub kind: SmolStr,
    pub start_name: SmolStr,
    pub end_name: SmolStr,
    /// Whether the bracket segments persist in the matched tree.
    pub persists: bool,
}

/// A resolved bracket pair.
#[derive(Debug, Clone)]
pub struct BracketPair {
    pub kind: SmolStr,
    pub start: GrammarId,
    pub end: GrammarId,
    pub persists: bool,
}

/// A segment-class registration in the builder stage.
#[derive(Debug, Clone)]
pub struct SegmentDefKit {
    pub seg_type: SmolStr,
    pub parent_types: Vec<SmolStr>,
    pub match_grammar: GrammarDef,
    pub parse_grammar: Option<GrammarDef>,
}

impl SegmentDefKit {
    pub fn new(seg_type: &str, match_grammar: GrammarDef) -> Self {
        Self {
            seg_type: SmolStr::new(seg_type),
            parent_types: Vec::new(),
            match_grammar,
            parse_grammar: None,
        }
    }

    pub fn with_parent_types(mut self, types: &[&str]) -> Self {
        self.parent_types = types.iter().map(|t| SmolStr::new(t)).collect();
        self
    }

    pub fn with_parse_grammar(mut self, grammar: GrammarDef) -> Self {
        self.parse_grammar = Some(grammar);
        self
    }
}

/// A registry entry: either a plain grammar or a segment class.
#[derive(Debug, Clone)]
pub enum RegistryEntry {
    Grammar(GrammarDef),
    Segment(SegmentDefKit),
}

/// An unexpanded dialect: mutable, inheritable.
#[derive(Debug, Clone)]
pub struct DialectKit {
    name: SmolStr,
    root_segment: SmolStr,
    reserved_keywords: BTreeSet<SmolStr>,
    unreserved_keywords: BTreeSet<SmolStr>,
    lexer_matchers: Vec<Matcher>,
    registry: IndexMap<SmolStr, RegistryEntry>,
    bracket_pairs: Vec<BracketPairDef>,
}

impl DialectKit {
    pub fn new(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            root_segment: SmolStr::new("FileSegment"),
            reserved_keywords: BTreeSet::new(),
            unreserved_keywords: BTreeSet::new(),
            lexer_matchers: Vec::new(),
            registry: IndexMap::new(),
            bracket_pairs: Vec::new(),
        }
    }

    pub fn name(&self) -> &SmolStr {
        &self.name
    }

    /// Deep copy under a new name: the inheritance primitive.
    pub fn copy_as(&self, name: &str) -> Self {
        let mut copy = self.clone();
        copy.name = SmolStr::new(name);
        copy
    }

    /// Add a new registry entry; asserts absence.
    pub fn add(&mut self, name: &str, entry: RegistryEntry) -> Result<&mut Self, CoreError> {
        if self.registry.contains_key(name) {
            return Err(CoreError::DuplicateEntry(name.to_string()));
        }
        self.registry.insert(SmolStr::new(name), entry);
        Ok(self)
    }

    /// Overwrite an existing registry entry; asserts presence.
    pub fn replace(&mut self, name: &str, entry: RegistryEntry) -> Result<&mut Self, CoreError> {
        if !self.registry.contains_key(name) {
            return Err(CoreError::MissingEntry(name.to_string()));
        }
        self.registry.insert(SmolStr::new(name), entry);
        Ok(self)
    }

    /// Register a grammar by name (shorthand for `add`).
    pub fn grammar(&mut self, name: &str, def: GrammarDef) -> Result<&mut Self, CoreError> {
        self.add(name, RegistryEntry::Grammar(def))
    }

    /// Register a segment class. With `replace = false` the name must be
    /// new; with `replace = true` it must already exist.
    pub fn segment(
        &mut self,
        name: &str,
        def: SegmentDefKit,
        replace: bool,
    ) -> Result<&mut Self, CoreError> {
        if replace {
            self.replace(name, RegistryEntry::Segment(def))
        } else {
            self.add(name, RegistryEntry::Segment(def))
        }
    }

    /// Replace lexer matchers by name, preserving order. Unknown names
    /// are appended at the front (before the catch-all matchers).
    pub fn patch_lexer(&mut self, patches: Vec<Matcher>) -> &mut Self {
        for patch in patches {
            match self
                .lexer_matchers
                .iter()
                .position(|m| m.name() == patch.name())
            {
                Some(pos) => self.lexer_matchers[pos] = patch,
                None => self.lexer_matchers.insert(0, patch),
            }
        }
        self
    }

    pub fn set_lexer_matchers(&mut self, matchers: Vec<Matcher>) -> &mut Self {
        self.lexer_matchers = matchers;
        self
    }

    pub fn add_keywords(&mut self, reserved: bool, keywords: &[&str]) -> &mut Self {
        let target = if reserved {
            &mut self.reserved_keywords
        } else {
            &mut self.unreserved_keywords
        };
        for kw in keywords {
            target.insert(SmolStr::new(kw.to_uppercase()));
        }
        self
    }

    pub fn remove_keyword(&mut self, keyword: &str) -> &mut Self {
        let upper = keyword.to_uppercase();
        self.reserved_keywords.remove(upper.as_str());
        self.unreserved_keywords.remove(upper.as_str());
        self
    }

    pub fn add_bracket_pair(
        &mut self,
        kind: &str,
        start_name: &str,
        end_name: &str,
        persists: bool,
    ) -> &mut Self {
        self.bracket_pairs.push(BracketPairDef {
            kind: SmolStr::new(kind),
            start_name: SmolStr::new(start_name),
            end_name: SmolStr::new(end_name),
            persists,
        });
        self
    }

    /// Resolve every reference and freeze.
    pub fn expand(self) -> Result<Dialect, CoreError> {
        Expander::new(self).run()
    }
}

/// An expanded, frozen dialect. Immutable and `Send + Sync`; shared
/// across worker threads.
#[derive(Debug)]
pub struct Dialect {
    name: SmolStr,
    reserved_keywords: BTreeSet<SmolStr>,
    unreserved_keywords: BTreeSet<SmolStr>,
    lexer_matchers: Vec<Matcher>,
    arena: Vec<Grammar>,
    nodes: Vec<NodeDef>,
    by_name: FxHashMap<SmolStr, GrammarId>,
    brackets: Vec<BracketPair>,
    open_bracket_types: Vec<SmolStr>,
    close_bracket_types: Vec<SmolStr>,
    hints: Vec<Option<SimpleHint>>,
    root: GrammarId,
}

impl Dialect {
    pub fn name(&self) -> &SmolStr {
        &self.name
    }

    pub fn grammar(&self, id: GrammarId) -> &Grammar {
        &self.arena[id as usize]
    }

    pub fn node(&self, id: NodeId) -> &NodeDef {
        &self.nodes[id as usize]
    }

    pub fn nodes(&self) -> &[NodeDef] {
        &self.nodes
    }

    /// Look up a named registry entry's compiled id.
    pub fn ref_id(&self, name: &str) -> Option<GrammarId> {
        self.by_name.get(name).copied()
    }

    pub fn root_grammar(&self) -> GrammarId {
        self.root
    }

    pub fn simple_hint(&self, id: GrammarId) -> Option<&SimpleHint> {
        self.hints[id as usize].as_ref()
    }

    pub fn bracket_pair(&self, kind: &str) -> Option<&BracketPair> {
        self.brackets.iter().find(|p| p.kind == kind)
    }

    pub fn is_open_bracket(&self, seg: &Segment) -> bool {
        self.open_bracket_types.iter().any(|t| seg.is_type(t))
    }

    pub fn is_close_bracket(&self, seg: &Segment) -> bool {
        self.close_bracket_types.iter().any(|t| seg.is_type(t))
    }

    pub fn lexer_matchers(&self) -> &[Matcher] {
        &self.lexer_matchers
    }

    pub fn reserved_keywords(&self) -> &BTreeSet<SmolStr> {
        &self.reserved_keywords
    }

    pub fn unreserved_keywords(&self) -> &BTreeSet<SmolStr> {
        &self.unreserved_keywords
    }

    pub fn is_keyword(&self, raw: &str) -> bool {
        let upper = raw.to_uppercase();
        self.reserved_keywords.contains(upper.as_str())
            || self.unreserved_keywords.contains(upper.as_str())
    }

    pub fn is_reserved_keyword(&self, raw: &str) -> bool {
        self.reserved_keywords.contains(raw.to_uppercase().as_str())
    }
}

// ============================================================================
// Expansion
// ============================================================================

struct Expander {
    kit: DialectKit,
    arena: Vec<Option<Grammar>>,
    nodes: Vec<NodeDef>,
    by_name: FxHashMap<SmolStr, GrammarId>,
    keyword_cache: FxHashMap<SmolStr, GrammarId>,
}

impl Expander {
    fn new(kit: DialectKit) -> Self {
        Self {
            kit,
            arena: Vec::new(),
            nodes: Vec::new(),
            by_name: FxHashMap::default(),
            keyword_cache: FxHashMap::default(),
        }
    }

    fn run(mut self) -> Result<Dialect, CoreError> {
        debug!(dialect = %self.kit.name, entries = self.kit.registry.len(), "expanding dialect");

        // Pass 1: reserve a slot for every named entry, so cycles can
        // resolve by index before their targets are compiled.
        let names: Vec<SmolStr> = self.kit.registry.keys().cloned().collect();
        for name in &names {
            let id = self.reserve();
            self.by_name.insert(name.clone(), id);
        }

        // Pass 2: compile each entry into its reserved slot.
        let entries: Vec<(SmolStr, RegistryEntry)> = self
            .kit
            .registry
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (name, entry) in entries {
            let slot = self.by_name[&name];
            match entry {
                RegistryEntry::Grammar(def) => {
                    let compiled = self.compile_value(&def)?;
                    self.arena[slot as usize] = Some(compiled);
                }
                RegistryEntry::Segment(def) => {
                    let match_grammar = self.compile_id(&def.match_grammar)?;
                    let parse_grammar = def
                        .parse_grammar
                        .as_ref()
                        .map(|g| self.compile_id(g))
                        .transpose()?;
                    let node_id = self.nodes.len() as NodeId;
                    self.nodes.push(NodeDef {
                        name: name.clone(),
                        seg_type: def.seg_type.clone(),
                        parent_types: def.parent_types.clone(),
                        match_grammar,
                        parse_grammar,
                    });
                    self.arena[slot as usize] = Some(Grammar::Node(node_id));
                }
            }
        }

        // Resolve bracket pairs and derive the bracket type tables.
        let mut brackets = Vec::new();
        let mut open_types = Vec::new();
        let mut close_types = Vec::new();
        for def in &self.kit.bracket_pairs {
            let start = *self
                .by_name
                .get(&def.start_name)
                .ok_or_else(|| CoreError::UnresolvedRef(def.start_name.to_string()))?;
            let end = *self
                .by_name
                .get(&def.end_name)
                .ok_or_else(|| CoreError::UnresolvedRef(def.end_name.to_string()))?;
            if let Some(t) = self.parser_seg_type(start) {
                if !open_types.contains(&t) {
                    open_types.push(t);
                }
            }
            if let Some(t) = self.parser_seg_type(end) {
                if !close_types.contains(&t) {
                    close_types.push(t);
                }
            }
            brackets.push(BracketPair {
                kind: def.kind.clone(),
                start,
                end,
                persists: def.persists,
            });
        }

        let root = *self
            .by_name
            .get(&self.kit.root_segment)
            .ok_or_else(|| CoreError::UnresolvedRef(self.kit.root_segment.to_string()))?;

        let arena: Vec<Grammar> = self
            .arena
            .into_iter()
            .map(|g| g.unwrap_or(Grammar::Nothing))
            .collect();

        let bracket_start_map: FxHashMap<SmolStr, GrammarId> = brackets
            .iter()
            .map(|p| (p.kind.clone(), p.start))
            .collect();
        let hints = compute_simple_hints(&arena, &self.nodes, &bracket_start_map);

        Ok(Dialect {
            name: self.kit.name,
            reserved_keywords: self.kit.reserved_keywords,
            unreserved_keywords: self.kit.unreserved_keywords,
            lexer_matchers: self.kit.lexer_matchers,
            arena,
            nodes: self.nodes,
            by_name: self.by_name,
            brackets,
            open_bracket_types: open_types,
            close_bracket_types: close_types,
            hints,
            root,
        })
    }

    fn reserve(&mut self) -> GrammarId {
        let id = self.arena.len() as GrammarId;
        self.arena.push(None);
        id
    }

    fn push(&mut self, grammar: Grammar) -> GrammarId {
        let id = self.arena.len() as GrammarId;
        self.arena.push(Some(grammar));
        id
    }

    /// Resolve the produced segment type of a (possibly wrapped) parser.
    fn parser_seg_type(&self, mut id: GrammarId) -> Option<SmolStr> {
        loop {
            match self.arena[id as usize].as_ref()? {
                Grammar::Wrapper { target, .. } => id = *target,
                Grammar::StringParser { recast, .. }
                | Grammar::RegexParser { recast, .. }
                | Grammar::MultiStringParser { recast, .. } => {
                    return Some(recast.seg_type.clone());
                }
                Grammar::TypedParser { match_type, .. } => return Some(match_type.clone()),
                _ => return None,
            }
        }
    }

    /// Compile a definition to an arena id. Plain refs alias the target
    /// slot directly; everything else gets a fresh slot.
    fn compile_id(&mut self, def: &GrammarDef) -> Result<GrammarId, CoreError> {
        if let GrammarDef::Ref {
            name,
            optional: false,
            exclude: None,
        } = def
        {
            return self
                .by_name
                .get(name)
                .copied()
                .ok_or_else(|| CoreError::UnresolvedRef(name.to_string()));
        }
        let value = self.compile_value(def)?;
        Ok(self.push(value))
    }

    fn compile_ids(&mut self, defs: &[GrammarDef]) -> Result<Vec<GrammarId>, CoreError> {
        defs.iter().map(|d| self.compile_id(d)).collect()
    }

    /// Compile a definition to a grammar value (for a named slot).
    fn compile_value(&mut self, def: &GrammarDef) -> Result<Grammar, CoreError> {
        Ok(match def {
            GrammarDef::Ref {
                name,
                optional,
                exclude,
            } => {
                let target = self
                    .by_name
                    .get(name)
                    .copied()
                    .ok_or_else(|| CoreError::UnresolvedRef(name.to_string()))?;
                let exclude = exclude
                    .as_deref()
                    .map(|e| self.compile_id(e))
                    .transpose()?;
                Grammar::Wrapper {
                    target,
                    optional: *optional,
                    exclude,
                }
            }
            GrammarDef::Keyword { keyword, optional } => {
                let target = self.keyword_parser(keyword)?;
                if *optional {
                    Grammar::Wrapper {
                        target,
                        optional: true,
                        exclude: None,
                    }
                } else {
                    // Share the cached parser via a transparent wrapper.
                    Grammar::Wrapper {
                        target,
                        optional: false,
                        exclude: None,
                    }
                }
            }
            GrammarDef::StringParser {
                template,
                case_sensitive,
                seg_type,
                extra_class_types,
            } => Grammar::StringParser {
                template: template.clone(),
                case_sensitive: *case_sensitive,
                recast: Recast {
                    seg_type: seg_type.clone(),
                    extra_class_types: extra_class_types.clone(),
                    instance_types: Vec::new(),
                },
            },
            GrammarDef::MultiStringParser {
                templates,
                seg_type,
                extra_class_types,
            } => Grammar::MultiStringParser {
                templates: templates.clone(),
                recast: Recast {
                    seg_type: seg_type.clone(),
                    extra_class_types: extra_class_types.clone(),
                    instance_types: Vec::new(),
                },
            },
            GrammarDef::TypedParser {
                match_type,
                seg_type,
                extra_class_types,
            } => Grammar::TypedParser {
                match_type: match_type.clone(),
                recast: seg_type.as_ref().map(|t| Recast {
                    seg_type: t.clone(),
                    extra_class_types: extra_class_types.clone(),
                    instance_types: Vec::new(),
                }),
            },
            GrammarDef::RegexParser {
                pattern,
                anti_pattern,
                seg_type,
                extra_class_types,
            } => Grammar::RegexParser {
                regex: compile_full_match(pattern)?,
                anti: anti_pattern
                    .as_ref()
                    .map(|p| compile_full_match(p))
                    .transpose()?,
                recast: Recast {
                    seg_type: seg_type.clone(),
                    extra_class_types: extra_class_types.clone(),
                    instance_types: Vec::new(),
                },
            },
            GrammarDef::Sequence {
                elements,
                allow_gaps,
                optional,
                terminators,
            } => Grammar::Sequence {
                elements: self.compile_ids(elements)?,
                allow_gaps: *allow_gaps,
                optional: *optional,
                terminators: self.compile_ids(terminators)?,
            },
            GrammarDef::OneOf {
                options,
                optional,
                terminators,
            } => Grammar::OneOf {
                options: self.compile_ids(options)?,
                optional: *optional,
                terminators: self.compile_ids(terminators)?,
            },
            GrammarDef::AnyNumberOf {
                options,
                min_times,
                max_times,
                allow_gaps,
                optional,
                terminators,
            } => Grammar::AnyNumberOf {
                options: self.compile_ids(options)?,
                min_times: *min_times,
                max_times: *max_times,
                allow_gaps: *allow_gaps,
                optional: *optional,
                terminators: self.compile_ids(terminators)?,
            },
            GrammarDef::Delimited {
                element,
                delimiter,
                allow_trailing,
                min_delimiters,
                allow_gaps,
                optional,
                terminators,
            } => Grammar::Delimited {
                element: self.compile_id(element)?,
                delimiter: self.compile_id(delimiter)?,
                allow_trailing: *allow_trailing,
                min_delimiters: *min_delimiters,
                allow_gaps: *allow_gaps,
                optional: *optional,
                terminators: self.compile_ids(terminators)?,
            },
            GrammarDef::Bracketed {
                content,
                bracket_kind,
                optional,
            } => Grammar::Bracketed {
                content: self.compile_id(content)?,
                bracket_kind: bracket_kind.clone(),
                optional: *optional,
            },
            GrammarDef::GreedyUntil { stops } => Grammar::GreedyUntil {
                stops: self.compile_ids(stops)?,
            },
            GrammarDef::StartsWith { head, terminators } => Grammar::StartsWith {
                head: self.compile_id(head)?,
                terminators: self.compile_ids(terminators)?,
            },
            GrammarDef::Anything { terminators } => Grammar::Anything {
                terminators: self.compile_ids(terminators)?,
            },
            GrammarDef::Nothing => Grammar::Nothing,
            GrammarDef::Meta(kind) => Grammar::Meta(kind.clone()),
            GrammarDef::Conditional { meta, config_key } => Grammar::Conditional {
                meta: meta.clone(),
                config_key: config_key.clone(),
            },
        })
    }

    /// Get or create the shared parser for a keyword, validating
    /// membership of the keyword sets.
    fn keyword_parser(&mut self, keyword: &SmolStr) -> Result<GrammarId, CoreError> {
        if let Some(&id) = self.keyword_cache.get(keyword) {
            return Ok(id);
        }
        if !self.kit.reserved_keywords.contains(keyword)
            && !self.kit.unreserved_keywords.contains(keyword)
        {
            return Err(CoreError::UnknownKeyword {
                keyword: keyword.to_string(),
                dialect: self.kit.name.to_string(),
            });
        }
        let id = self.push(Grammar::StringParser {
            template: keyword.clone(),
            case_sensitive: false,
            recast: Recast {
                seg_type: SmolStr::new("keyword"),
                extra_class_types: Vec::new(),
                instance_types: vec![SmolStr::new(keyword.to_lowercase())],
            },
        });
        self.keyword_cache.insert(keyword.clone(), id);
        Ok(id)
    }
}

/// Compile a full-match, case-insensitive regex for `RegexParser`.
fn compile_full_match(pattern: &str) -> Result<Regex, CoreError> {
    Regex::new(&format!(r"(?is)\A(?:{pattern})\z"))
        .map_err(|e| CoreError::Templating(format!("invalid grammar regex {pattern:?}: {e}")))
}
