//! Simple first-token hints.
//!
//! Every matchable may expose a conservative superset of the raw
//! strings and segment types its first token could be. Alternation uses
//! these to prune candidates before attempting a full match. A hint of
//! `None` means "may match anything".

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::grammar::{Grammar, GrammarId, NodeDef};
use crate::segments::Segment;

/// A conservative superset of first-token possibilities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleHint {
    pub raws: FxHashSet<SmolStr>,
    pub types: FxHashSet<SmolStr>,
}

impl SimpleHint {
    /// Could this segment possibly start a match?
    pub fn admits(&self, seg: &Segment) -> bool {
        self.raws.contains(seg.raw_upper().as_str())
            || self.types.iter().any(|t| seg.is_type(t))
    }

    fn union(mut self, other: SimpleHint) -> SimpleHint {
        self.raws.extend(other.raws);
        self.types.extend(other.types);
        self
    }
}

#[derive(Clone)]
enum HintState {
    Unvisited,
    InProgress,
    Done(Option<SimpleHint>),
}

/// Compute hints for every grammar in the arena. Cycles resolve
/// conservatively to `None` for the in-progress path.
pub fn compute_simple_hints(
    arena: &[Grammar],
    nodes: &[NodeDef],
    bracket_starts: &FxHashMap<SmolStr, GrammarId>,
) -> Vec<Option<SimpleHint>> {
    let mut cache = vec![HintState::Unvisited; arena.len()];
    for id in 0..arena.len() as GrammarId {
        hint_of(id, arena, nodes, bracket_starts, &mut cache);
    }
    cache
        .into_iter()
        .map(|state| match state {
            HintState::Done(hint) => hint,
            _ => None,
        })
        .collect()
}

fn hint_of(
    id: GrammarId,
    arena: &[Grammar],
    nodes: &[NodeDef],
    bracket_starts: &FxHashMap<SmolStr, GrammarId>,
    cache: &mut Vec<HintState>,
) -> Option<SimpleHint> {
    match &cache[id as usize] {
        HintState::Done(hint) => return hint.clone(),
        // A cycle: be conservative for this path, without poisoning the
        // final cached value of the node we're still computing.
        HintState::InProgress => return None,
        HintState::Unvisited => {}
    }
    cache[id as usize] = HintState::InProgress;

    let hint = match &arena[id as usize] {
        Grammar::StringParser { template, .. } => Some(SimpleHint {
            raws: FxHashSet::from_iter([template.clone()]),
            types: FxHashSet::default(),
        }),
        Grammar::MultiStringParser { templates, .. } => Some(SimpleHint {
            raws: templates.iter().cloned().collect(),
            types: FxHashSet::default(),
        }),
        Grammar::TypedParser { match_type, .. } => Some(SimpleHint {
            raws: FxHashSet::default(),
            types: FxHashSet::from_iter([match_type.clone()]),
        }),
        Grammar::RegexParser { .. } => None,
        Grammar::Node(node_id) => {
            let target = nodes[*node_id as usize].match_grammar;
            hint_of(target, arena, nodes, bracket_starts, cache)
        }
        Grammar::Wrapper { target, .. } => {
            hint_of(*target, arena, nodes, bracket_starts, cache)
        }
        Grammar::Sequence { elements, .. } => {
            let mut acc = SimpleHint::default();
            let mut complete = false;
            let mut opaque = false;
            for &el in elements {
                let grammar = &arena[el as usize];
                if matches!(grammar, Grammar::Meta(_) | Grammar::Conditional { .. }) {
                    continue;
                }
                match hint_of(el, arena, nodes, bracket_starts, cache) {
                    Some(hint) => acc = acc.union(hint),
                    None => {
                        opaque = true;
                        break;
                    }
                }
                if !arena[el as usize].is_optional() {
                    complete = true;
                    break;
                }
            }
            if opaque || (!complete && elements.is_empty()) {
                None
            } else if complete {
                Some(acc)
            } else {
                // All elements optional: the hint is incomplete, so be
                // conservative.
                None
            }
        }
        Grammar::OneOf { options, .. } | Grammar::AnyNumberOf { options, .. } => {
            let mut acc = SimpleHint::default();
            for &opt in options {
                match hint_of(opt, arena, nodes, bracket_starts, cache) {
                    Some(hint) => acc = acc.union(hint),
                    None => {
                        cache[id as usize] = HintState::Done(None);
                        return None;
                    }
                }
            }
            Some(acc)
        }
        Grammar::Delimited { element, .. } => {
            hint_of(*element, arena, nodes, bracket_starts, cache)
        }
        Grammar::Bracketed { bracket_kind, .. } => bracket_starts
            .get(bracket_kind)
            .and_then(|&start| hint_of(start, arena, nodes, bracket_starts, cache)),
        Grammar::StartsWith { head, .. } => {
            hint_of(*head, arena, nodes, bracket_starts, cache)
        }
        Grammar::GreedyUntil { .. } | Grammar::Anything { .. } => None,
        // Never matches: an empty hint prunes it everywhere.
        Grammar::Nothing => Some(SimpleHint::default()),
        // Zero-width: can "match" before any token.
        Grammar::Meta(_) | Grammar::Conditional { .. } => None,
    };

    cache[id as usize] = HintState::Done(hint.clone());
    hint
}
