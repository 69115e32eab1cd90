//! Builder-stage grammar definitions.
//!
//! Dialects are authored with [`GrammarDef`] values. References by name
//! (`Ref`, `Keyword`) stay unresolved until the dialect is expanded,
//! which is what lets derived dialects patch entries before anything is
//! compiled.

use smol_str::SmolStr;

use crate::segments::MetaKind;

/// An unexpanded grammar definition.
#[derive(Debug, Clone)]
pub enum GrammarDef {
    /// Late-binding reference into the dialect's registry.
    Ref {
        name: SmolStr,
        optional: bool,
        exclude: Option<Box<GrammarDef>>,
    },
    /// Reference to a keyword; resolves to a `StringParser` and asserts
    /// membership of the dialect's keyword sets at expansion.
    Keyword { keyword: SmolStr, optional: bool },
    StringParser {
        template: SmolStr,
        case_sensitive: bool,
        seg_type: SmolStr,
        extra_class_types: Vec<SmolStr>,
    },
    MultiStringParser {
        templates: Vec<SmolStr>,
        seg_type: SmolStr,
        extra_class_types: Vec<SmolStr>,
    },
    TypedParser {
        match_type: SmolStr,
        seg_type: Option<SmolStr>,
        extra_class_types: Vec<SmolStr>,
    },
    RegexParser {
        pattern: SmolStr,
        anti_pattern: Option<SmolStr>,
        seg_type: SmolStr,
        extra_class_types: Vec<SmolStr>,
    },
    Sequence {
        elements: Vec<GrammarDef>,
        allow_gaps: bool,
        optional: bool,
        terminators: Vec<GrammarDef>,
    },
    OneOf {
        options: Vec<GrammarDef>,
        optional: bool,
        terminators: Vec<GrammarDef>,
    },
    AnyNumberOf {
        options: Vec<GrammarDef>,
        min_times: usize,
        max_times: Option<usize>,
        allow_gaps: bool,
        optional: bool,
        terminators: Vec<GrammarDef>,
    },
    Delimited {
        element: Box<GrammarDef>,
        delimiter: Box<GrammarDef>,
        allow_trailing: bool,
        min_delimiters: usize,
        allow_gaps: bool,
        optional: bool,
        terminators: Vec<GrammarDef>,
    },
    Bracketed {
        content: Box<GrammarDef>,
        bracket_kind: SmolStr,
        optional: bool,
    },
    GreedyUntil { stops: Vec<GrammarDef> },
    StartsWith {
        head: Box<GrammarDef>,
        terminators: Vec<GrammarDef>,
    },
    Anything { terminators: Vec<GrammarDef> },
    Nothing,
    Meta(MetaKind),
    Conditional { meta: MetaKind, config_key: SmolStr },
}

impl GrammarDef {
    /// Mark this element optional within its parent sequence.
    pub fn optional(mut self) -> Self {
        match &mut self {
            GrammarDef::Ref { optional, .. }
            | GrammarDef::Keyword { optional, .. }
            | GrammarDef::Sequence { optional, .. }
            | GrammarDef::OneOf { optional, .. }
            | GrammarDef::AnyNumberOf { optional, .. }
            | GrammarDef::Delimited { optional, .. }
            | GrammarDef::Bracketed { optional, .. } => *optional = true,
            // Parsers become optional by wrapping in a Ref-less OneOf;
            // in practice only named elements are marked optional.
            other => {
                let inner = other.clone();
                return GrammarDef::OneOf {
                    options: vec![inner],
                    optional: true,
                    terminators: Vec::new(),
                };
            }
        }
        self
    }

    /// Exclude a pattern from matching (only meaningful on `Ref`).
    pub fn exclude(mut self, pattern: GrammarDef) -> Self {
        if let GrammarDef::Ref { exclude, .. } = &mut self {
            *exclude = Some(Box::new(pattern));
        }
        self
    }

    /// Attach terminators to a container grammar.
    pub fn terminated_by(mut self, stops: Vec<GrammarDef>) -> Self {
        match &mut self {
            GrammarDef::Sequence { terminators, .. }
            | GrammarDef::OneOf { terminators, .. }
            | GrammarDef::AnyNumberOf { terminators, .. }
            | GrammarDef::Delimited { terminators, .. }
            | GrammarDef::Anything { terminators }
            | GrammarDef::StartsWith { terminators, .. } => *terminators = stops,
            _ => {}
        }
        self
    }

    /// Disable whitespace skipping between elements.
    pub fn no_gaps(mut self) -> Self {
        match &mut self {
            GrammarDef::Sequence { allow_gaps, .. }
            | GrammarDef::AnyNumberOf { allow_gaps, .. }
            | GrammarDef::Delimited { allow_gaps, .. } => *allow_gaps = false,
            _ => {}
        }
        self
    }

    /// Set the repetition floor (only meaningful on `AnyNumberOf`).
    pub fn min_times(mut self, n: usize) -> Self {
        if let GrammarDef::AnyNumberOf { min_times, .. } = &mut self {
            *min_times = n;
        }
        self
    }

    /// Set the repetition ceiling (only meaningful on `AnyNumberOf`).
    pub fn max_times(mut self, n: usize) -> Self {
        if let GrammarDef::AnyNumberOf { max_times, .. } = &mut self {
            *max_times = Some(n);
        }
        self
    }

    /// Allow a trailing delimiter (only meaningful on `Delimited`).
    pub fn allow_trailing(mut self) -> Self {
        if let GrammarDef::Delimited { allow_trailing, .. } = &mut self {
            *allow_trailing = true;
        }
        self
    }

    /// Require at least `n` delimiters (only meaningful on `Delimited`).
    pub fn min_delimiters(mut self, n: usize) -> Self {
        if let GrammarDef::Delimited { min_delimiters, .. } = &mut self {
            *min_delimiters = n;
        }
        self
    }

    /// Use a non-round bracket pair (only meaningful on `Bracketed`).
    pub fn bracket_kind(mut self, kind: &str) -> Self {
        if let GrammarDef::Bracketed { bracket_kind, .. } = &mut self {
            *bracket_kind = SmolStr::new(kind);
        }
        self
    }
}

// ============================================================================
// Constructor helpers, used pervasively in dialect definitions
// ============================================================================

/// A late-binding reference to a named registry entry.
pub fn r(name: &str) -> GrammarDef {
    GrammarDef::Ref {
        name: SmolStr::new(name),
        optional: false,
        exclude: None,
    }
}

/// A keyword reference (case-insensitive, validated at expansion).
pub fn kw(keyword: &str) -> GrammarDef {
    GrammarDef::Keyword {
        keyword: SmolStr::new(keyword.to_uppercase()),
        optional: false,
    }
}

/// Match each element in order.
pub fn seq(elements: Vec<GrammarDef>) -> GrammarDef {
    GrammarDef::Sequence {
        elements,
        allow_gaps: true,
        optional: false,
        terminators: Vec::new(),
    }
}

/// Longest-match alternation.
pub fn one_of(options: Vec<GrammarDef>) -> GrammarDef {
    GrammarDef::OneOf {
        options,
        optional: false,
        terminators: Vec::new(),
    }
}

/// Greedy repetition of any of the options.
pub fn any_of(options: Vec<GrammarDef>) -> GrammarDef {
    GrammarDef::AnyNumberOf {
        options,
        min_times: 0,
        max_times: None,
        allow_gaps: true,
        optional: false,
        terminators: Vec::new(),
    }
}

/// A delimited list, e.g. comma-separated select targets.
pub fn delimited(element: GrammarDef, delimiter: GrammarDef) -> GrammarDef {
    GrammarDef::Delimited {
        element: Box::new(element),
        delimiter: Box::new(delimiter),
        allow_trailing: false,
        min_delimiters: 0,
        allow_gaps: true,
        optional: false,
        terminators: Vec::new(),
    }
}

/// A round-bracketed block (other kinds via [`GrammarDef::bracket_kind`]).
pub fn bracketed(content: GrammarDef) -> GrammarDef {
    GrammarDef::Bracketed {
        content: Box::new(content),
        bracket_kind: SmolStr::new("round"),
        optional: false,
    }
}

/// Match a single code leaf by exact raw text, producing `seg_type`.
pub fn string_parser(template: &str, seg_type: &str) -> GrammarDef {
    GrammarDef::StringParser {
        template: SmolStr::new(template.to_uppercase()),
        case_sensitive: false,
        seg_type: SmolStr::new(seg_type),
        extra_class_types: Vec::new(),
    }
}

/// Match a single leaf by its existing segment type.
pub fn typed_parser(match_type: &str, seg_type: Option<&str>) -> GrammarDef {
    GrammarDef::TypedParser {
        match_type: SmolStr::new(match_type),
        seg_type: seg_type.map(SmolStr::new),
        extra_class_types: Vec::new(),
    }
}

/// Match a single code leaf by regex, producing `seg_type`.
pub fn regex_parser(pattern: &str, seg_type: &str) -> GrammarDef {
    GrammarDef::RegexParser {
        pattern: SmolStr::new(pattern),
        anti_pattern: None,
        seg_type: SmolStr::new(seg_type),
        extra_class_types: Vec::new(),
    }
}

/// The universal matcher (bounded by terminators in scope).
pub fn g_anything() -> GrammarDef {
    GrammarDef::Anything {
        terminators: Vec::new(),
    }
}

/// The rejecting matcher.
pub fn g_nothing() -> GrammarDef {
    GrammarDef::Nothing
}

/// A zero-width meta insertion.
pub fn meta(kind: MetaKind) -> GrammarDef {
    GrammarDef::Meta(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_flag() {
        let def = r("ExpressionSegment").optional();
        match def {
            GrammarDef::Ref { optional, .. } => assert!(optional),
            other => panic!("unexpected def: {other:?}"),
        }
    }

    #[test]
    fn test_keyword_uppercased() {
        match kw("select") {
            GrammarDef::Keyword { keyword, .. } => assert_eq!(keyword.as_str(), "SELECT"),
            other => panic!("unexpected def: {other:?}"),
        }
    }

    #[test]
    fn test_delimited_builders() {
        let def = delimited(r("ColumnReferenceSegment"), r("CommaSegment"))
            .allow_trailing()
            .min_delimiters(1);
        match def {
            GrammarDef::Delimited {
                allow_trailing,
                min_delimiters,
                ..
            } => {
                assert!(allow_trailing);
                assert_eq!(min_delimiters, 1);
            }
            other => panic!("unexpected def: {other:?}"),
        }
    }
}
