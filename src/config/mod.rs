//! Typed configuration consumed by the engine and rules.
//!
//! Discovery and merging of configuration *files* is a host concern;
//! the core accepts one [`LintConfig`] value per linter. Per-rule
//! options stay loosely typed here ([`ConfigValue`]) and are validated
//! against each rule's schema when the linter is constructed.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

/// A loosely-typed option value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Human name of the contained type, for config error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Str(_) => "string",
            Self::List(_) => "list",
        }
    }
}

/// The indentation unit used by the reindent engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndentUnit {
    #[default]
    Space,
    Tab,
}

impl IndentUnit {
    /// One indent step as a string, honouring `tab_space_size`.
    pub fn single_indent(&self, tab_space_size: usize) -> String {
        match self {
            Self::Space => " ".repeat(tab_space_size),
            Self::Tab => "\t".to_string(),
        }
    }
}

/// Spacing requirement on one side of a reflow point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spacing {
    /// Exactly one space (unless a newline intervenes).
    #[default]
    Single,
    /// No whitespace at all.
    Touch,
    /// Anything goes.
    Any,
}

/// Which end of a line a segment type should sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePosition {
    Leading,
    Trailing,
    Alone,
}

/// Layout configuration for one segment type.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpacingSpec {
    pub before: Spacing,
    pub after: Spacing,
    pub line_position: Option<LinePosition>,
}

/// The layout table: spacing and line-position rules keyed by segment
/// type, consulted by the reflow engine.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    specs: FxHashMap<SmolStr, SpacingSpec>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let mut specs = FxHashMap::default();
        let mut set = |seg_type: &str, before, after, line_position| {
            specs.insert(
                SmolStr::new(seg_type),
                SpacingSpec {
                    before,
                    after,
                    line_position,
                },
            );
        };
        set(
            "comma",
            Spacing::Touch,
            Spacing::Single,
            Some(LinePosition::Trailing),
        );
        set(
            "statement_terminator",
            Spacing::Touch,
            Spacing::Any,
            Some(LinePosition::Trailing),
        );
        set("casting_operator", Spacing::Touch, Spacing::Touch, None);
        set("sign_operator", Spacing::Single, Spacing::Touch, None);
        set("dot", Spacing::Touch, Spacing::Touch, None);
        set("start_bracket", Spacing::Single, Spacing::Touch, None);
        set("end_bracket", Spacing::Touch, Spacing::Single, None);
        set("start_square_bracket", Spacing::Single, Spacing::Touch, None);
        set("end_square_bracket", Spacing::Touch, Spacing::Single, None);
        set(
            "binary_operator",
            Spacing::Single,
            Spacing::Single,
            Some(LinePosition::Leading),
        );
        set(
            "comparison_operator",
            Spacing::Single,
            Spacing::Single,
            Some(LinePosition::Leading),
        );
        // Comment placement is a style choice; don't police its gaps.
        set("comment", Spacing::Any, Spacing::Any, None);
        set("placeholder", Spacing::Any, Spacing::Any, None);
        Self { specs }
    }
}

impl LayoutConfig {
    pub fn spec_for_type(&self, seg_type: &str) -> Option<SpacingSpec> {
        self.specs.get(seg_type).copied()
    }

    pub fn set_spec(&mut self, seg_type: &str, spec: SpacingSpec) {
        self.specs.insert(SmolStr::new(seg_type), spec);
    }
}

/// Configuration for one linter instance.
#[derive(Debug, Clone)]
pub struct LintConfig {
    /// Dialect name resolved against the registry.
    pub dialect: String,
    /// Rule selectors: codes, group names, or `"all"`. Globs with a
    /// trailing `*` select by prefix (e.g. `"LT*"`).
    pub rules: Vec<String>,
    pub exclude_rules: Vec<String>,
    pub tab_space_size: usize,
    pub indent_unit: IndentUnit,
    /// Drop violations anchored in templated (non-literal) regions.
    pub ignore_templated_areas: bool,
    /// Hard ceiling on lint/fix phases.
    pub phase_limit: usize,
    /// Carried for the host; the core works on `&str` throughout.
    pub encoding: String,
    /// Emit indent/dedent hints around template blocks.
    pub template_blocks_indent: bool,
    /// Extra indentation behaviours (e.g. `indented_joins`), consumed by
    /// `Conditional` grammar metas.
    pub indent_flags: FxHashSet<SmolStr>,
    /// Per-rule options, keyed by rule code.
    pub rule_options: FxHashMap<String, FxHashMap<String, ConfigValue>>,
    pub layout: LayoutConfig,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            dialect: "ansi".to_string(),
            rules: vec!["all".to_string()],
            exclude_rules: Vec::new(),
            tab_space_size: 4,
            indent_unit: IndentUnit::Space,
            ignore_templated_areas: true,
            phase_limit: 10,
            encoding: "utf-8".to_string(),
            template_blocks_indent: true,
            indent_flags: FxHashSet::default(),
            rule_options: FxHashMap::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl LintConfig {
    pub fn with_dialect(mut self, dialect: &str) -> Self {
        self.dialect = dialect.to_string();
        self
    }

    pub fn with_rules(mut self, rules: &[&str]) -> Self {
        self.rules = rules.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_exclude_rules(mut self, rules: &[&str]) -> Self {
        self.exclude_rules = rules.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_rule_option(mut self, rule: &str, option: &str, value: ConfigValue) -> Self {
        self.rule_options
            .entry(rule.to_string())
            .or_default()
            .insert(option.to_string(), value);
        self
    }

    /// Look up a per-rule option.
    pub fn rule_option(&self, rule: &str, option: &str) -> Option<&ConfigValue> {
        self.rule_options.get(rule)?.get(option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LintConfig::default();
        assert_eq!(config.dialect, "ansi");
        assert_eq!(config.tab_space_size, 4);
        assert_eq!(config.phase_limit, 10);
        assert!(config.ignore_templated_areas);
    }

    #[test]
    fn test_layout_defaults() {
        let layout = LayoutConfig::default();
        let comma = layout.spec_for_type("comma").unwrap();
        assert_eq!(comma.before, Spacing::Touch);
        assert_eq!(comma.after, Spacing::Single);
        assert_eq!(comma.line_position, Some(LinePosition::Trailing));
        assert!(layout.spec_for_type("keyword").is_none());
    }

    #[test]
    fn test_single_indent() {
        assert_eq!(IndentUnit::Space.single_indent(4), "    ");
        assert_eq!(IndentUnit::Tab.single_indent(4), "\t");
    }

    #[test]
    fn test_rule_options() {
        let config = LintConfig::default().with_rule_option(
            "CP01",
            "capitalisation_policy",
            ConfigValue::Str("upper".into()),
        );
        assert_eq!(
            config
                .rule_option("CP01", "capitalisation_policy")
                .and_then(ConfigValue::as_str),
            Some("upper")
        );
    }
}
