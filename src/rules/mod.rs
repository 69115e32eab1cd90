//! The rule engine: rule trait, crawlers, fixes, noqa and the bundled
//! rule set.
//!
//! Rules are static: plugin bundles hand their constructors to the
//! registry when the linter is built, and the registry is frozen from
//! then on. Rule execution is pure - a rule receives a context and
//! returns results; all tree edits happen in the engine's fix
//! applicator.

pub mod capitalisation;
pub mod context;
pub mod crawlers;
pub mod fix;
pub mod layout;
pub mod noqa;
pub mod references;
pub mod structure;

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::config::{ConfigValue, LintConfig};
use crate::errors::{CoreError, RuleError};
use crate::templater::{RawTemplater, Templater};

pub use context::{RuleContext, RuleMemory};
pub use crawlers::Crawl;
pub use fix::{FixOp, LintFix, LintResult};

/// The accepted shape of one rule option.
#[derive(Debug, Clone, Copy)]
pub enum OptionKind {
    Bool,
    Int,
    /// A string drawn from a closed set of allowed values.
    Choice(&'static [&'static str]),
    /// Free-form string (e.g. comma-separated word lists).
    Str,
}

/// One entry of a rule's configuration schema.
#[derive(Debug, Clone, Copy)]
pub struct ConfigOption {
    pub name: &'static str,
    pub kind: OptionKind,
    pub default: &'static str,
}

/// The interface every lint rule satisfies.
pub trait Rule: Send + Sync {
    /// Stable code, e.g. `LT01`.
    fn code(&self) -> &'static str;
    /// Machine name, e.g. `layout.spacing`.
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Group memberships (always includes `all`).
    fn groups(&self) -> &'static [&'static str];
    fn crawl_behaviour(&self) -> Crawl;
    fn is_fix_compatible(&self) -> bool {
        false
    }
    /// The options this rule accepts, validated at construction.
    fn config_schema(&self) -> &'static [ConfigOption] {
        &[]
    }
    /// Evaluate at one context. Errors are caught by the engine and
    /// surfaced as diagnostics naming the rule.
    fn eval(&self, ctx: &mut RuleContext) -> Result<Vec<LintResult>, RuleError>;
}

/// A static plugin bundle: rules plus defaults plus templaters.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn rules(&self) -> Vec<Arc<dyn Rule>>;
    fn default_config(&self) -> FxHashMap<String, FxHashMap<String, ConfigValue>> {
        FxHashMap::default()
    }
    fn templaters(&self) -> Vec<Arc<dyn Templater>> {
        Vec::new()
    }
}

/// The built-in bundle.
pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn name(&self) -> &'static str {
        "core"
    }

    fn rules(&self) -> Vec<Arc<dyn Rule>> {
        vec![
            Arc::new(layout::RuleLT01),
            Arc::new(layout::RuleLT02),
            Arc::new(layout::RuleLT03),
            Arc::new(layout::RuleLT12),
            Arc::new(capitalisation::RuleCP01),
            Arc::new(structure::RuleST03),
            Arc::new(references::RuleRF04),
        ]
    }

    fn templaters(&self) -> Vec<Arc<dyn Templater>> {
        vec![Arc::new(RawTemplater)]
    }
}

/// The frozen rule registry, built once at linter construction.
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
    templaters: Vec<Arc<dyn Templater>>,
}

impl RuleRegistry {
    /// Build from plugin bundles, validating rule options against each
    /// rule's schema.
    pub fn from_plugins(
        plugins: &[&dyn Plugin],
        config: &LintConfig,
    ) -> Result<Self, CoreError> {
        let mut rules: Vec<Arc<dyn Rule>> = Vec::new();
        let mut templaters: Vec<Arc<dyn Templater>> = Vec::new();
        for plugin in plugins {
            rules.extend(plugin.rules());
            templaters.extend(plugin.templaters());
        }

        for rule in &rules {
            validate_options(rule.as_ref(), config)?;
        }

        // Resolve selectors against the full rule set.
        let selected: Vec<Arc<dyn Rule>> = rules
            .iter()
            .filter(|rule| {
                selector_matches(&config.rules, rule.as_ref())
                    && !selector_matches_excluding(&config.exclude_rules, rule.as_ref())
            })
            .cloned()
            .collect();

        // Any selector which matched nothing is a config error.
        for selector in config.rules.iter().chain(&config.exclude_rules) {
            if selector != "all"
                && !rules
                    .iter()
                    .any(|rule| one_selector_matches(selector, rule.as_ref()))
            {
                return Err(CoreError::UnknownRule(selector.clone()));
            }
        }

        Ok(Self {
            rules: selected,
            templaters,
        })
    }

    /// The selected rules, in declaration order.
    pub fn get_rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn get_templaters(&self) -> &[Arc<dyn Templater>] {
        &self.templaters
    }

    /// The default configuration contributed by the bundled rules.
    pub fn load_default_config(&self) -> FxHashMap<String, FxHashMap<String, ConfigValue>> {
        let mut out: FxHashMap<String, FxHashMap<String, ConfigValue>> = FxHashMap::default();
        for rule in &self.rules {
            let entry = out.entry(rule.code().to_string()).or_default();
            for option in rule.config_schema() {
                entry.insert(
                    option.name.to_string(),
                    ConfigValue::Str(option.default.to_string()),
                );
            }
        }
        out
    }

    /// Option metadata for every selected rule.
    pub fn get_configs_info(&self) -> Vec<(&'static str, &'static [ConfigOption])> {
        self.rules
            .iter()
            .map(|rule| (rule.code(), rule.config_schema()))
            .collect()
    }
}

fn one_selector_matches(selector: &str, rule: &dyn Rule) -> bool {
    if selector == "all" || selector == rule.code() || rule.groups().contains(&selector) {
        return true;
    }
    // Trailing-star globs select by code prefix.
    selector
        .strip_suffix('*')
        .is_some_and(|prefix| rule.code().starts_with(prefix))
}

fn selector_matches(selectors: &[String], rule: &dyn Rule) -> bool {
    selectors.iter().any(|s| one_selector_matches(s, rule))
}

fn selector_matches_excluding(selectors: &[String], rule: &dyn Rule) -> bool {
    selectors.iter().any(|s| one_selector_matches(s, rule))
}

/// Validate the configured options for one rule against its schema.
fn validate_options(rule: &dyn Rule, config: &LintConfig) -> Result<(), CoreError> {
    let Some(options) = config.rule_options.get(rule.code()) else {
        return Ok(());
    };
    for (name, value) in options {
        let Some(schema) = rule
            .config_schema()
            .iter()
            .find(|opt| opt.name == name.as_str())
        else {
            return Err(CoreError::Config {
                rule: rule.code().to_string(),
                option: name.clone(),
                message: "unknown option".to_string(),
            });
        };
        let ok = match schema.kind {
            OptionKind::Bool => value.as_bool().is_some(),
            OptionKind::Int => value.as_int().is_some(),
            OptionKind::Str => value.as_str().is_some(),
            OptionKind::Choice(allowed) => value
                .as_str()
                .is_some_and(|s| allowed.contains(&s)),
        };
        if !ok {
            return Err(CoreError::Config {
                rule: rule.code().to_string(),
                option: name.clone(),
                message: format!("unexpected {} value", value.type_name()),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_selects_all_by_default() {
        let registry =
            RuleRegistry::from_plugins(&[&CorePlugin], &LintConfig::default()).unwrap();
        assert_eq!(registry.get_rules().len(), 7);
        assert!(!registry.get_templaters().is_empty());
    }

    #[test]
    fn test_group_and_glob_selectors() {
        let config = LintConfig::default().with_rules(&["layout"]);
        let registry = RuleRegistry::from_plugins(&[&CorePlugin], &config).unwrap();
        assert_eq!(registry.get_rules().len(), 4);

        let config = LintConfig::default().with_rules(&["LT*"]);
        let registry = RuleRegistry::from_plugins(&[&CorePlugin], &config).unwrap();
        assert_eq!(registry.get_rules().len(), 4);
    }

    #[test]
    fn test_exclude_rules() {
        let config = LintConfig::default().with_exclude_rules(&["LT02"]);
        let registry = RuleRegistry::from_plugins(&[&CorePlugin], &config).unwrap();
        assert!(registry.get_rules().iter().all(|r| r.code() != "LT02"));
    }

    #[test]
    fn test_unknown_selector_rejected() {
        let config = LintConfig::default().with_rules(&["XX99"]);
        assert!(matches!(
            RuleRegistry::from_plugins(&[&CorePlugin], &config),
            Err(CoreError::UnknownRule(_))
        ));
    }

    #[test]
    fn test_bad_option_type_rejected() {
        let config = LintConfig::default().with_rule_option(
            "CP01",
            "capitalisation_policy",
            ConfigValue::Int(3),
        );
        assert!(matches!(
            RuleRegistry::from_plugins(&[&CorePlugin], &config),
            Err(CoreError::Config { .. })
        ));
    }
}
