//! Per-conversion state.

use crate::config::EngineConfig;
use css_cascade::{CssRuleSet, Origin, PageRule, RuleSet};
use css_matching::Matcher;

/// The rule set of one conversion and the configuration it runs under.
/// Cleared between documents.
#[derive(Debug)]
pub struct Context {
    config: EngineConfig,
    rule_set: RuleSet,
}

impl Default for Context {
    #[inline]
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Context {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            rule_set: RuleSet::new(config.trace),
            config,
        }
    }

    #[inline]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Add a style sheet, with its includes, at the strength of `origin`.
    #[inline]
    pub fn add_rule_set(&mut self, set: &CssRuleSet, origin: Origin) {
        self.rule_set.add_rule_set(set, origin.offset());
    }

    #[inline]
    pub const fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    #[inline]
    pub fn rule_set_mut(&mut self) -> &mut RuleSet {
        &mut self.rule_set
    }

    /// A matcher over the rules added so far, compiling them if needed.
    pub fn matcher(&mut self) -> Matcher {
        Matcher::new(self.rule_set.compiled_rules(), self.config.matcher_config())
    }

    /// Page rules merged per page style name.
    #[inline]
    pub fn page_rules(&self) -> Vec<PageRule> {
        self.rule_set.cascaded_page_rules()
    }

    /// Forget all rules, keeping the configuration.
    #[inline]
    pub fn clear(&mut self) {
        self.rule_set.clear();
    }
}
