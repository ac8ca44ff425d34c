//! Parsed style sheets and the per-conversion rule set compiled into a DFA.

use crate::errors::CssError;
use crate::pages::{PageRule, recompose_page_rules};
use crate::rules::{CssRule, Property, Rule};
use css_automaton::{AutomatonBuilder, Dfa, RuleId};
use css_selectors::{NamespacePrefixes, parse_selector_group};
use css_syntax::Stylesheet;
use log::{debug, info};
use rustc_hash::FxHashSet;
use std::sync::Arc;
use url::Url;

/// Conversion factor between an origin offset and specificity.
pub const ORIGIN_WEIGHT: i32 = 10_000_000;

/// A parsed style sheet with its resolved includes. Immutable, shared by
/// every rule set that uses it.
#[derive(Clone, Debug, Default)]
pub struct CssRuleSet {
    url: Option<Url>,
    rules: Vec<Arc<CssRule>>,
    page_rules: Vec<PageRule>,
    includes: Vec<Arc<CssRuleSet>>,
}

impl CssRuleSet {
    #[inline]
    pub const fn new(
        url: Option<Url>,
        rules: Vec<Arc<CssRule>>,
        page_rules: Vec<PageRule>,
        includes: Vec<Arc<Self>>,
    ) -> Self {
        Self {
            url,
            rules,
            page_rules,
            includes,
        }
    }

    /// Turn a parsed style sheet into rules. Every selector of a group
    /// becomes its own rule.
    ///
    /// # Errors
    /// Returns `CssError::Syntax` for a malformed selector or an undeclared
    /// namespace prefix; the whole sheet is rejected.
    pub fn from_stylesheet(
        url: Option<Url>,
        sheet: &Stylesheet,
        includes: Vec<Arc<Self>>,
    ) -> Result<Self, CssError> {
        let mut prefixes = NamespacePrefixes::default();
        for namespace in &sheet.namespaces {
            prefixes.declare(namespace.prefix.as_deref().unwrap_or(""), &namespace.uri);
        }

        let mut rules = Vec::new();
        for style_rule in &sheet.rules {
            let selectors = parse_selector_group(&style_rule.prelude, &prefixes).map_err(|error| {
                CssError::Syntax {
                    line: style_rule.position.line,
                    column: style_rule.position.column,
                    message: format!("{error} in selector {:?}", style_rule.prelude),
                }
            })?;
            let properties: Vec<Property> = style_rule.declarations.iter().map(Property::from).collect();
            for selector in selectors {
                rules.push(Arc::new(CssRule::new(selector, properties.clone())));
            }
        }

        let page_rules = sheet
            .pages
            .iter()
            .map(|page| {
                PageRule::new(
                    page.style_name(),
                    page.declarations.iter().map(Property::from).collect(),
                )
            })
            .collect();

        Ok(Self::new(url, rules, page_rules, includes))
    }

    #[inline]
    pub const fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    #[inline]
    pub fn rules(&self) -> &[Arc<CssRule>] {
        &self.rules
    }

    #[inline]
    pub fn page_rules(&self) -> &[PageRule] {
        &self.page_rules
    }

    /// Directly included sheets, in `@import` order.
    #[inline]
    pub fn includes(&self) -> &[Arc<Self>] {
        &self.includes
    }

    /// All transitively included sheets, depth first with includes before
    /// their includer, each sheet once.
    pub fn includes_recursive(&self) -> Vec<Arc<Self>> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        collect_includes(self, &mut seen, &mut out);
        out
    }
}

fn collect_includes(
    set: &CssRuleSet,
    seen: &mut FxHashSet<*const CssRuleSet>,
    out: &mut Vec<Arc<CssRuleSet>>,
) {
    for include in &set.includes {
        if seen.insert(Arc::as_ptr(include)) {
            collect_includes(include, seen, out);
            out.push(Arc::clone(include));
        }
    }
}

/// Conventional origin offsets, applied as multiples of [`ORIGIN_WEIGHT`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Origin {
    /// Built-in defaults of the converter.
    Default,
    UserAgent,
    Author,
    User,
}

impl Origin {
    #[inline]
    pub const fn offset(self) -> i32 {
        match self {
            Self::Default => -2,
            Self::UserAgent => -1,
            Self::Author => 0,
            Self::User => 1,
        }
    }
}

/// A compiled snapshot: the DFA plus the rules its states refer to.
#[derive(Debug)]
pub struct CompiledRules {
    dfa: Dfa,
    rules: Vec<Rule>,
}

impl CompiledRules {
    #[inline]
    pub const fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    #[inline]
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.0 as usize)
    }

    #[inline]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// The rules of one conversion. Single owner; compiled snapshots are shared.
#[derive(Debug, Default)]
pub struct RuleSet {
    builder: AutomatonBuilder,
    rules: Vec<Rule>,
    page_rules: Vec<PageRule>,
    position: u32,
    /// `None` while rules were added since the last compilation.
    compiled: Option<Arc<CompiledRules>>,
    trace: bool,
}

impl RuleSet {
    /// An empty rule set. `trace` turns on automaton dumps.
    pub fn new(trace: bool) -> Self {
        Self {
            builder: AutomatonBuilder::new(trace),
            trace,
            ..Self::default()
        }
    }

    /// Add a style sheet with everything it includes. Included sheets come
    /// first, so the includer wins ties. `offset` shifts specificity by
    /// multiples of [`ORIGIN_WEIGHT`]; see [`Origin::offset`].
    pub fn add_rule_set(&mut self, set: &CssRuleSet, offset: i32) {
        for include in set.includes_recursive() {
            self.add_rule_set_core(&include, offset);
        }
        self.add_rule_set_core(set, offset);
    }

    fn add_rule_set_core(&mut self, set: &CssRuleSet, offset: i32) {
        for rule in set.rules() {
            self.add_rule(rule, offset);
        }
        self.page_rules.extend_from_slice(set.page_rules());
    }

    /// Add one style sheet rule, split into one cascade rule per property.
    pub fn add_rule(&mut self, css_rule: &Arc<CssRule>, offset: i32) {
        if css_rule.properties().is_empty() {
            return;
        }
        let specificity = css_rule
            .specificity()
            .saturating_add(offset.saturating_mul(ORIGIN_WEIGHT));
        let mut ids = Vec::with_capacity(css_rule.properties().len());
        for property in css_rule.properties() {
            ids.push(RuleId(u32::try_from(self.rules.len()).unwrap_or(u32::MAX)));
            self.rules.push(Rule::new(
                Arc::clone(css_rule),
                property.clone(),
                self.position,
                specificity,
            ));
            self.position = self.position.saturating_add(1);
        }
        let pseudo = css_rule.pseudo_element_name().is_some();
        if !self.builder.add_rule(css_rule.selector(), &ids, pseudo) {
            debug!("Selector {} is outside CSS2 and never matches", css_rule.selector());
        }
        self.compiled = None;
    }

    /// True when rules were added since the last compilation.
    #[inline]
    pub const fn is_stale(&self) -> bool {
        self.compiled.is_none()
    }

    /// The compiled snapshot, rebuilding the DFA first if rules were added.
    pub fn compiled_rules(&mut self) -> Arc<CompiledRules> {
        if let Some(compiled) = &self.compiled {
            return Arc::clone(compiled);
        }
        let compiled = Arc::new(CompiledRules {
            dfa: self.builder.generate_dfa(),
            rules: self.rules.clone(),
        });
        info!("Compiled {} rules", compiled.rules.len());
        self.compiled = Some(Arc::clone(&compiled));
        compiled
    }

    /// Page rules in the order they were added.
    #[inline]
    pub fn page_rules(&self) -> &[PageRule] {
        &self.page_rules
    }

    /// Page rules merged per page style name.
    pub fn cascaded_page_rules(&self) -> Vec<PageRule> {
        recompose_page_rules(&self.page_rules)
    }

    /// Number of cascade rules added so far.
    #[inline]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Forget all rules, ready for the next document.
    pub fn clear(&mut self) {
        *self = Self::new(self.trace);
    }
}
