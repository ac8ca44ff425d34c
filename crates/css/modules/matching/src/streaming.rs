//! The streaming matcher.

use crate::evaluate::ElementFacts;
use crate::{Attribute, MatcherConfig, XHTML_NAMESPACE};
use css_automaton::{Dfa, DfaState, Event, RuleId, StateId, element_variants};
use css_cascade::{CompiledRules, Rule};
use log::trace;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An open element, or the document root at the bottom of the stack.
#[derive(Debug, Default)]
struct OpenElement {
    attributes: Vec<Attribute>,
    language: String,
    states: FxHashSet<StateId>,
    /// Closed children so far.
    child_count: usize,
    /// States of the most recently closed child.
    last_child_states: FxHashSet<StateId>,
}

/// Follows start and end events and reports the rules matching the current
/// element.
///
/// One matcher serves one document. It shares the compiled snapshot it was
/// created with; rules added to the rule set afterwards are not seen.
#[derive(Debug)]
pub struct Matcher {
    compiled: Arc<CompiledRules>,
    config: MatcherConfig,
    stack: Vec<OpenElement>,
}

impl Matcher {
    pub fn new(compiled: Arc<CompiledRules>, config: MatcherConfig) -> Self {
        Self {
            compiled,
            config,
            stack: Vec::new(),
        }
    }

    /// Reset to an empty document.
    pub fn start_document(&mut self) {
        self.stack.clear();
        self.stack.push(OpenElement {
            language: self.config.default_language.clone(),
            ..OpenElement::default()
        });
    }

    /// Enter an element. `namespace` is `None` (or empty) for elements
    /// without a namespace.
    pub fn start_element(&mut self, namespace: Option<&str>, local_name: &str, attributes: &[Attribute]) {
        if self.stack.is_empty() {
            self.start_document();
        }
        let Some(parent) = self.stack.last() else {
            return;
        };
        let namespace = namespace.filter(|uri| !uri.is_empty());
        if self.config.trace {
            trace_element(namespace, local_name, attributes);
        }

        let language = element_language(namespace, attributes).unwrap_or(parent.language.as_str());
        let facts = ElementFacts {
            attributes,
            language,
            position: parent.child_count,
        };
        let step = Step {
            dfa: self.compiled.dfa(),
            facts: &facts,
            trace: self.config.trace,
        };
        let variants = element_variants(step.dfa.symbols(), namespace, local_name);
        let mut states = FxHashSet::default();

        for &from in &parent.states {
            step.events(from, &variants, &mut states);
        }
        for &previous in &parent.last_child_states {
            if let Some(after) = step.dfa.state(previous).and_then(|state| state.transition(&Event::Sibling)) {
                step.trace(previous, after, || "SIBLING".to_owned());
                step.events(after, &variants, &mut states);
            }
        }
        step.events(step.dfa.start(), &variants, &mut states);

        let element = OpenElement {
            attributes: attributes.to_vec(),
            language: language.to_owned(),
            states,
            ..OpenElement::default()
        };
        self.stack.push(element);
    }

    /// Leave the current element.
    pub fn end_element(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        let Some(closed) = self.stack.pop() else {
            return;
        };
        if let Some(parent) = self.stack.last_mut() {
            parent.child_count += 1;
            parent.last_child_states = closed.states;
        }
    }

    /// Element rules matching the current element, in cascade order.
    pub fn matching_rules(&self) -> Vec<&Rule> {
        self.collect(|state| state.rules())
    }

    /// Pseudo-element rules matching the current element, in cascade order.
    pub fn matching_pseudo_rules(&self) -> Vec<&Rule> {
        self.collect(|state| state.pseudo_rules())
    }

    /// Pseudo-element rules for one pseudo-element, e.g. `first-line`.
    pub fn matching_pseudo_rules_for(&self, pseudo_element: &str) -> Vec<&Rule> {
        let mut rules = self.matching_pseudo_rules();
        rules.retain(|rule| rule.pseudo_element_name() == Some(pseudo_element));
        rules
    }

    /// Language of the current element.
    pub fn language(&self) -> Option<&str> {
        self.stack.last().map(|element| element.language.as_str())
    }

    /// Attributes of the current element.
    pub fn attributes(&self) -> &[Attribute] {
        self.stack
            .last()
            .map(|element| element.attributes.as_slice())
            .unwrap_or_default()
    }

    /// Open elements, not counting the document root.
    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    #[inline]
    pub const fn compiled(&self) -> &Arc<CompiledRules> {
        &self.compiled
    }

    fn collect<'rules, F>(&'rules self, ids: F) -> Vec<&'rules Rule>
    where
        F: Fn(&'rules DfaState) -> &'rules [RuleId],
    {
        let Some(current) = self.stack.last() else {
            return Vec::new();
        };
        let dfa = self.compiled.dfa();
        let mut ordered: BTreeMap<(i32, u32), &Rule> = BTreeMap::new();
        for &id in &current.states {
            let Some(state) = dfa.state(id) else {
                continue;
            };
            for &rule_id in ids(state) {
                if let Some(rule) = self.compiled.rule(rule_id) {
                    ordered.insert((rule.specificity(), rule.position()), rule);
                }
            }
        }
        ordered.into_values().collect()
    }
}

/// One element start: the automaton and the facts its conditions test.
struct Step<'doc> {
    dfa: &'doc Dfa,
    facts: &'doc ElementFacts<'doc>,
    trace: bool,
}

impl Step<'_> {
    /// Take every variant `from` has a transition for.
    fn events(&self, from: StateId, variants: &[Event], states: &mut FxHashSet<StateId>) {
        let Some(state) = self.dfa.state(from) else {
            return;
        };
        for event in variants {
            if let Some(next) = state.transition(event) {
                self.trace(from, next, || event.describe(self.dfa.symbols()));
                if states.insert(next) {
                    self.conditions(next, states);
                }
            }
        }
    }

    /// Follow the condition edges of `from` that hold, transitively.
    fn conditions(&self, from: StateId, states: &mut FxHashSet<StateId>) {
        let Some(state) = self.dfa.state(from) else {
            return;
        };
        for &(condition_id, next) in state.conditions() {
            let Some(condition) = self.dfa.condition(condition_id) else {
                continue;
            };
            if self.facts.holds(condition) {
                self.trace(from, next, || condition.to_string());
                if states.insert(next) {
                    self.conditions(next, states);
                }
            }
        }
    }

    fn trace<L: FnOnce() -> String>(&self, from: StateId, to: StateId, label: L) {
        if self.trace {
            trace!("{} -> {}: {}", from.index(), to.index(), label());
        }
    }
}

/// Language declared on the element itself. `lang` counts for XHTML elements
/// only; `xml:lang` for any element.
fn element_language<'doc>(namespace: Option<&str>, attributes: &'doc [Attribute]) -> Option<&'doc str> {
    let by_qname = |qname: &str| {
        attributes
            .iter()
            .find(|attribute| attribute.qname == qname)
            .map(|attribute| attribute.value.as_str())
    };
    let html_lang = match namespace {
        Some(XHTML_NAMESPACE) => by_qname("lang"),
        _ => None,
    };
    html_lang.or_else(|| by_qname("xml:lang"))
}

fn trace_element(namespace: Option<&str>, local_name: &str, attributes: &[Attribute]) {
    let rendered: Vec<String> = attributes
        .iter()
        .map(|attribute| format!("{}={}", attribute.qname, attribute.value))
        .collect();
    trace!(
        "{}|{local_name}: {}",
        namespace.unwrap_or_default(),
        rendered.join(" ")
    );
}
