//! Thompson construction of the selector NFA.
//!
//! Every selector becomes a fragment with one entry and one exit state. The
//! fragments of all rules hang off a shared start state, so one automaton
//! serves a whole cascade.

use crate::RuleId;
use crate::alphabet::Event;
use crate::conditions::{ConditionId, ConditionTable};
use crate::symbols::SymbolTable;
use core::fmt::{self, Display, Formatter};
use css_selectors::Selector;

/// Label of an NFA edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Label {
    Epsilon,
    Event(Event),
    /// A condition checked against the element that was just entered.
    Condition(ConditionId),
}

/// One NFA state: ordered outgoing edges and the rules it accepts.
#[derive(Clone, Debug, Default)]
pub struct NfaState {
    pub edges: Vec<(Label, usize)>,
    pub rules: Vec<RuleId>,
    pub pseudo_rules: Vec<RuleId>,
}

/// Entry and exit of a selector fragment.
#[derive(Clone, Copy, Debug)]
struct Fragment {
    start: usize,
    end: usize,
}

/// Index of the shared start state.
pub const START: usize = 0;
/// Index of the shared end state.
pub const END: usize = 1;

/// Incremental builder for the cascade automaton. The NFA is kept after each
/// DFA generation so that later rules extend it.
#[derive(Debug)]
pub struct AutomatonBuilder {
    pub(crate) states: Vec<NfaState>,
    pub(crate) symbols: SymbolTable,
    pub(crate) conditions: ConditionTable,
    pub(crate) trace: bool,
}

impl Default for AutomatonBuilder {
    fn default() -> Self {
        Self::new(false)
    }
}

impl AutomatonBuilder {
    /// An empty automaton. With `trace` set, generation dumps the NFA and
    /// DFA through `log::trace!`.
    pub fn new(trace: bool) -> Self {
        Self {
            states: vec![NfaState::default(), NfaState::default()],
            symbols: SymbolTable::default(),
            conditions: ConditionTable::default(),
            trace,
        }
    }

    /// Number of NFA states, the shared start and end included.
    #[inline]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// The NFA states in id order.
    #[inline]
    pub fn states(&self) -> &[NfaState] {
        &self.states
    }

    /// Add the fragment for `selector`, accepting `rules` at its exit. Pseudo
    /// rules are kept apart from element rules in the generated DFA.
    ///
    /// Returns `false` when the selector uses a kind outside CSS2; such a
    /// selector gets no fragment and its rules never match.
    pub fn add_rule(&mut self, selector: &Selector, rules: &[RuleId], pseudo: bool) -> bool {
        let Some(fragment) = self.fragment(selector) else {
            return false;
        };
        self.edge(START, Label::Epsilon, fragment.start);
        self.edge(fragment.end, Label::Epsilon, END);
        let Some(exit) = self.states.get_mut(fragment.end) else {
            return false;
        };
        if pseudo {
            exit.pseudo_rules.extend_from_slice(rules);
        } else {
            exit.rules.extend_from_slice(rules);
        }
        true
    }

    fn new_state(&mut self) -> usize {
        self.states.push(NfaState::default());
        self.states.len().saturating_sub(1)
    }

    fn edge(&mut self, from: usize, label: Label, to: usize) {
        if let Some(state) = self.states.get_mut(from) {
            state.edges.push((label, to));
        }
    }

    /// Two states joined by one labeled edge.
    fn single(&mut self, label: Label) -> Fragment {
        let start = self.new_state();
        let end = self.new_state();
        self.edge(start, label, end);
        Fragment { start, end }
    }

    /// `(event)*`
    fn kleene(&mut self, event: Event) -> Fragment {
        let start = self.new_state();
        let from = self.new_state();
        let to = self.new_state();
        let end = self.new_state();
        self.edge(start, Label::Epsilon, from);
        self.edge(start, Label::Epsilon, end);
        self.edge(from, Label::Event(event), to);
        self.edge(to, Label::Epsilon, end);
        self.edge(end, Label::Epsilon, from);
        Fragment { start, end }
    }

    /// Join fragments end to start with epsilon edges.
    fn concatenate(&mut self, parts: &[Fragment]) -> Option<Fragment> {
        let first = parts.first()?;
        let last = parts.last()?;
        for pair in parts.windows(2) {
            if let [left, right] = pair {
                self.edge(left.end, Label::Epsilon, right.start);
            }
        }
        Some(Fragment {
            start: first.start,
            end: last.end,
        })
    }

    fn fragment(&mut self, selector: &Selector) -> Option<Fragment> {
        match selector {
            Selector::Element(element) => {
                let event = Event::for_selector(element, &mut self.symbols);
                Some(self.single(Label::Event(event)))
            }
            Selector::Conditional {
                selector: simple,
                condition,
            } => {
                let simple = self.fragment(simple)?;
                let id = self.conditions.intern(condition);
                let test = self.single(Label::Condition(id));
                self.concatenate(&[simple, test])
            }
            Selector::Descendant {
                ancestor,
                descendant,
            } => {
                let ancestor = self.fragment(ancestor)?;
                let between = self.kleene(Event::ANY_ELEMENT);
                let descendant = self.fragment(descendant)?;
                self.concatenate(&[ancestor, between, descendant])
            }
            Selector::Child { parent, child } if child.is_pseudo_element() => self.fragment(parent),
            Selector::Child { parent, child } => {
                let parent = self.fragment(parent)?;
                let child = self.fragment(child)?;
                self.concatenate(&[parent, child])
            }
            Selector::DirectAdjacent { previous, next } => {
                let previous = self.fragment(previous)?;
                let sibling = self.single(Label::Event(Event::Sibling));
                let next = self.fragment(next)?;
                self.concatenate(&[previous, sibling, next])
            }
            Selector::GeneralSibling { .. } | Selector::Negative(_) | Selector::PseudoElement(_) => None,
        }
    }

    /// Text dump of the states reachable from the start state.
    pub fn dump(&self) -> String {
        self.to_string()
    }
}

impl Display for AutomatonBuilder {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let symbols = self.symbols.snapshot();
        let mut seen = vec![false; self.states.len()];
        let mut pending = vec![START];
        while let Some(id) = pending.pop() {
            match seen.get_mut(id) {
                Some(flag) if !*flag => *flag = true,
                _ => continue,
            }
            let Some(state) = self.states.get(id) else {
                continue;
            };
            writeln!(formatter, "{id}:")?;
            for &(label, next) in &state.edges {
                match label {
                    Label::Epsilon => writeln!(formatter, "  EPSILON -> {next}")?,
                    Label::Event(event) => writeln!(formatter, "  {} -> {next}", event.describe(&symbols))?,
                    Label::Condition(condition) => match self.conditions.get(condition) {
                        Some(text) => writeln!(formatter, "  {text} -> {next}")?,
                        None => writeln!(formatter, "  ? -> {next}")?,
                    },
                }
            }
            for rule in &state.rules {
                writeln!(formatter, "  rule {}", rule.0)?;
            }
            for rule in &state.pseudo_rules {
                writeln!(formatter, "  pseudo rule {}", rule.0)?;
            }
            pending.extend(state.edges.iter().rev().map(|&(_, next)| next));
        }
        Ok(())
    }
}
