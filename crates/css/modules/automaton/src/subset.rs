//! Subset construction and the compiled DFA.

use crate::RuleId;
use crate::alphabet::Event;
use crate::conditions::{ConditionId, ConditionTable};
use crate::symbols::SymbolReader;
use crate::thompson::{AutomatonBuilder, Label, START};
use core::fmt::{self, Display, Formatter};
use css_selectors::Condition;
use log::{info, trace};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Index of a DFA state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u32);

impl StateId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One DFA state.
#[derive(Clone, Debug, Default)]
pub struct DfaState {
    events: FxHashMap<Event, StateId>,
    /// Condition edges, ordered by condition id.
    conditions: Vec<(ConditionId, StateId)>,
    rules: Vec<RuleId>,
    pseudo_rules: Vec<RuleId>,
}

impl DfaState {
    /// Target of an event edge.
    #[inline]
    pub fn transition(&self, event: &Event) -> Option<StateId> {
        self.events.get(event).copied()
    }

    /// Candidate condition edges.
    #[inline]
    pub fn conditions(&self) -> &[(ConditionId, StateId)] {
        &self.conditions
    }

    /// Rules accepted in this state for the element itself.
    #[inline]
    pub fn rules(&self) -> &[RuleId] {
        &self.rules
    }

    /// Rules accepted in this state for pseudo-elements of the element.
    #[inline]
    pub fn pseudo_rules(&self) -> &[RuleId] {
        &self.pseudo_rules
    }

    /// Number of event edges.
    #[inline]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

/// The deterministic cascade automaton. Immutable once generated, so it can
/// be shared by any number of matchers.
#[derive(Debug)]
pub struct Dfa {
    states: Vec<DfaState>,
    conditions: ConditionTable,
    symbols: SymbolReader,
}

impl Dfa {
    /// The state matching starts from, for the root and for every element.
    #[inline]
    pub const fn start(&self) -> StateId {
        StateId(0)
    }

    #[inline]
    pub fn state(&self, id: StateId) -> Option<&DfaState> {
        self.states.get(id.index())
    }

    #[inline]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn condition(&self, id: ConditionId) -> Option<&Condition> {
        self.conditions.get(id)
    }

    #[inline]
    pub const fn symbols(&self) -> &SymbolReader {
        &self.symbols
    }

    /// Text dump of every state, in id order.
    pub fn dump(&self) -> String {
        self.to_string()
    }
}

impl Display for Dfa {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        for (index, state) in self.states.iter().enumerate() {
            writeln!(formatter, "{index}:")?;
            let mut events: Vec<(&Event, &StateId)> = state.events.iter().collect();
            events.sort();
            for (event, next) in events {
                writeln!(formatter, "  {} -> {}", event.describe(&self.symbols), next.0)?;
            }
            for &(condition, next) in &state.conditions {
                match self.conditions.get(condition) {
                    Some(text) => writeln!(formatter, "  {text} -> {}", next.0)?,
                    None => writeln!(formatter, "  ? -> {}", next.0)?,
                }
            }
            for rule in &state.rules {
                writeln!(formatter, "  rule {}", rule.0)?;
            }
            for rule in &state.pseudo_rules {
                writeln!(formatter, "  pseudo rule {}", rule.0)?;
            }
        }
        Ok(())
    }
}

/// Epsilon closure of `seeds`, as a sorted set of NFA state ids.
fn closure(builder: &AutomatonBuilder, seeds: &[usize]) -> Vec<usize> {
    let mut seen = vec![false; builder.states.len()];
    let mut pending: Vec<usize> = seeds.to_vec();
    let mut set = Vec::new();
    while let Some(id) = pending.pop() {
        match seen.get_mut(id) {
            Some(flag) if !*flag => *flag = true,
            _ => continue,
        }
        set.push(id);
        if let Some(state) = builder.states.get(id) {
            for &(label, next) in &state.edges {
                if label == Label::Epsilon {
                    pending.push(next);
                }
            }
        }
    }
    set.sort_unstable();
    set
}

/// DFA states under construction, memoized by NFA state set.
struct Subsets<'build> {
    builder: &'build AutomatonBuilder,
    states: Vec<DfaState>,
    memo: FxHashMap<Vec<usize>, StateId>,
    pending: Vec<(StateId, Vec<usize>)>,
}

impl Subsets<'_> {
    /// DFA state for an NFA state set, creating it with the rules of its
    /// members on first sight.
    fn state_for(&mut self, set: Vec<usize>) -> StateId {
        if let Some(&id) = self.memo.get(&set) {
            return id;
        }
        let id = StateId(u32::try_from(self.states.len()).unwrap_or(u32::MAX));
        let mut state = DfaState::default();
        for member in &set {
            if let Some(nfa) = self.builder.states.get(*member) {
                state.rules.extend_from_slice(&nfa.rules);
                state.pseudo_rules.extend_from_slice(&nfa.pseudo_rules);
            }
        }
        self.states.push(state);
        self.memo.insert(set.clone(), id);
        self.pending.push((id, set));
        id
    }

    fn expand(&mut self, id: StateId, set: &[usize]) {
        let mut by_event: BTreeMap<Event, Vec<usize>> = BTreeMap::new();
        let mut by_condition: BTreeMap<ConditionId, Vec<usize>> = BTreeMap::new();
        for member in set {
            let Some(nfa) = self.builder.states.get(*member) else {
                continue;
            };
            for &(label, next) in &nfa.edges {
                match label {
                    Label::Epsilon => {}
                    Label::Event(event) => by_event.entry(event).or_default().push(next),
                    Label::Condition(condition) => by_condition.entry(condition).or_default().push(next),
                }
            }
        }
        for (event, targets) in by_event {
            let target = self.state_for(closure(self.builder, &targets));
            if let Some(state) = self.states.get_mut(id.index()) {
                state.events.insert(event, target);
            }
        }
        for (condition, targets) in by_condition {
            let target = self.state_for(closure(self.builder, &targets));
            if let Some(state) = self.states.get_mut(id.index()) {
                state.conditions.push((condition, target));
            }
        }
    }
}

impl AutomatonBuilder {
    /// Run subset construction over the current NFA.
    ///
    /// The NFA is left untouched, so generating twice without adding rules
    /// yields equivalent automata.
    pub fn generate_dfa(&self) -> Dfa {
        let mut subsets = Subsets {
            builder: self,
            states: Vec::new(),
            memo: FxHashMap::default(),
            pending: Vec::new(),
        };
        subsets.state_for(closure(self, &[START]));
        while let Some((id, set)) = subsets.pending.pop() {
            subsets.expand(id, &set);
        }

        let dfa = Dfa {
            states: subsets.states,
            conditions: self.conditions.clone(),
            symbols: self.symbols.snapshot(),
        };
        info!(
            "Generated DFA with {} states from {} NFA states",
            dfa.state_count(),
            self.state_count()
        );
        if self.trace {
            trace!("NFA START\n{}NFA END", self.dump());
            trace!("DFA START\n{}DFA END", dfa.dump());
        }
        dfa
    }
}
