#![cfg(test)]

use core::error::Error;
use css_automaton::{AutomatonBuilder, Dfa, DfaState, Event, NameTest, NamespaceTest, RuleId, StateId};
use css_selectors::{NamespacePrefixes, Selector, parse_selector};

fn selector(text: &str) -> Result<Selector, Box<dyn Error>> {
    Ok(parse_selector(text, &NamespacePrefixes::default())?)
}

/// Build a DFA from `(selector, rule)` pairs, all element rules.
///
/// # Errors
/// Returns an error if a selector does not parse.
fn build(rules: &[(&str, u32)]) -> Result<Dfa, Box<dyn Error>> {
    let mut builder = AutomatonBuilder::default();
    for &(text, rule) in rules {
        builder.add_rule(&selector(text)?, &[RuleId(rule)], false);
    }
    Ok(builder.generate_dfa())
}

/// The `*|name` event.
fn named(dfa: &Dfa, name: &str) -> Result<Event, Box<dyn Error>> {
    let symbol = dfa.symbols().get(name).ok_or("name was never interned")?;
    Ok(Event::Element {
        namespace: NamespaceTest::Any,
        local_name: NameTest::Name(symbol),
    })
}

fn state(dfa: &Dfa, id: StateId) -> Result<&DfaState, Box<dyn Error>> {
    Ok(dfa.state(id).ok_or("dangling state id")?)
}

fn step(dfa: &Dfa, from: StateId, event: &Event) -> Result<StateId, Box<dyn Error>> {
    Ok(state(dfa, from)?.transition(event).ok_or("missing transition")?)
}

/// Descendant selectors reach the same accepting state at any depth.
///
/// # Errors
/// Returns an error if the automaton lacks an expected transition.
#[test]
fn descendant_accepts_at_any_depth() -> Result<(), Box<dyn Error>> {
    let dfa = build(&[("div p", 0)])?;
    let div = named(&dfa, "div")?;
    let para = named(&dfa, "p")?;

    let in_div = step(&dfa, dfa.start(), &div)?;
    let child = step(&dfa, in_div, &para)?;
    assert_eq!(state(&dfa, child)?.rules(), &[RuleId(0)]);

    let nested = step(&dfa, in_div, &Event::ANY_ELEMENT)?;
    assert_eq!(step(&dfa, nested, &Event::ANY_ELEMENT)?, nested);
    assert_eq!(step(&dfa, nested, &para)?, child);
    Ok(())
}

/// Sibling selectors go through a SIBLING edge.
///
/// # Errors
/// Returns an error if the automaton lacks an expected transition.
#[test]
fn adjacent_sibling_uses_the_sibling_event() -> Result<(), Box<dyn Error>> {
    let dfa = build(&[("h1 + p", 7)])?;
    let heading = step(&dfa, dfa.start(), &named(&dfa, "h1")?)?;
    let after = step(&dfa, heading, &Event::Sibling)?;
    let para = step(&dfa, after, &named(&dfa, "p")?)?;
    assert_eq!(state(&dfa, para)?.rules(), &[RuleId(7)]);
    assert!(state(&dfa, heading)?.rules().is_empty());
    Ok(())
}

/// Conditions are candidate edges, not alphabet symbols.
///
/// # Errors
/// Returns an error if the automaton lacks an expected transition.
#[test]
fn conditions_become_candidate_edges() -> Result<(), Box<dyn Error>> {
    let dfa = build(&[("p", 0), ("p.x", 1)])?;
    let para = step(&dfa, dfa.start(), &named(&dfa, "p")?)?;
    let para_state = state(&dfa, para)?;
    assert_eq!(para_state.rules(), &[RuleId(0)]);
    assert_eq!(para_state.conditions().len(), 1);

    let (condition, target) = para_state.conditions()[0];
    assert_eq!(dfa.condition(condition).map(ToString::to_string).as_deref(), Some(".x"));
    assert_eq!(state(&dfa, target)?.rules(), &[RuleId(1)]);
    Ok(())
}

/// Pseudo-element rules are kept apart from element rules.
///
/// # Errors
/// Returns an error if the automaton lacks an expected transition.
#[test]
fn pseudo_rules_are_partitioned() -> Result<(), Box<dyn Error>> {
    let mut builder = AutomatonBuilder::default();
    builder.add_rule(&selector("p")?, &[RuleId(0)], false);
    builder.add_rule(&selector("p::first-line")?, &[RuleId(1), RuleId(2)], true);
    let dfa = builder.generate_dfa();

    let para = state(&dfa, step(&dfa, dfa.start(), &named(&dfa, "p")?)?)?;
    assert_eq!(para.rules(), &[RuleId(0)]);
    assert_eq!(para.pseudo_rules(), &[RuleId(1), RuleId(2)]);
    Ok(())
}

/// Selectors outside CSS2 produce no fragment.
///
/// # Errors
/// Returns an error if a selector does not parse.
#[test]
fn unsupported_selectors_are_unreachable() -> Result<(), Box<dyn Error>> {
    let mut builder = AutomatonBuilder::default();
    assert!(!builder.add_rule(&selector("h1 ~ p")?, &[RuleId(0)], false));
    let dfa = builder.generate_dfa();
    assert_eq!(dfa.state_count(), 1);
    assert!(state(&dfa, dfa.start())?.rules().is_empty());
    assert_eq!(state(&dfa, dfa.start())?.event_count(), 0);
    Ok(())
}

/// Adding rules between generations gives the same automaton as adding them
/// all up front, and regenerating is idempotent.
///
/// # Errors
/// Returns an error if a selector does not parse.
#[test]
fn incremental_generation_matches_batch() -> Result<(), Box<dyn Error>> {
    let texts = ["div p", "h1 + p", "ul > li.x", "*", "p:first-child"];

    let mut incremental = AutomatonBuilder::default();
    let mut batch = AutomatonBuilder::default();
    for (index, text) in texts.iter().enumerate() {
        let rule = RuleId(u32::try_from(index)?);
        incremental.add_rule(&selector(text)?, &[rule], false);
        let _ = incremental.generate_dfa();
        batch.add_rule(&selector(text)?, &[rule], false);
    }

    let first = batch.generate_dfa();
    let second = batch.generate_dfa();
    assert_eq!(first.dump(), second.dump());
    assert_eq!(incremental.generate_dfa().dump(), first.dump());
    assert_eq!(incremental.dump(), batch.dump());
    Ok(())
}

/// The universal selector shares the any-element symbol.
///
/// # Errors
/// Returns an error if the automaton lacks an expected transition.
#[test]
fn universal_selector_uses_any_element() -> Result<(), Box<dyn Error>> {
    let dfa = build(&[("*", 3)])?;
    let any = step(&dfa, dfa.start(), &Event::ANY_ELEMENT)?;
    assert_eq!(state(&dfa, any)?.rules(), &[RuleId(3)]);
    Ok(())
}

/// Tracing builders dump both automata; the dumps name events and rules.
///
/// # Errors
/// Returns an error if a selector does not parse.
#[test]
fn traced_generation_dumps_both_automata() -> Result<(), Box<dyn Error>> {
    if env_logger::builder().is_test(true).try_init().is_err() {
        log::debug!("test logger already installed");
    }
    let mut builder = AutomatonBuilder::new(true);
    builder.add_rule(&selector("h1 + p.lead")?, &[RuleId(4)], false);
    let nfa = builder.dump();
    assert!(nfa.contains("SIBLING"));
    assert!(nfa.contains(".lead"));
    let dfa = builder.generate_dfa().dump();
    assert!(dfa.contains("*|h1"));
    assert!(dfa.contains("rule 4"));
    Ok(())
}
