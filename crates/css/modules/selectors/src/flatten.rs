//! Selector chains: a selector tree flattened in infix order.
//!
//! `div > p::first-line` becomes `[div, >, p, >, ::first-line]`. The trailing
//! entries of the chain decide which element and pseudo-element a rule targets.

use crate::{Condition, Selector};

/// Pseudo-elements that may be written with pseudo-class syntax in CSS2.
const PSEUDO_CLASS_PSEUDO_ELEMENTS: [&str; 4] = ["before", "after", "first-line", "first-letter"];

/// Flattened view over a selector tree.
#[derive(Clone, Debug)]
pub struct SelectorChain<'sel> {
    nodes: Vec<&'sel Selector>,
}

/// Flatten `selector` in infix order.
pub fn selector_chain(selector: &Selector) -> SelectorChain<'_> {
    let mut nodes = Vec::new();
    push_infix(selector, &mut nodes);
    SelectorChain { nodes }
}

fn push_infix<'sel>(selector: &'sel Selector, out: &mut Vec<&'sel Selector>) {
    match selector {
        Selector::Descendant {
            ancestor: left,
            descendant: right,
        }
        | Selector::Child {
            parent: left,
            child: right,
        }
        | Selector::DirectAdjacent {
            previous: left,
            next: right,
        }
        | Selector::GeneralSibling {
            previous: left,
            next: right,
        } => {
            push_infix(left, out);
            out.push(selector);
            push_infix(right, out);
        }
        Selector::Conditional {
            selector: simple, ..
        } => {
            out.push(selector);
            push_infix(simple, out);
        }
        Selector::Negative(simple) => {
            out.push(selector);
            push_infix(simple, out);
        }
        Selector::Element(_) | Selector::PseudoElement(_) => out.push(selector),
    }
}

impl<'sel> SelectorChain<'sel> {
    /// The flattened nodes.
    #[inline]
    pub fn nodes(&self) -> &[&'sel Selector] {
        &self.nodes
    }

    /// Local name of the element the selector ends on, if it names one.
    pub fn element_name(&self) -> Option<&'sel str> {
        let mut position = self.nodes.len().checked_sub(1)?;
        loop {
            match *self.nodes.get(position)? {
                Selector::Element(element) => return element.local_name.as_deref(),
                // Step over the pseudo-element and the child link carrying it.
                Selector::PseudoElement(_) | Selector::Child { .. } => {
                    position = position.checked_sub(1)?;
                }
                _ => return None,
            }
        }
    }

    /// Name of the pseudo-element the selector targets, if any.
    ///
    /// Either a trailing pseudo-element node, or one of the CSS2
    /// pseudo-elements written as a pseudo-class on the last conditional.
    pub fn pseudo_element_name(&self) -> Option<&'sel str> {
        let last = *self.nodes.last()?;
        if let Selector::PseudoElement(name) = last {
            return Some(name.as_str());
        }
        let before_last = self.nodes.len().checked_sub(2)?;
        if let Some(Selector::Conditional { condition, .. }) = self.nodes.get(before_last) {
            let mut names = Vec::new();
            collect_pseudo_classes(condition, &mut names);
            return PSEUDO_CLASS_PSEUDO_ELEMENTS
                .iter()
                .find(|candidate| names.contains(*candidate))
                .copied();
        }
        None
    }
}

/// Collect pseudo-class names reachable through `And` conditions.
fn collect_pseudo_classes<'sel>(condition: &'sel Condition, out: &mut Vec<&'sel str>) {
    match condition {
        Condition::PseudoClass(name) => out.push(name.as_str()),
        Condition::And(first, second) => {
            collect_pseudo_classes(first, out);
            collect_pseudo_classes(second, out);
        }
        _ => {}
    }
}
