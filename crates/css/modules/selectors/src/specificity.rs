//! CSS selector specificity calculation.
//! See <https://www.w3.org/TR/CSS2/cascade.html#specificity>

use crate::{Condition, Selector};

/// Specificity triple (ids, attributes/classes/pseudo-classes, type names).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity(pub u16, pub u16, pub u16);

impl Specificity {
    /// Fold the triple into the single ordinal used by the cascade:
    /// `10000 × ids + 100 × attributes + names`.
    #[inline]
    pub fn value(self) -> i32 {
        10_000i32
            .saturating_mul(i32::from(self.0))
            .saturating_add(100i32.saturating_mul(i32::from(self.1)))
            .saturating_add(i32::from(self.2))
    }
}

/// Compute the specificity of a whole selector tree.
pub fn specificity_of(selector: &Selector) -> Specificity {
    let mut total = Specificity::default();
    accumulate_selector(selector, &mut total);
    total
}

/// Walk a selector node, adding its contribution to `total`.
fn accumulate_selector(selector: &Selector, total: &mut Specificity) {
    match selector {
        Selector::Conditional {
            selector: simple,
            condition,
        } => {
            accumulate_condition(condition, total);
            accumulate_selector(simple, total);
        }
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
            accumulate_selector(left, total);
            accumulate_selector(right, total);
        }
        Selector::Negative(simple) => accumulate_selector(simple, total),
        Selector::Element(element) => {
            // There is no name for "*".
            if element.local_name.is_some() {
                total.2 = total.2.saturating_add(1);
            }
        }
        Selector::PseudoElement(_) => {}
    }
}

/// Walk a condition, adding its contribution to `total`.
fn accumulate_condition(condition: &Condition, total: &mut Specificity) {
    match condition {
        Condition::Id(_) => {
            total.0 = total.0.saturating_add(1);
        }
        Condition::Class(_)
        | Condition::Attribute(_)
        | Condition::OneOfAttribute(_)
        | Condition::BeginHyphenAttribute(_)
        | Condition::Lang(_)
        | Condition::PseudoClass(_)
        | Condition::Positional { .. } => {
            total.1 = total.1.saturating_add(1);
        }
        Condition::And(first, second) | Condition::Or(first, second) => {
            accumulate_condition(first, total);
            accumulate_condition(second, total);
        }
        Condition::Negation(_) | Condition::Unsupported(_) => {}
    }
}
