//! Selector automaton: Thompson construction of an NFA over a selector
//! forest, followed by subset construction of the DFA the matcher walks.
//!
//! The alphabet is element identity (namespace and local name, either may be
//! a wildcard) plus sibling adjacency. Attribute and structural tests are not
//! part of the alphabet; they travel as condition edges that the matcher
//! evaluates against the concrete element.
//!
//! States live in arenas and refer to each other by index.

mod alphabet;
mod conditions;
mod subset;
mod symbols;
mod thompson;

pub use alphabet::{Event, NameTest, NamespaceTest, element_variants};
pub use conditions::{ConditionId, ConditionTable};
pub use subset::{Dfa, DfaState, StateId};
pub use symbols::{Symbol, SymbolReader, SymbolTable};
pub use thompson::{AutomatonBuilder, Label, NfaState};

/// Opaque rule handle carried through the automaton. The cascade decides what
/// it indexes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub u32);
