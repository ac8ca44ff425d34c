//! Interned namespace URIs and local names.

use core::cmp::Ordering;
use lasso::{Key as _, Rodeo, RodeoReader, Spur};

/// An interned name. Symbols compare by interning order, which keeps the
/// automaton construction deterministic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Symbol(Spur);

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.into_usize().cmp(&other.0.into_usize())
    }
}

/// Mutable interner owned by the automaton builder.
#[derive(Debug, Default)]
pub struct SymbolTable {
    rodeo: Rodeo,
}

impl SymbolTable {
    /// Intern `text`, returning its symbol.
    #[inline]
    pub fn intern(&mut self, text: &str) -> Symbol {
        Symbol(self.rodeo.get_or_intern(text))
    }

    /// Look up `text` without interning it.
    #[inline]
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.rodeo.get(text).map(Symbol)
    }

    /// Resolve a symbol back to its text.
    #[inline]
    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.rodeo.resolve(&symbol.0)
    }

    /// Number of interned names.
    #[inline]
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// True when nothing has been interned.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }

    /// A read-only copy that can be shared between threads. Symbols keep
    /// their values because names are re-interned in their original order.
    pub fn snapshot(&self) -> SymbolReader {
        let mut copy = Rodeo::default();
        for (_, text) in self.rodeo.iter() {
            copy.get_or_intern(text);
        }
        SymbolReader {
            reader: copy.into_reader(),
        }
    }
}

/// Read-only symbol lookup, part of every compiled automaton.
#[derive(Debug)]
pub struct SymbolReader {
    reader: RodeoReader,
}

impl SymbolReader {
    /// Look up `text`. `None` means no selector mentions the name.
    #[inline]
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.reader.get(text).map(Symbol)
    }

    /// Resolve a symbol back to its text.
    #[inline]
    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.reader.resolve(&symbol.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_keeps_symbol_values() {
        let mut table = SymbolTable::default();
        let div = table.intern("div");
        let para = table.intern("p");
        assert_eq!(table.intern("div"), div);
        assert!(div < para);

        let reader = table.snapshot();
        assert_eq!(reader.get("p"), Some(para));
        assert_eq!(reader.resolve(div), "div");
        assert_eq!(reader.get("span"), None);
    }
}
