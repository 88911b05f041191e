//! The five-kind symbol table.
//!
//! Names live in five disjoint maps, one per statement kind. A covenant
//! and a basket may share a name; lookups always state which kind the use
//! site wants, which is what keeps `COMPLIANT(X)` from silently accepting
//! a basket named `X`.

use proviso_base::{Interner, Symbol};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::ast::{Program, Stmt};

/// The kind of a declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Define,
    Covenant,
    Basket,
    Condition,
    Event,
}

impl SymbolKind {
    pub fn display(self) -> &'static str {
        match self {
            SymbolKind::Define => "definition",
            SymbolKind::Covenant => "covenant",
            SymbolKind::Basket => "basket",
            SymbolKind::Condition => "condition",
            SymbolKind::Event => "event",
        }
    }
}

/// Five disjoint name→statement-index maps, built in one pre-pass.
#[derive(Debug, Default)]
pub struct SymbolTable {
    defines: FxHashMap<Symbol, usize>,
    covenants: FxHashMap<Symbol, usize>,
    baskets: FxHashMap<Symbol, usize>,
    conditions: FxHashMap<Symbol, usize>,
    events: FxHashMap<Symbol, usize>,
}

/// A duplicate declaration found while building the table.
#[derive(Debug)]
pub struct DuplicateName {
    pub kind: SymbolKind,
    pub name: Symbol,
    pub statement_index: usize,
}

impl SymbolTable {
    /// Builds the table from a program, returning any duplicate
    /// declarations alongside it (first declaration wins).
    pub fn build(program: &Program<'_>) -> (SymbolTable, Vec<DuplicateName>) {
        let mut table = SymbolTable::default();
        let mut duplicates = Vec::new();

        for (index, stmt) in program.statements.iter().enumerate() {
            let (map, kind) = match stmt {
                Stmt::Define(_) => (&mut table.defines, SymbolKind::Define),
                Stmt::Covenant(_) => (&mut table.covenants, SymbolKind::Covenant),
                Stmt::Basket(_) => (&mut table.baskets, SymbolKind::Basket),
                Stmt::Condition(_) => (&mut table.conditions, SymbolKind::Condition),
                Stmt::Event(_) => (&mut table.events, SymbolKind::Event),
                // Prohibitions name a target action, not a new symbol.
                Stmt::Prohibit(_) => continue,
            };
            let name = stmt.name();
            if map.contains_key(&name) {
                duplicates.push(DuplicateName {
                    kind,
                    name,
                    statement_index: index,
                });
            } else {
                map.insert(name, index);
            }
        }

        (table, duplicates)
    }

    /// Looks up a name within one kind.
    pub fn lookup(&self, kind: SymbolKind, name: Symbol) -> Option<usize> {
        match kind {
            SymbolKind::Define => self.defines.get(&name).copied(),
            SymbolKind::Covenant => self.covenants.get(&name).copied(),
            SymbolKind::Basket => self.baskets.get(&name).copied(),
            SymbolKind::Condition => self.conditions.get(&name).copied(),
            SymbolKind::Event => self.events.get(&name).copied(),
        }
    }

    /// Returns the kinds under which a name is declared, in a fixed order.
    pub fn kinds_of(&self, name: Symbol) -> Vec<SymbolKind> {
        let mut kinds = Vec::new();
        for kind in [
            SymbolKind::Define,
            SymbolKind::Covenant,
            SymbolKind::Basket,
            SymbolKind::Condition,
            SymbolKind::Event,
        ] {
            if self.lookup(kind, name).is_some() {
                kinds.push(kind);
            }
        }
        kinds
    }

    /// `true` if the name is declared under any kind.
    pub fn is_declared(&self, name: Symbol) -> bool {
        !self.kinds_of(name).is_empty()
    }

    /// Resolves a string name within a kind without interning.
    pub fn lookup_str(&self, kind: SymbolKind, name: &str, interner: &Interner) -> Option<usize> {
        interner.get(name).and_then(|sym| self.lookup(kind, sym))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena_ctx::AstArena;
    use crate::compile;

    #[test]
    fn names_collide_across_kinds_but_not_within() {
        let arena = AstArena::new();
        let mut interner = Interner::new();
        let program = compile::parse(
            "DEFINE RP AS CumulativeNetIncome\nBASKET RP CAPACITY $10,000,000",
            &arena,
            &mut interner,
        )
        .unwrap();

        let (table, duplicates) = SymbolTable::build(&program);
        assert!(duplicates.is_empty(), "cross-kind reuse is allowed");
        let rp = interner.get("RP").unwrap();
        assert_eq!(table.kinds_of(rp), [SymbolKind::Define, SymbolKind::Basket]);
    }

    #[test]
    fn duplicate_within_kind_is_reported() {
        let arena = AstArena::new();
        let mut interner = Interner::new();
        let program = compile::parse(
            "BASKET Inv CAPACITY $10,000,000\nBASKET Inv CAPACITY $20,000,000",
            &arena,
            &mut interner,
        )
        .unwrap();

        let (table, duplicates) = SymbolTable::build(&program);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].kind, SymbolKind::Basket);
        // First declaration wins.
        let inv = interner.get("Inv").unwrap();
        assert_eq!(table.lookup(SymbolKind::Basket, inv), Some(0));
    }
}
