//! Bump storage for one parse.
//!
//! The expression grammar is deeply recursive and read-mostly after
//! construction, so the parser bump-allocates every [`Expr`] node and
//! argument slice into an [`AstArena`] and threads `&'a` borrows through
//! the tree. One arena backs one parse; drop the arena and the whole
//! program goes with it. There is no per-node freeing and no reference
//! counting.
//!
//! [`AstContext`] is the `Copy` view the parser carries — a handle on the
//! arena with the two allocation shapes the AST needs.
//!
//! ```
//! use proviso_base::Interner;
//! use proviso_language::{compile, AstArena};
//!
//! let arena = AstArena::new();
//! let mut interner = Interner::new();
//! let program = compile::parse("CONDITION NoDefault AS 1 = 1", &arena, &mut interner).unwrap();
//! assert_eq!(program.statements.len(), 1);
//! ```

use bumpalo::Bump;

use crate::ast::Expr;

/// Owns the bump storage backing one parsed [`crate::ast::Program`].
pub struct AstArena {
    bump: Bump,
}

impl AstArena {
    pub fn new() -> Self {
        AstArena { bump: Bump::new() }
    }

    /// The allocation handle the parser threads through statement and
    /// expression parsing.
    pub fn ctx(&self) -> AstContext<'_> {
        AstContext { arena: self }
    }
}

impl Default for AstArena {
    fn default() -> Self {
        Self::new()
    }
}

/// A `Copy` allocation handle over an [`AstArena`].
#[derive(Clone, Copy)]
pub struct AstContext<'a> {
    arena: &'a AstArena,
}

impl<'a> AstContext<'a> {
    /// Allocates an expression node, returning a borrow that lives as
    /// long as the arena.
    pub fn alloc(&self, expr: Expr<'a>) -> &'a Expr<'a> {
        self.arena.bump.alloc(expr)
    }

    /// Allocates a function-call argument slice.
    pub fn alloc_args(&self, args: Vec<&'a Expr<'a>>) -> &'a [&'a Expr<'a>] {
        self.arena.bump.alloc_slice_fill_iter(args)
    }
}
