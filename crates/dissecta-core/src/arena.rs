//! Arena allocator for expression storage.
//!
//! All expressions live contiguously in one arena. Hash-consing interns
//! every node, so structural equality of whole subtrees reduces to handle
//! equality.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::expr::{BuiltinFn, ExprHandle, ExprNode, SymbolId};
use crate::rational::Q;

/// The arena holding all expression nodes of one computation.
#[derive(Debug, Default)]
pub struct ExprArena {
    /// Storage for all expression nodes.
    nodes: Vec<ExprNode>,
    /// Interning table: node content to handle.
    intern_map: HashMap<ExprNode, ExprHandle>,
    /// Symbol table: names to IDs.
    symbols: HashMap<String, SymbolId>,
    /// Reverse symbol table for display.
    symbol_names: Vec<String>,
}

impl ExprArena {
    /// Creates a new empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a node, returning its handle.
    ///
    /// An identical node that already exists yields the existing handle.
    pub fn intern(&mut self, node: ExprNode) -> ExprHandle {
        if let Some(&handle) = self.intern_map.get(&node) {
            return handle;
        }

        let index = self.nodes.len();
        assert!(index < u32::MAX as usize, "arena capacity exceeded");

        let handle = ExprHandle::new(index as u32);
        self.nodes.push(node.clone());
        self.intern_map.insert(node, handle);
        handle
    }

    /// Gets the node behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not belong to this arena.
    #[must_use]
    pub fn get(&self, handle: ExprHandle) -> &ExprNode {
        &self.nodes[handle.index() as usize]
    }

    /// Interns a symbol name, returning its ID.
    pub fn intern_symbol(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.symbols.get(name) {
            return id;
        }

        let id = self.symbol_names.len() as SymbolId;
        self.symbols.insert(name.to_string(), id);
        self.symbol_names.push(name.to_string());
        id
    }

    /// Gets the name behind a symbol ID.
    #[must_use]
    pub fn symbol_name(&self, id: SymbolId) -> Option<&str> {
        self.symbol_names.get(id as usize).map(String::as_str)
    }

    /// Returns the number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // === Convenience constructors ===

    /// Creates an integer literal.
    pub fn integer(&mut self, value: i64) -> ExprHandle {
        self.intern(ExprNode::Integer(value))
    }

    /// Creates a rational literal in canonical form.
    ///
    /// Integral values collapse to `Integer` so that equal numbers always
    /// intern to the same node.
    ///
    /// # Panics
    ///
    /// Panics if `den` is zero.
    pub fn rational(&mut self, num: i64, den: i64) -> ExprHandle {
        self.number(Q::new(num, den))
    }

    /// Creates a numeric literal from an exact rational.
    pub fn number(&mut self, q: Q) -> ExprHandle {
        if q.is_integer() {
            self.integer(q.numer())
        } else {
            let den = q.denom().unsigned_abs();
            self.intern(ExprNode::Rational(q.numer(), den))
        }
    }

    /// Creates a symbol expression.
    pub fn symbol(&mut self, name: &str) -> ExprHandle {
        let id = self.intern_symbol(name);
        self.intern(ExprNode::Symbol(id))
    }

    /// The expression handle for an already-interned symbol ID.
    pub fn symbol_handle(&mut self, id: SymbolId) -> ExprHandle {
        self.intern(ExprNode::Symbol(id))
    }

    /// Creates an n-ary sum. A single operand passes through unchanged.
    pub fn add(&mut self, args: impl IntoIterator<Item = ExprHandle>) -> ExprHandle {
        let args: SmallVec<[ExprHandle; 4]> = args.into_iter().collect();
        if args.len() == 1 {
            return args[0];
        }
        self.intern(ExprNode::Add(args))
    }

    /// Creates an n-ary product. A single operand passes through unchanged.
    pub fn mul(&mut self, args: impl IntoIterator<Item = ExprHandle>) -> ExprHandle {
        let args: SmallVec<[ExprHandle; 4]> = args.into_iter().collect();
        if args.len() == 1 {
            return args[0];
        }
        self.intern(ExprNode::Mul(args))
    }

    /// Creates a power expression.
    pub fn pow(&mut self, base: ExprHandle, exp: ExprHandle) -> ExprHandle {
        self.intern(ExprNode::Pow { base, exp })
    }

    /// Creates a negation.
    pub fn neg(&mut self, arg: ExprHandle) -> ExprHandle {
        self.intern(ExprNode::Neg(arg))
    }

    /// Creates a quotient.
    pub fn div(&mut self, num: ExprHandle, den: ExprHandle) -> ExprHandle {
        self.intern(ExprNode::Div { num, den })
    }

    /// Creates a function application.
    pub fn call(
        &mut self,
        func: BuiltinFn,
        args: impl IntoIterator<Item = ExprHandle>,
    ) -> ExprHandle {
        self.intern(ExprNode::Call {
            func,
            args: args.into_iter().collect(),
        })
    }

    /// Creates `exp(arg)`.
    pub fn exp_of(&mut self, arg: ExprHandle) -> ExprHandle {
        self.call(BuiltinFn::Exp, [arg])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_intern_once() {
        let mut arena = ExprArena::new();

        let x = arena.symbol("x");
        let y = arena.symbol("y");
        let x2 = arena.symbol("x");

        assert_eq!(x, x2);
        assert_ne!(x, y);
        assert_eq!(arena.symbol_name(0), Some("x"));
    }

    #[test]
    fn hash_consing_dedupes_subtrees() {
        let mut arena = ExprArena::new();

        let x = arena.symbol("x");
        let one = arena.integer(1);

        let sum1 = arena.add([x, one]);
        let sum2 = arena.add([x, one]);

        assert_eq!(sum1, sum2);
        // x, 1 and (x + 1): exactly three nodes
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn rational_constructor_canonicalizes() {
        let mut arena = ExprArena::new();

        let a = arena.rational(2, 4);
        let b = arena.rational(1, 2);
        assert_eq!(a, b);

        let c = arena.rational(6, 3);
        let two = arena.integer(2);
        assert_eq!(c, two);

        let d = arena.rational(1, -2);
        assert_eq!(arena.get(d), &ExprNode::Rational(-1, 2));
    }

    #[test]
    fn exp_of_builds_call() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let e = arena.exp_of(x);
        assert!(matches!(
            arena.get(e),
            ExprNode::Call {
                func: BuiltinFn::Exp,
                ..
            }
        ));
    }
}
