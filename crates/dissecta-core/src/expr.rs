//! Expression node types and handles.
//!
//! An expression is a DAG of [`ExprNode`]s stored in an arena; nodes refer
//! to each other through lightweight [`ExprHandle`] indices. Hash-consing
//! in the arena guarantees that two handles are equal if and only if they
//! denote structurally identical expressions.

use std::fmt;

use smallvec::SmallVec;

/// Unique identifier for a symbol, assigned by the arena's symbol table.
pub type SymbolId = u32;

/// A handle to an expression in the arena.
///
/// A 32-bit index that can be copied freely. Handle equality is structural
/// expression equality thanks to hash-consing.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprHandle(u32);

impl ExprHandle {
    /// Creates a handle from a raw index. Intended for arena use.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this handle.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ExprHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({})", self.0)
    }
}

/// Named functions the engine understands.
///
/// A closed enum rather than an open identifier space: the semantic
/// classifier matches on function families, and a closed enum keeps those
/// matches total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinFn {
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
    /// Tangent.
    Tan,
    /// Natural exponential e^x.
    Exp,
    /// Natural logarithm.
    Ln,
    /// Logarithm base 10.
    Log10,
    /// Square root.
    Sqrt,
    /// Absolute value.
    Abs,
}

impl BuiltinFn {
    /// The conventional display name of the function.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            BuiltinFn::Sin => "sin",
            BuiltinFn::Cos => "cos",
            BuiltinFn::Tan => "tan",
            BuiltinFn::Exp => "exp",
            BuiltinFn::Ln => "ln",
            BuiltinFn::Log10 => "log10",
            BuiltinFn::Sqrt => "sqrt",
            BuiltinFn::Abs => "abs",
        }
    }

    /// Returns true for the sin/cos/tan family.
    #[must_use]
    pub fn is_trig(self) -> bool {
        matches!(self, BuiltinFn::Sin | BuiltinFn::Cos | BuiltinFn::Tan)
    }

    /// Returns true for logarithm functions.
    #[must_use]
    pub fn is_log(self) -> bool {
        matches!(self, BuiltinFn::Ln | BuiltinFn::Log10)
    }
}

/// An expression node stored in the arena.
///
/// `Add`/`Mul` are n-ary with at least two operands; operand order is
/// construction order and is preserved everywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprNode {
    // === Atoms ===
    /// A 64-bit integer literal.
    Integer(i64),

    /// A rational literal (numerator, denominator).
    ///
    /// Invariant: denominator > 0, gcd(num, den) == 1, den != 1.
    Rational(i64, u64),

    /// A symbolic variable.
    Symbol(SymbolId),

    // === Compound expressions ===
    /// Sum: a + b + c + ...
    Add(SmallVec<[ExprHandle; 4]>),

    /// Product: a * b * c * ...
    Mul(SmallVec<[ExprHandle; 4]>),

    /// Power: base^exp.
    Pow {
        /// The base of the power.
        base: ExprHandle,
        /// The exponent.
        exp: ExprHandle,
    },

    /// Negation: -expr.
    Neg(ExprHandle),

    /// Division: numerator / denominator.
    Div {
        /// The numerator.
        num: ExprHandle,
        /// The denominator.
        den: ExprHandle,
    },

    /// A named function application: f(arg1, arg2, ...).
    Call {
        /// The function being applied.
        func: BuiltinFn,
        /// The arguments.
        args: SmallVec<[ExprHandle; 2]>,
    },
}

impl ExprNode {
    /// Returns true if this node has no children.
    #[must_use]
    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            ExprNode::Integer(_) | ExprNode::Rational(_, _) | ExprNode::Symbol(_)
        )
    }

    /// Returns true if this node is a numeric literal.
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, ExprNode::Integer(_) | ExprNode::Rational(_, _))
    }

    /// Returns true if this is the integer one.
    #[must_use]
    pub fn is_one(&self) -> bool {
        matches!(self, ExprNode::Integer(1))
    }

    /// Returns true if this is the integer zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, ExprNode::Integer(0))
    }

    /// Returns the ordered child handles of this node.
    #[must_use]
    pub fn children(&self) -> SmallVec<[ExprHandle; 4]> {
        match self {
            ExprNode::Integer(_) | ExprNode::Rational(_, _) | ExprNode::Symbol(_) => {
                SmallVec::new()
            }
            ExprNode::Add(args) | ExprNode::Mul(args) => args.clone(),
            ExprNode::Pow { base, exp } => smallvec::smallvec![*base, *exp],
            ExprNode::Neg(arg) => smallvec::smallvec![*arg],
            ExprNode::Div { num, den } => smallvec::smallvec![*num, *den],
            ExprNode::Call { args, .. } => args.iter().copied().collect(),
        }
    }
}
