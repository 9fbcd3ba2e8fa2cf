//! Structure classification: shape and semantic tags.
//!
//! The classifier is a pure read-only pass over an expression. Shape comes
//! from the outermost operator; semantics come from a recursive profile of
//! the transcendental content found anywhere in the tree. Classification
//! never fails: anything it cannot place degrades to
//! `(Atomic, MixedOrUnknown)`.

use dissecta_core::poly::{const_value, depends_on, Polynomial};
use dissecta_core::{BuiltinFn, ExprArena, ExprHandle, ExprNode, SymbolId};

/// Syntactic top-level operator category of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeTag {
    /// An n-ary addition.
    Sum,
    /// An n-ary multiplication (including a negation prefix).
    Product,
    /// A division, or a product carrying negative-power factors.
    Quotient,
    /// A power, or a named function over a non-trivial argument.
    PowerOrComposition,
    /// A literal, a symbol, or a function of a bare atom.
    Atomic,
}

/// Transcendental-family classification of an expression's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticTag {
    /// Polynomial in the target variable, no transcendental content.
    Polynomial,
    /// Only the sin/cos/tan family (possibly mixed with polynomials).
    Trigonometric,
    /// Contains `constant^(expression in the variable)` forms.
    Exponential,
    /// Contains logarithm applications.
    Logarithmic,
    /// Multiple families, unknown functions, or otherwise unclassifiable.
    MixedOrUnknown,
}

/// What transcendental content appears anywhere in an expression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ContentProfile {
    has_trig: bool,
    has_exponential: bool,
    has_log: bool,
    has_other: bool,
}

impl ContentProfile {
    fn merge(self, other: Self) -> Self {
        Self {
            has_trig: self.has_trig || other.has_trig,
            has_exponential: self.has_exponential || other.has_exponential,
            has_log: self.has_log || other.has_log,
            has_other: self.has_other || other.has_other,
        }
    }

    fn family_count(self) -> usize {
        usize::from(self.has_trig) + usize::from(self.has_exponential) + usize::from(self.has_log)
    }
}

/// Classifies expressions relative to a target variable.
///
/// Borrows the arena read-only; construction of rewritten terms is the
/// decomposition engine's job.
pub struct StructureClassifier<'a> {
    arena: &'a ExprArena,
    variable: SymbolId,
}

impl<'a> StructureClassifier<'a> {
    /// Creates a classifier for the given arena and target variable.
    #[must_use]
    pub fn new(arena: &'a ExprArena, variable: SymbolId) -> Self {
        Self { arena, variable }
    }

    /// Classifies an expression into its shape and semantic tags.
    #[must_use]
    pub fn classify(&self, expr: ExprHandle) -> (ShapeTag, SemanticTag) {
        (self.shape_of(expr), self.semantic_of(expr))
    }

    /// The syntactic top-level shape.
    #[must_use]
    pub fn shape_of(&self, expr: ExprHandle) -> ShapeTag {
        match self.arena.get(expr) {
            ExprNode::Add(_) => ShapeTag::Sum,

            ExprNode::Div { .. } => ShapeTag::Quotient,

            // b^(-n) reads as a quotient 1/b^n
            ExprNode::Pow { exp, .. } if is_negative_constant(self.arena, *exp) => {
                ShapeTag::Quotient
            }

            ExprNode::Pow { .. } => ShapeTag::PowerOrComposition,

            ExprNode::Mul(args) => {
                let has_denominator = args.iter().any(|&f| match self.arena.get(f) {
                    ExprNode::Div { .. } => true,
                    ExprNode::Pow { exp, .. } => is_negative_constant(self.arena, *exp),
                    _ => false,
                });
                if has_denominator {
                    ShapeTag::Quotient
                } else {
                    ShapeTag::Product
                }
            }

            ExprNode::Neg(_) => ShapeTag::Product,

            ExprNode::Call { args, .. } => {
                let trivial = args.len() == 1 && self.arena.get(args[0]).is_atom();
                if trivial {
                    ShapeTag::Atomic
                } else {
                    ShapeTag::PowerOrComposition
                }
            }

            ExprNode::Integer(_) | ExprNode::Rational(_, _) | ExprNode::Symbol(_) => {
                ShapeTag::Atomic
            }
        }
    }

    /// The transcendental-family tag.
    #[must_use]
    pub fn semantic_of(&self, expr: ExprHandle) -> SemanticTag {
        let profile = self.profile(expr);

        if profile.has_other || profile.family_count() > 1 {
            return SemanticTag::MixedOrUnknown;
        }
        if profile.has_trig {
            return SemanticTag::Trigonometric;
        }
        if profile.has_exponential {
            return SemanticTag::Exponential;
        }
        if profile.has_log {
            return SemanticTag::Logarithmic;
        }
        if Polynomial::from_expr(self.arena, expr, self.variable).is_some() {
            return SemanticTag::Polynomial;
        }
        SemanticTag::MixedOrUnknown
    }

    /// Walks the whole tree collecting transcendental content.
    fn profile(&self, expr: ExprHandle) -> ContentProfile {
        let node = self.arena.get(expr);
        let mut profile = match node {
            ExprNode::Call { func, .. } => ContentProfile {
                has_trig: func.is_trig(),
                has_exponential: *func == BuiltinFn::Exp,
                has_log: func.is_log(),
                has_other: matches!(func, BuiltinFn::Sqrt | BuiltinFn::Abs),
            },

            ExprNode::Pow { base, exp } => {
                let base_constant = !depends_on(self.arena, *base, self.variable);
                let exp_varies = depends_on(self.arena, *exp, self.variable);
                ContentProfile {
                    // constant^(expression in the variable) is an exponential
                    has_exponential: base_constant && exp_varies,
                    // variable^(expression in the variable) is neither
                    // polynomial nor any named family
                    has_other: !base_constant && exp_varies,
                    ..ContentProfile::default()
                }
            }

            _ => ContentProfile::default(),
        };

        for child in node.children() {
            profile = profile.merge(self.profile(child));
        }
        profile
    }
}

/// Returns true if `expr` folds to a negative numeric constant.
fn is_negative_constant(arena: &ExprArena, expr: ExprHandle) -> bool {
    const_value(arena, expr).is_some_and(|q| q.signum() < 0)
}
