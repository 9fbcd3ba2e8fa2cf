//! Typed leaf representations.
//!
//! Once decomposition has produced a leaf [`Component`], downstream code
//! wants a representation specialized to that leaf's family: exact
//! coefficients and roots for polynomials, base and rate for
//! exponentials, numeric evaluation for everything else. The dispatch
//! from [`SemanticTag`] to variant is total; nothing here can fail.

use hashbrown::HashMap;
use num_traits::Zero;

use dissecta_core::eval::eval_f64;
use dissecta_core::poly::{affine_in, depends_on, Polynomial};
use dissecta_core::{BuiltinFn, ExprArena, ExprHandle, ExprNode, Q, SymbolId};

use crate::classifier::SemanticTag;
use crate::decompose::Component;

/// A leaf component resolved to its family-specific representation.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedComponent {
    /// A polynomial with exact coefficients.
    Polynomial(PolynomialLeaf),
    /// A sin/cos/tan term.
    Trigonometric(TrigLeaf),
    /// An exponential term.
    Exponential(ExponentialLeaf),
    /// A logarithmic term.
    Logarithmic(LogLeaf),
    /// Anything else; supports numeric evaluation only.
    Generic(GenericLeaf),
}

impl TypedComponent {
    /// Resolves a component to its typed representation.
    ///
    /// Total over [`SemanticTag`]: every tag has a defined target, and
    /// `MixedOrUnknown` maps to the generic fallback. A tag whose
    /// family-specific data cannot be recovered (which would indicate a
    /// classifier defect, not bad input) also falls back to generic.
    #[must_use]
    pub fn from_leaf(arena: &ExprArena, component: &Component, variable: SymbolId) -> Self {
        let term = component.term;
        match component.semantic {
            SemanticTag::Polynomial => match Polynomial::from_expr(arena, term, variable) {
                Some(poly) => TypedComponent::Polynomial(PolynomialLeaf {
                    term,
                    variable,
                    poly,
                }),
                None => TypedComponent::Generic(GenericLeaf { term, variable }),
            },

            SemanticTag::Trigonometric => TypedComponent::Trigonometric(TrigLeaf {
                term,
                variable,
                functions: collect_functions(arena, term, BuiltinFn::is_trig),
            }),

            SemanticTag::Exponential => TypedComponent::Exponential(ExponentialLeaf {
                term,
                variable,
                rate: exponential_rate(arena, term, variable),
            }),

            SemanticTag::Logarithmic => TypedComponent::Logarithmic(LogLeaf {
                term,
                variable,
                functions: collect_functions(arena, term, BuiltinFn::is_log),
            }),

            SemanticTag::MixedOrUnknown => TypedComponent::Generic(GenericLeaf { term, variable }),
        }
    }

    /// The underlying term, whatever the variant.
    #[must_use]
    pub fn term(&self) -> ExprHandle {
        match self {
            TypedComponent::Polynomial(leaf) => leaf.term,
            TypedComponent::Trigonometric(leaf) => leaf.term,
            TypedComponent::Exponential(leaf) => leaf.term,
            TypedComponent::Logarithmic(leaf) => leaf.term,
            TypedComponent::Generic(leaf) => leaf.term,
        }
    }

    /// Numeric evaluation at a point; available for every variant.
    #[must_use]
    pub fn eval(&self, arena: &ExprArena, x: f64) -> Option<f64> {
        let (term, variable) = match self {
            TypedComponent::Polynomial(leaf) => (leaf.term, leaf.variable),
            TypedComponent::Trigonometric(leaf) => (leaf.term, leaf.variable),
            TypedComponent::Exponential(leaf) => (leaf.term, leaf.variable),
            TypedComponent::Logarithmic(leaf) => (leaf.term, leaf.variable),
            TypedComponent::Generic(leaf) => (leaf.term, leaf.variable),
        };
        eval_at(arena, term, variable, x)
    }
}

/// A polynomial leaf with exact coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialLeaf {
    /// The original term.
    pub term: ExprHandle,
    /// The target variable.
    pub variable: SymbolId,
    /// The extracted polynomial.
    pub poly: Polynomial,
}

impl PolynomialLeaf {
    /// The polynomial degree.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.poly.degree()
    }

    /// The rational roots, exact, for degree at most 2.
    ///
    /// `None` means "not computed" (degree too high, or coefficients too
    /// large for exact arithmetic); an empty vec means "no rational
    /// roots".
    #[must_use]
    pub fn rational_roots(&self) -> Option<Vec<Q>> {
        let p = &self.poly;
        match p.degree() {
            0 => Some(Vec::new()),

            1 => {
                // ax + b = 0
                let a = p.coeff(1);
                let b = p.coeff(0);
                let inv = a.recip()?;
                Some(vec![b.checked_mul(inv)?.checked_neg()?])
            }

            2 => {
                // ax^2 + bx + c = 0; rational roots need a rational
                // square discriminant
                let a = p.coeff(2);
                let b = p.coeff(1);
                let c = p.coeff(0);
                let four_ac = Q::from_integer(4).checked_mul(a)?.checked_mul(c)?;
                let disc = b.checked_mul(b)?.checked_sub(four_ac)?;
                if disc.signum() < 0 {
                    return Some(Vec::new());
                }
                let Some(root) = disc.sqrt() else {
                    return Some(Vec::new());
                };
                let two_a = a.checked_add(a)?.recip()?;
                let neg_b = b.checked_neg()?;
                let r1 = neg_b.checked_add(root)?.checked_mul(two_a)?;
                let r2 = neg_b.checked_sub(root)?.checked_mul(two_a)?;
                if r1 == r2 {
                    Some(vec![r1])
                } else {
                    Some(vec![r1, r2])
                }
            }

            _ => None,
        }
    }

    /// Evaluates the polynomial at a point.
    #[must_use]
    pub fn eval(&self, x: f64) -> f64 {
        self.poly
            .coeffs()
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * x + c.to_f64())
    }
}

/// A trigonometric leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrigLeaf {
    /// The original term.
    pub term: ExprHandle,
    /// The target variable.
    pub variable: SymbolId,
    /// The trig functions occurring in the term, in discovery order.
    pub functions: Vec<BuiltinFn>,
}

/// An exponential leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExponentialLeaf {
    /// The original term.
    pub term: ExprHandle,
    /// The target variable.
    pub variable: SymbolId,
    /// The exact rate `k` when the term is `c * base^(k*x)`; `None` for
    /// more general exponential content.
    pub rate: Option<Q>,
}

/// A logarithmic leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLeaf {
    /// The original term.
    pub term: ExprHandle,
    /// The target variable.
    pub variable: SymbolId,
    /// The log functions occurring in the term, in discovery order.
    pub functions: Vec<BuiltinFn>,
}

/// The generic fallback leaf. Numeric evaluation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericLeaf {
    /// The original term.
    pub term: ExprHandle,
    /// The target variable.
    pub variable: SymbolId,
}

impl GenericLeaf {
    /// Evaluates the term at a point.
    #[must_use]
    pub fn eval(&self, arena: &ExprArena, x: f64) -> Option<f64> {
        eval_at(arena, self.term, self.variable, x)
    }
}

fn eval_at(arena: &ExprArena, term: ExprHandle, variable: SymbolId, x: f64) -> Option<f64> {
    let mut bindings = HashMap::new();
    bindings.insert(variable, x);
    eval_f64(arena, term, &bindings)
}

/// Collects builtin functions matching `pred`, left to right, first
/// occurrence only.
fn collect_functions(
    arena: &ExprArena,
    expr: ExprHandle,
    pred: fn(BuiltinFn) -> bool,
) -> Vec<BuiltinFn> {
    fn walk(arena: &ExprArena, expr: ExprHandle, pred: fn(BuiltinFn) -> bool, out: &mut Vec<BuiltinFn>) {
        let node = arena.get(expr);
        if let ExprNode::Call { func, .. } = node {
            if pred(*func) && !out.contains(func) {
                out.push(*func);
            }
        }
        for child in node.children() {
            walk(arena, child, pred, out);
        }
    }

    let mut out = Vec::new();
    walk(arena, expr, pred, &mut out);
    out
}

/// Recovers the rate `k` from a term of shape `c * base^(k*x)`.
fn exponential_rate(arena: &ExprArena, expr: ExprHandle, variable: SymbolId) -> Option<Q> {
    match arena.get(expr) {
        ExprNode::Call {
            func: BuiltinFn::Exp,
            args,
        } if args.len() == 1 => pure_rate(arena, args[0], variable),

        ExprNode::Pow { base, exp } if !depends_on(arena, *base, variable) => {
            pure_rate(arena, *exp, variable)
        }

        ExprNode::Neg(inner) => exponential_rate(arena, *inner, variable),

        ExprNode::Mul(args) => {
            let mut rate = None;
            for &factor in args {
                if depends_on(arena, factor, variable) {
                    if rate.is_some() {
                        return None;
                    }
                    rate = exponential_rate(arena, factor, variable);
                    rate?;
                }
            }
            rate
        }

        _ => None,
    }
}

fn pure_rate(arena: &ExprArena, exponent: ExprHandle, variable: SymbolId) -> Option<Q> {
    let (k, m) = affine_in(arena, exponent, variable)?;
    if !m.is_zero() || k.is_zero() {
        return None;
    }
    Some(k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{SemanticTag, ShapeTag};

    fn leaf(term: ExprHandle, semantic: SemanticTag) -> Component {
        Component {
            term,
            shape: ShapeTag::Atomic,
            semantic,
            children: Vec::new(),
        }
    }

    #[test]
    fn polynomial_leaf_has_exact_roots() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");
        // x^2 - 3x + 2 has roots 1 and 2
        let two = arena.integer(2);
        let three = arena.integer(3);
        let x2 = arena.pow(x, two);
        let three_x = arena.mul([three, x]);
        let neg = arena.neg(three_x);
        let expr = arena.add([x2, neg, two]);

        let typed = TypedComponent::from_leaf(&arena, &leaf(expr, SemanticTag::Polynomial), var);
        let TypedComponent::Polynomial(p) = typed else {
            panic!("expected polynomial leaf");
        };
        assert_eq!(p.degree(), 2);
        let mut roots = p.rational_roots().unwrap();
        roots.sort();
        assert_eq!(roots, vec![Q::from_integer(1), Q::from_integer(2)]);
        assert!((p.eval(3.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn irrational_roots_come_back_empty() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");
        // x^2 - 2 has no rational roots
        let two = arena.integer(2);
        let x2 = arena.pow(x, two);
        let neg_two = arena.integer(-2);
        let expr = arena.add([x2, neg_two]);

        let typed = TypedComponent::from_leaf(&arena, &leaf(expr, SemanticTag::Polynomial), var);
        let TypedComponent::Polynomial(p) = typed else {
            panic!("expected polynomial leaf");
        };
        assert_eq!(p.rational_roots(), Some(Vec::new()));
    }

    #[test]
    fn oversized_coefficients_leave_roots_uncomputed() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");

        // discriminant of x^2 + (i64::MAX)x + 1 cannot be computed exactly
        let leaf = PolynomialLeaf {
            term: x,
            variable: var,
            poly: Polynomial::new(vec![
                Q::from_integer(1),
                Q::from_integer(i64::MAX),
                Q::from_integer(1),
            ]),
        };
        assert_eq!(leaf.rational_roots(), None);
    }

    #[test]
    fn exponential_leaf_recovers_the_rate() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");
        // 3 * e^(-2x)
        let three = arena.integer(3);
        let neg_two = arena.integer(-2);
        let kx = arena.mul([neg_two, x]);
        let e = arena.exp_of(kx);
        let expr = arena.mul([three, e]);

        let typed = TypedComponent::from_leaf(&arena, &leaf(expr, SemanticTag::Exponential), var);
        let TypedComponent::Exponential(leaf) = typed else {
            panic!("expected exponential leaf");
        };
        assert_eq!(leaf.rate, Some(Q::from_integer(-2)));
    }

    #[test]
    fn shifted_exponent_has_no_pure_rate() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");
        let one = arena.integer(1);
        let x_plus_1 = arena.add([x, one]);
        let e = arena.exp_of(x_plus_1);

        let typed = TypedComponent::from_leaf(&arena, &leaf(e, SemanticTag::Exponential), var);
        let TypedComponent::Exponential(leaf) = typed else {
            panic!("expected exponential leaf");
        };
        assert_eq!(leaf.rate, None);
    }

    #[test]
    fn mixed_maps_to_generic() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");
        let sin = arena.call(BuiltinFn::Sin, [x]);
        let e = arena.exp_of(x);
        let expr = arena.add([sin, e]);

        let typed = TypedComponent::from_leaf(&arena, &leaf(expr, SemanticTag::MixedOrUnknown), var);
        let TypedComponent::Generic(g) = typed else {
            panic!("expected generic leaf");
        };
        let value = g.eval(&arena, 0.0).unwrap();
        assert!((value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn trig_leaf_lists_its_functions() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");
        let sin = arena.call(BuiltinFn::Sin, [x]);
        let cos = arena.call(BuiltinFn::Cos, [x]);
        let expr = arena.add([sin, cos]);

        let typed = TypedComponent::from_leaf(&arena, &leaf(expr, SemanticTag::Trigonometric), var);
        let TypedComponent::Trigonometric(t) = typed else {
            panic!("expected trig leaf");
        };
        assert_eq!(t.functions, vec![BuiltinFn::Sin, BuiltinFn::Cos]);
    }
}
