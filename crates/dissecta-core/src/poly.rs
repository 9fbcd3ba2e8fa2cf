//! Polynomial and affine introspection over expressions.
//!
//! The structure engine needs exact answers to a small set of questions:
//! is this expression polynomial in the target variable, what is its
//! degree, what are its coefficients, and is a subexpression of the affine
//! form `k*x + m`. Everything here answers those questions over the arena
//! without mutating it.

use num_traits::{One, Zero};

use crate::arena::ExprArena;
use crate::expr::{ExprHandle, ExprNode, SymbolId};
use crate::rational::Q;

/// A dense univariate polynomial over exact rationals.
///
/// Coefficients are stored in ascending degree order, with trailing zeros
/// stripped.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Polynomial {
    coeffs: Vec<Q>,
}

impl Polynomial {
    /// Creates a polynomial from coefficients in ascending degree order.
    #[must_use]
    pub fn new(mut coeffs: Vec<Q>) -> Self {
        while coeffs.len() > 1 && coeffs.last().is_some_and(|c| c.is_zero()) {
            coeffs.pop();
        }
        if coeffs.is_empty() {
            coeffs.push(Q::zero());
        }
        Self { coeffs }
    }

    /// The zero polynomial.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(vec![Q::zero()])
    }

    /// A constant polynomial.
    #[must_use]
    pub fn constant(c: Q) -> Self {
        Self::new(vec![c])
    }

    /// The polynomial `x`.
    #[must_use]
    pub fn x() -> Self {
        Self::new(vec![Q::zero(), Q::one()])
    }

    /// The degree (zero polynomial reports degree 0).
    #[must_use]
    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    /// Returns true for the zero polynomial.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs[0].is_zero()
    }

    /// The coefficient of `x^i` (zero beyond the degree).
    #[must_use]
    pub fn coeff(&self, i: usize) -> Q {
        self.coeffs.get(i).copied().unwrap_or_else(Q::zero)
    }

    /// All coefficients in ascending degree order.
    #[must_use]
    pub fn coeffs(&self) -> &[Q] {
        &self.coeffs
    }

    /// Evaluates at a point using Horner's method.
    #[must_use]
    pub fn eval(&self, x: Q) -> Q {
        let mut result = Q::zero();
        for &c in self.coeffs.iter().rev() {
            result = result * x + c;
        }
        result
    }

    /// Adds two polynomials.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        let n = self.coeffs.len().max(other.coeffs.len());
        let coeffs = (0..n).map(|i| self.coeff(i) + other.coeff(i)).collect();
        Self::new(coeffs)
    }

    /// Multiplies two polynomials (schoolbook; degrees here stay small).
    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        let mut coeffs = vec![Q::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] = coeffs[i + j] + a * b;
            }
        }
        Self::new(coeffs)
    }

    /// Negates the polynomial.
    #[must_use]
    pub fn neg(&self) -> Self {
        Self::new(self.coeffs.iter().map(|&c| -c).collect())
    }

    /// Scales by a rational.
    #[must_use]
    pub fn scale(&self, s: Q) -> Self {
        Self::new(self.coeffs.iter().map(|&c| c * s).collect())
    }

    /// Raises to a nonnegative integer power.
    #[must_use]
    pub fn powi(&self, exp: usize) -> Self {
        let mut result = Self::constant(Q::one());
        for _ in 0..exp {
            result = result.mul(self);
        }
        result
    }

    /// Overflow-aware addition; `None` when a coefficient leaves i64
    /// range.
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        let n = self.coeffs.len().max(other.coeffs.len());
        let mut coeffs = Vec::with_capacity(n);
        for i in 0..n {
            coeffs.push(self.coeff(i).checked_add(other.coeff(i))?);
        }
        Some(Self::new(coeffs))
    }

    /// Overflow-aware multiplication.
    #[must_use]
    pub fn checked_mul(&self, other: &Self) -> Option<Self> {
        if self.is_zero() || other.is_zero() {
            return Some(Self::zero());
        }
        let mut coeffs = vec![Q::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] = coeffs[i + j].checked_add(a.checked_mul(b)?)?;
            }
        }
        Some(Self::new(coeffs))
    }

    /// Overflow-aware scaling.
    #[must_use]
    pub fn checked_scale(&self, s: Q) -> Option<Self> {
        let coeffs: Option<Vec<Q>> = self.coeffs.iter().map(|&c| c.checked_mul(s)).collect();
        Some(Self::new(coeffs?))
    }

    /// Overflow-aware power.
    #[must_use]
    pub fn checked_powi(&self, exp: usize) -> Option<Self> {
        let mut result = Self::constant(Q::one());
        for _ in 0..exp {
            result = result.checked_mul(self)?;
        }
        Some(result)
    }

    /// Extracts a polynomial in `var` from an expression, if it is one.
    ///
    /// Foreign symbols make the answer `None`: degrees and coefficients are
    /// only meaningful when every scalar is an actual number. Coefficients
    /// past i64 range and exponents past the expansion cap also yield
    /// `None`, so callers degrade instead of panicking.
    #[must_use]
    pub fn from_expr(arena: &ExprArena, expr: ExprHandle, var: SymbolId) -> Option<Self> {
        match arena.get(expr) {
            ExprNode::Integer(n) => Some(Self::constant(Q::from_integer(*n))),

            #[allow(clippy::cast_possible_wrap)]
            ExprNode::Rational(num, den) => Some(Self::constant(Q::new(*num, *den as i64))),

            ExprNode::Symbol(id) if *id == var => Some(Self::x()),

            ExprNode::Symbol(_) => None,

            ExprNode::Add(args) => {
                let mut sum = Self::zero();
                for &arg in args {
                    sum = sum.checked_add(&Self::from_expr(arena, arg, var)?)?;
                }
                Some(sum)
            }

            ExprNode::Mul(args) => {
                let mut product = Self::constant(Q::one());
                for &arg in args {
                    product = product.checked_mul(&Self::from_expr(arena, arg, var)?)?;
                }
                Some(product)
            }

            ExprNode::Pow { base, exp } => {
                let e = const_value(arena, *exp)?;
                if !e.is_integer() {
                    return None;
                }
                let degree = usize::try_from(e.numer()).ok()?;
                if degree > MAX_EXPANSION_DEGREE {
                    return None;
                }
                Self::from_expr(arena, *base, var)?.checked_powi(degree)
            }

            ExprNode::Neg(arg) => {
                Self::from_expr(arena, *arg, var)?.checked_scale(Q::from_integer(-1))
            }

            ExprNode::Div { num, den } => {
                let d = const_value(arena, *den)?;
                let inv = d.recip()?;
                Self::from_expr(arena, *num, var)?.checked_scale(inv)
            }

            ExprNode::Call { .. } => None,
        }
    }
}

/// Largest exponent `from_expr` will expand; anything past this would
/// exhaust memory before the coefficients overflow.
const MAX_EXPANSION_DEGREE: usize = 512;

/// Returns true if `expr` has a free occurrence of `var`.
#[must_use]
pub fn depends_on(arena: &ExprArena, expr: ExprHandle, var: SymbolId) -> bool {
    match arena.get(expr) {
        ExprNode::Symbol(id) => *id == var,
        ExprNode::Integer(_) | ExprNode::Rational(_, _) => false,
        ExprNode::Add(args) | ExprNode::Mul(args) => {
            args.iter().any(|&h| depends_on(arena, h, var))
        }
        ExprNode::Pow { base, exp } => {
            depends_on(arena, *base, var) || depends_on(arena, *exp, var)
        }
        ExprNode::Neg(arg) => depends_on(arena, *arg, var),
        ExprNode::Div { num, den } => {
            depends_on(arena, *num, var) || depends_on(arena, *den, var)
        }
        ExprNode::Call { args, .. } => args.iter().any(|&h| depends_on(arena, h, var)),
    }
}

/// Folds a purely numeric expression to an exact rational.
///
/// Any symbol or function application makes the answer `None`, as does a
/// value that leaves i64 range.
#[must_use]
pub fn const_value(arena: &ExprArena, expr: ExprHandle) -> Option<Q> {
    match arena.get(expr) {
        ExprNode::Integer(n) => Some(Q::from_integer(*n)),

        #[allow(clippy::cast_possible_wrap)]
        ExprNode::Rational(num, den) => Some(Q::new(*num, *den as i64)),

        ExprNode::Symbol(_) | ExprNode::Call { .. } => None,

        ExprNode::Add(args) => {
            let mut sum = Q::zero();
            for &arg in args {
                sum = sum.checked_add(const_value(arena, arg)?)?;
            }
            Some(sum)
        }

        ExprNode::Mul(args) => {
            let mut product = Q::one();
            for &arg in args {
                product = product.checked_mul(const_value(arena, arg)?)?;
            }
            Some(product)
        }

        ExprNode::Pow { base, exp } => {
            let b = const_value(arena, *base)?;
            let e = const_value(arena, *exp)?;
            if !e.is_integer() {
                return None;
            }
            b.powi(e.numer())
        }

        ExprNode::Neg(arg) => const_value(arena, *arg)?.checked_neg(),

        ExprNode::Div { num, den } => {
            let n = const_value(arena, *num)?;
            let d = const_value(arena, *den)?;
            n.checked_mul(d.recip()?)
        }
    }
}

/// The polynomial degree of `expr` in `var`, if it is a polynomial.
#[must_use]
pub fn degree_in(arena: &ExprArena, expr: ExprHandle, var: SymbolId) -> Option<usize> {
    Polynomial::from_expr(arena, expr, var).map(|p| p.degree())
}

/// Decomposes `expr` as `k*var + m` with exact rational `k` and `m`.
///
/// Returns `None` for anything that is not affine in `var` (including
/// expressions containing foreign symbols).
#[must_use]
pub fn affine_in(arena: &ExprArena, expr: ExprHandle, var: SymbolId) -> Option<(Q, Q)> {
    if !depends_on(arena, expr, var) {
        return Some((Q::zero(), const_value(arena, expr)?));
    }

    match arena.get(expr) {
        ExprNode::Symbol(id) if *id == var => Some((Q::one(), Q::zero())),

        ExprNode::Add(args) => {
            let mut k = Q::zero();
            let mut m = Q::zero();
            for &arg in args {
                let (ka, ma) = affine_in(arena, arg, var)?;
                k = k.checked_add(ka)?;
                m = m.checked_add(ma)?;
            }
            Some((k, m))
        }

        ExprNode::Mul(args) => {
            // (k1*x + m1) * (k2*x + m2) is affine only when one side is constant
            let mut k = Q::zero();
            let mut m = Q::one();
            for &arg in args {
                let (ka, ma) = affine_in(arena, arg, var)?;
                if !k.is_zero() && !ka.is_zero() {
                    return None;
                }
                k = k.checked_mul(ma)?.checked_add(ka.checked_mul(m)?)?;
                m = m.checked_mul(ma)?;
            }
            Some((k, m))
        }

        ExprNode::Neg(arg) => {
            let (k, m) = affine_in(arena, *arg, var)?;
            Some((k.checked_neg()?, m.checked_neg()?))
        }

        ExprNode::Div { num, den } => {
            let d = const_value(arena, *den)?;
            let inv = d.recip()?;
            let (k, m) = affine_in(arena, *num, var)?;
            Some((k.checked_mul(inv)?, m.checked_mul(inv)?))
        }

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic(arena: &mut ExprArena) -> (ExprHandle, SymbolId) {
        // x^2 + 3x - 2
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");
        let two = arena.integer(2);
        let three = arena.integer(3);
        let x_sq = arena.pow(x, two);
        let three_x = arena.mul([three, x]);
        let neg_two = arena.integer(-2);
        (arena.add([x_sq, three_x, neg_two]), var)
    }

    #[test]
    fn polynomial_extraction() {
        let mut arena = ExprArena::new();
        let (expr, var) = quadratic(&mut arena);

        let p = Polynomial::from_expr(&arena, expr, var).unwrap();
        assert_eq!(p.degree(), 2);
        assert_eq!(p.coeffs(), &[Q::from_integer(-2), Q::from_integer(3), Q::one()]);
        assert_eq!(p.eval(Q::from_integer(2)), Q::from_integer(8));
    }

    #[test]
    fn non_polynomials_are_rejected() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");

        let sin_x = arena.call(crate::expr::BuiltinFn::Sin, [x]);
        assert!(Polynomial::from_expr(&arena, sin_x, var).is_none());

        let one = arena.integer(1);
        let inv = arena.div(one, x);
        assert!(Polynomial::from_expr(&arena, inv, var).is_none());

        let neg_one = arena.integer(-1);
        let x_inv = arena.pow(x, neg_one);
        assert!(Polynomial::from_expr(&arena, x_inv, var).is_none());
    }

    #[test]
    fn degree_of_products() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");
        let two = arena.integer(2);
        let x_sq = arena.pow(x, two);
        let prod = arena.mul([x_sq, x]);

        assert_eq!(degree_in(&arena, prod, var), Some(3));
    }

    #[test]
    fn constant_folding() {
        let mut arena = ExprArena::new();
        let half = arena.rational(1, 2);
        let three = arena.integer(3);
        let sum = arena.add([half, three]);
        assert_eq!(const_value(&arena, sum), Some(Q::new(7, 2)));

        let x = arena.symbol("x");
        let with_symbol = arena.add([x, three]);
        assert_eq!(const_value(&arena, with_symbol), None);
    }

    #[test]
    fn affine_extraction() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");

        // -3/2 * x
        let rate = arena.rational(-3, 2);
        let kx = arena.mul([rate, x]);
        assert_eq!(affine_in(&arena, kx, var), Some((Q::new(-3, 2), Q::zero())));

        // 2x + 1
        let two = arena.integer(2);
        let one = arena.integer(1);
        let two_x = arena.mul([two, x]);
        let affine = arena.add([two_x, one]);
        assert_eq!(
            affine_in(&arena, affine, var),
            Some((Q::from_integer(2), Q::one()))
        );

        // x^2 is not affine
        let x_sq = arena.pow(x, two);
        assert_eq!(affine_in(&arena, x_sq, var), None);

        // x * x is not affine
        let xx = arena.mul([x, x]);
        assert_eq!(affine_in(&arena, xx, var), None);
    }

    #[test]
    fn ring_ops() {
        // (x + 1) * (x - 1) == x^2 - 1
        let x_plus_1 = Polynomial::new(vec![Q::one(), Q::one()]);
        let x_minus_1 = x_plus_1.add(&Polynomial::constant(Q::from_integer(-2)));
        let product = x_plus_1.mul(&x_minus_1);
        assert_eq!(product.coeffs(), &[Q::from_integer(-1), Q::zero(), Q::one()]);

        assert_eq!(x_plus_1.powi(2).degree(), 2);
        assert_eq!(product.neg().coeff(0), Q::one());
        assert_eq!(product.scale(Q::from_integer(3)).coeff(2), Q::from_integer(3));
    }

    #[test]
    fn overflowing_constants_fold_to_none() {
        let mut arena = ExprArena::new();

        // 2^100 does not fit an i64-backed rational
        let two = arena.integer(2);
        let hundred = arena.integer(100);
        let big_pow = arena.pow(two, hundred);
        assert_eq!(const_value(&arena, big_pow), None);

        let max = arena.integer(i64::MAX);
        let doubled = arena.add([max, max]);
        assert_eq!(const_value(&arena, doubled), None);

        let sixty_two = arena.integer(62);
        let fits = arena.pow(two, sixty_two);
        assert_eq!(const_value(&arena, fits), Some(Q::from_integer(1 << 62)));
    }

    #[test]
    fn coefficient_overflow_rejects_the_polynomial() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");
        let max = arena.integer(i64::MAX);

        let max_x = arena.mul([max, x]);
        assert!(Polynomial::from_expr(&arena, max_x, var).is_some());

        let blown = arena.mul([max, max, x]);
        assert!(Polynomial::from_expr(&arena, blown, var).is_none());

        // exponents past the expansion cap are refused outright
        let huge_exp = arena.integer(100_000);
        let tower = arena.pow(x, huge_exp);
        assert!(Polynomial::from_expr(&arena, tower, var).is_none());
    }

    #[test]
    fn quadratic_evaluation_matches_horner() {
        let p = Polynomial::new(vec![Q::from_integer(-2), Q::from_integer(3), Q::one()]);
        // (-2) + 3*4 + 16 = 26
        assert_eq!(p.eval(Q::from_integer(4)), Q::from_integer(26));
    }
}
