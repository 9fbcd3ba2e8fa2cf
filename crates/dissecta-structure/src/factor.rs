//! Verified factorization of two-term exponential sums.
//!
//! Rewrites `c1*b^(k1*x) + c2*b^(k2*x)` into
//! `b^(kmin*x) * (c_min + c_max*b^((kmax-kmin)*x))`, pulling out the
//! slower-growing exponential. The rewrite is only reported after the
//! product of the two factors has been checked symbolically equal to the
//! original sum; a mismatch is a failure, never a wrong answer.
//!
//! Scope limit: exponents must be pure `k*x` with a zero additive
//! constant. `e^(x+1) + e^(2x)` is refused even though it is factorizable
//! in principle.

use num_traits::{One, Zero};
use smallvec::SmallVec;

use dissecta_core::poly::{affine_in, depends_on};
use dissecta_core::{equivalent, BuiltinFn, ExprArena, ExprHandle, ExprNode, Q, SymbolId};

use crate::classifier::{ShapeTag, StructureClassifier};

/// Outcome of an attempted exponential-sum factorization.
///
/// Failure is advisory: `common_factor` is 1 and `residual_factor` is the
/// original expression, so callers can treat both outcomes uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactorizationResult {
    /// Whether a verified rewrite was found.
    pub success: bool,
    /// The extracted common factor (1 on failure).
    pub common_factor: ExprHandle,
    /// The residual factor (the original expression on failure).
    pub residual_factor: ExprHandle,
}

impl FactorizationResult {
    fn failure(arena: &mut ExprArena, original: ExprHandle) -> Self {
        Self {
            success: false,
            common_factor: arena.integer(1),
            residual_factor: original,
        }
    }
}

/// The base of an extracted exponential factor.
///
/// Handles are hash-consed, so comparing `Constant` bases by handle is
/// comparing them by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpBase {
    /// Euler's number, written `exp(...)`.
    Natural,
    /// A constant base `b` in `b^(...)`.
    Constant(ExprHandle),
}

/// One addend split into prefactor, exponential base and linear rate.
#[derive(Debug, Clone, Copy)]
struct ExpAddend {
    prefactor: ExprHandle,
    base: ExpBase,
    rate: Q,
}

/// Attempts to factor a two-term exponential sum over `variable`.
///
/// Implements the full pipeline: addend splitting, affine-exponent
/// extraction with a zero constant term, rate comparison, rebuild and
/// symbolic verification. Every failure branch returns the uniform
/// advisory failure.
pub fn factor_exponential_sum(
    arena: &mut ExprArena,
    expr: ExprHandle,
    variable: SymbolId,
) -> FactorizationResult {
    let classifier = StructureClassifier::new(arena, variable);
    if classifier.shape_of(expr) != ShapeTag::Sum {
        return FactorizationResult::failure(arena, expr);
    }

    let addends = match arena.get(expr) {
        ExprNode::Add(args) if args.len() == 2 => Some([args[0], args[1]]),
        _ => None,
    };
    let Some(addends) = addends else {
        return FactorizationResult::failure(arena, expr);
    };

    let Some(first) = split_addend(arena, addends[0], variable) else {
        return FactorizationResult::failure(arena, expr);
    };
    let Some(second) = split_addend(arena, addends[1], variable) else {
        return FactorizationResult::failure(arena, expr);
    };

    if first.base != second.base {
        return FactorizationResult::failure(arena, expr);
    }
    if first.rate == second.rate {
        // equal rates mean the addends already share the whole exponential
        return FactorizationResult::failure(arena, expr);
    }

    // the common factor carries the rate of smaller magnitude; at equal
    // magnitude (k and -k) the smaller signed rate wins
    let (slow, fast) = if (first.rate.abs(), first.rate) < (second.rate.abs(), second.rate) {
        (first, second)
    } else {
        (second, first)
    };
    let Some(diff) = fast.rate.checked_sub(slow.rate) else {
        return FactorizationResult::failure(arena, expr);
    };

    let var_handle = arena.symbol_handle(variable);
    let common = exponential_term(arena, slow.base, slow.rate, var_handle);
    let growth = exponential_term(arena, fast.base, diff, var_handle);
    let scaled_growth = scale(arena, fast.prefactor, growth);
    let residual = arena.add([slow.prefactor, scaled_growth]);

    let product = arena.mul([common, residual]);
    if !equivalent(arena, product, expr) {
        return FactorizationResult::failure(arena, expr);
    }

    FactorizationResult {
        success: true,
        common_factor: common,
        residual_factor: residual,
    }
}

/// Splits one addend into a prefactor and exactly one exponential factor
/// whose exponent is `rate * variable`.
///
/// Zero or multiple exponential factors, a non-affine exponent, a nonzero
/// additive constant in the exponent, or a zero rate all refuse the
/// addend.
fn split_addend(arena: &mut ExprArena, addend: ExprHandle, variable: SymbolId) -> Option<ExpAddend> {
    let mut negated = false;
    let mut inner = addend;
    while let ExprNode::Neg(arg) = arena.get(inner) {
        negated = !negated;
        inner = *arg;
    }

    let factors: SmallVec<[ExprHandle; 4]> = match arena.get(inner) {
        ExprNode::Mul(args) => args.clone(),
        _ => SmallVec::from_slice(&[inner]),
    };

    let mut exponential: Option<(ExpBase, ExprHandle)> = None;
    let mut rest: SmallVec<[ExprHandle; 4]> = SmallVec::new();

    for factor in factors {
        match exponential_part(arena, factor, variable) {
            Some(part) => {
                if exponential.is_some() {
                    return None;
                }
                exponential = Some(part);
            }
            None => rest.push(factor),
        }
    }

    let (base, exponent) = exponential?;
    let (rate, constant) = affine_in(arena, exponent, variable)?;
    if !constant.is_zero() || rate.is_zero() {
        return None;
    }

    if negated {
        let neg_one = arena.integer(-1);
        rest.insert(0, neg_one);
    }
    let prefactor = if rest.is_empty() {
        arena.integer(1)
    } else {
        arena.mul(rest)
    };

    Some(ExpAddend {
        prefactor,
        base,
        rate,
    })
}

/// Recognizes a single factor as exponential in the variable.
fn exponential_part(
    arena: &ExprArena,
    factor: ExprHandle,
    variable: SymbolId,
) -> Option<(ExpBase, ExprHandle)> {
    match arena.get(factor) {
        ExprNode::Call {
            func: BuiltinFn::Exp,
            args,
        } if args.len() == 1 && depends_on(arena, args[0], variable) => {
            Some((ExpBase::Natural, args[0]))
        }

        ExprNode::Pow { base, exp }
            if !depends_on(arena, *base, variable) && depends_on(arena, *exp, variable) =>
        {
            Some((ExpBase::Constant(*base), *exp))
        }

        _ => None,
    }
}

/// Builds `base^(rate * var)`.
fn exponential_term(arena: &mut ExprArena, base: ExpBase, rate: Q, var: ExprHandle) -> ExprHandle {
    let exponent = if rate.is_one() {
        var
    } else {
        let coeff = arena.number(rate);
        arena.mul([coeff, var])
    };
    match base {
        ExpBase::Natural => arena.exp_of(exponent),
        ExpBase::Constant(b) => arena.pow(b, exponent),
    }
}

/// Builds `prefactor * term`, skipping a unit prefactor.
fn scale(arena: &mut ExprArena, prefactor: ExprHandle, term: ExprHandle) -> ExprHandle {
    if arena.get(prefactor).is_one() {
        term
    } else {
        arena.mul([prefactor, term])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dissecta_core::display::format_expr;

    fn setup() -> (ExprArena, ExprHandle, SymbolId) {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");
        (arena, x, var)
    }

    fn exp_kx(arena: &mut ExprArena, x: ExprHandle, k: i64) -> ExprHandle {
        if k == 1 {
            arena.exp_of(x)
        } else {
            let kh = arena.integer(k);
            let kx = arena.mul([kh, x]);
            arena.exp_of(kx)
        }
    }

    #[test]
    fn simple_sum_factors() {
        let (mut arena, x, var) = setup();
        // e^x + e^(2x) -> e^x * (1 + e^x)
        let e1 = exp_kx(&mut arena, x, 1);
        let e2 = exp_kx(&mut arena, x, 2);
        let sum = arena.add([e1, e2]);

        let result = factor_exponential_sum(&mut arena, sum, var);
        assert!(result.success);
        assert_eq!(format_expr(&arena, result.common_factor), "e^x");
        assert_eq!(format_expr(&arena, result.residual_factor), "1 + e^x");
    }

    #[test]
    fn prefactors_survive() {
        let (mut arena, x, var) = setup();
        // 2e^x + 3e^(2x) -> e^x * (2 + 3e^x)
        let two = arena.integer(2);
        let three = arena.integer(3);
        let e1 = exp_kx(&mut arena, x, 1);
        let e2 = exp_kx(&mut arena, x, 2);
        let t1 = arena.mul([two, e1]);
        let t2 = arena.mul([three, e2]);
        let sum = arena.add([t1, t2]);

        let result = factor_exponential_sum(&mut arena, sum, var);
        assert!(result.success);
        assert_eq!(format_expr(&arena, result.common_factor), "e^x");
        assert_eq!(format_expr(&arena, result.residual_factor), "2 + 3*e^x");
    }

    #[test]
    fn negative_rates_pick_the_smaller_magnitude() {
        let (mut arena, x, var) = setup();
        // e^(-x) + e^(3x) -> e^(-x) * (1 + e^(4x))
        let em1 = exp_kx(&mut arena, x, -1);
        let e3 = exp_kx(&mut arena, x, 3);
        let sum = arena.add([em1, e3]);

        let result = factor_exponential_sum(&mut arena, sum, var);
        assert!(result.success);
        assert_eq!(format_expr(&arena, result.common_factor), "e^(-1*x)");

        let product = arena.mul([result.common_factor, result.residual_factor]);
        assert!(equivalent(&mut arena, product, sum));
    }

    #[test]
    fn constant_base_powers_factor() {
        let (mut arena, x, var) = setup();
        // 2^x + 2^(3x)
        let two = arena.integer(2);
        let three = arena.integer(3);
        let p1 = arena.pow(two, x);
        let three_x = arena.mul([three, x]);
        let p2 = arena.pow(two, three_x);
        let sum = arena.add([p1, p2]);

        let result = factor_exponential_sum(&mut arena, sum, var);
        assert!(result.success);
        let product = arena.mul([result.common_factor, result.residual_factor]);
        assert!(equivalent(&mut arena, product, sum));
    }

    #[test]
    fn mismatched_bases_fail() {
        let (mut arena, x, var) = setup();
        // 2^x + e^(2x)
        let two = arena.integer(2);
        let p1 = arena.pow(two, x);
        let e2 = exp_kx(&mut arena, x, 2);
        let sum = arena.add([p1, e2]);

        let result = factor_exponential_sum(&mut arena, sum, var);
        assert!(!result.success);
        assert!(arena.get(result.common_factor).is_one());
        assert_eq!(result.residual_factor, sum);
    }

    #[test]
    fn equal_rates_fail() {
        let (mut arena, x, var) = setup();
        // e^x + e^x interns to Add([e^x, e^x])
        let e1 = exp_kx(&mut arena, x, 1);
        let sum = arena.intern(ExprNode::Add(SmallVec::from_slice(&[e1, e1])));

        let result = factor_exponential_sum(&mut arena, sum, var);
        assert!(!result.success);
        assert_eq!(result.residual_factor, sum);
    }

    #[test]
    fn non_exponential_addend_fails() {
        let (mut arena, x, var) = setup();
        // e^x + x^2
        let e1 = exp_kx(&mut arena, x, 1);
        let two = arena.integer(2);
        let x2 = arena.pow(x, two);
        let sum = arena.add([e1, x2]);

        let result = factor_exponential_sum(&mut arena, sum, var);
        assert!(!result.success);
    }

    #[test]
    fn nonzero_exponent_constant_fails() {
        let (mut arena, x, var) = setup();
        // e^(x+1) + e^(2x)
        let one = arena.integer(1);
        let x_plus_1 = arena.add([x, one]);
        let e_shift = arena.exp_of(x_plus_1);
        let e2 = exp_kx(&mut arena, x, 2);
        let sum = arena.add([e_shift, e2]);

        let result = factor_exponential_sum(&mut arena, sum, var);
        assert!(!result.success);
    }

    #[test]
    fn three_addends_fail() {
        let (mut arena, x, var) = setup();
        let e1 = exp_kx(&mut arena, x, 1);
        let e2 = exp_kx(&mut arena, x, 2);
        let e3 = exp_kx(&mut arena, x, 3);
        let sum = arena.add([e1, e2, e3]);

        let result = factor_exponential_sum(&mut arena, sum, var);
        assert!(!result.success);
    }

    #[test]
    fn negated_addend_folds_into_prefactor() {
        let (mut arena, x, var) = setup();
        // e^(2x) - e^x -> e^x * (-1 + e^x)
        let e1 = exp_kx(&mut arena, x, 1);
        let e2 = exp_kx(&mut arena, x, 2);
        let neg_e1 = arena.neg(e1);
        let sum = arena.add([e2, neg_e1]);

        let result = factor_exponential_sum(&mut arena, sum, var);
        assert!(result.success);
        assert_eq!(format_expr(&arena, result.common_factor), "e^x");

        let product = arena.mul([result.common_factor, result.residual_factor]);
        assert!(equivalent(&mut arena, product, sum));
    }

    #[test]
    fn fractional_rates_factor() {
        let (mut arena, x, var) = setup();
        // e^(x/2) + e^(3x/2)
        let half = arena.rational(1, 2);
        let three_half = arena.rational(3, 2);
        let hx = arena.mul([half, x]);
        let thx = arena.mul([three_half, x]);
        let e_h = arena.exp_of(hx);
        let e_th = arena.exp_of(thx);
        let sum = arena.add([e_h, e_th]);

        let result = factor_exponential_sum(&mut arena, sum, var);
        assert!(result.success);
        let product = arena.mul([result.common_factor, result.residual_factor]);
        assert!(equivalent(&mut arena, product, sum));
    }
}
