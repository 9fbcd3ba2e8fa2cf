//! Normalization-based symbolic equality.
//!
//! [`equivalent`] decides whether two expressions denote the same function
//! by rewriting both into a canonical sum-of-products form and comparing
//! handles. The rewrite distributes products over sums, folds numeric
//! constants exactly, merges powers of a common base, and collects like
//! terms. It is a decision procedure for the exp/pow/rational fragment the
//! structure engine produces, not a general simplifier.

use num_traits::{One, Zero};
use smallvec::SmallVec;

use crate::arena::ExprArena;
use crate::expr::{BuiltinFn, ExprHandle, ExprNode};
use crate::rational::Q;

/// Rewrites an expression into canonical form.
///
/// The canonical form is a sum of terms, each term a rational coefficient
/// times a product of non-numeric factors with merged exponents, with
/// operands in deterministic handle order. Two expressions that are equal
/// under ring axioms and `exp`/`pow` exponent laws normalize to the same
/// handle.
pub fn normalize(arena: &mut ExprArena, expr: ExprHandle) -> ExprHandle {
    let terms = normal_terms(arena, expr);
    rebuild_sum(arena, terms)
}

/// Returns true if two expressions normalize to the same canonical form.
pub fn equivalent(arena: &mut ExprArena, a: ExprHandle, b: ExprHandle) -> bool {
    normalize(arena, a) == normalize(arena, b)
}

/// A canonical term: rational coefficient times a product of factors,
/// where each factor is a base handle with a rational exponent weight and
/// an optional symbolic exponent part.
#[derive(Clone, Debug)]
struct Term {
    coeff: Q,
    /// Factors as (base, exponent) pairs, bases already normalized,
    /// sorted by base handle.
    factors: Vec<(ExprHandle, ExprHandle)>,
}

impl Term {
    fn constant(coeff: Q) -> Self {
        Self {
            coeff,
            factors: Vec::new(),
        }
    }

    /// A key identifying the non-numeric part of the term.
    fn key(&self) -> &[(ExprHandle, ExprHandle)] {
        &self.factors
    }
}

/// Normalizes `expr` into a flat list of canonical terms.
fn normal_terms(arena: &mut ExprArena, expr: ExprHandle) -> Vec<Term> {
    let node = arena.get(expr).clone();
    let terms = match node {
        ExprNode::Integer(n) => vec![Term::constant(Q::from_integer(n))],

        #[allow(clippy::cast_possible_wrap)]
        ExprNode::Rational(num, den) => vec![Term::constant(Q::new(num, den as i64))],

        ExprNode::Symbol(_) => {
            let one = arena.integer(1);
            vec![Term {
                coeff: Q::one(),
                factors: vec![(expr, one)],
            }]
        }

        ExprNode::Add(args) => {
            let mut terms = Vec::new();
            for arg in args {
                terms.extend(normal_terms(arena, arg));
            }
            terms
        }

        ExprNode::Neg(arg) => {
            let mut terms = normal_terms(arena, arg);
            for t in &mut terms {
                t.coeff = -t.coeff;
            }
            terms
        }

        ExprNode::Mul(args) => {
            // Distribute: the product of term lists is the term-wise product
            let mut acc = vec![Term::constant(Q::one())];
            for arg in args {
                let rhs = normal_terms(arena, arg);
                let mut next = Vec::with_capacity(acc.len() * rhs.len());
                for a in &acc {
                    for b in &rhs {
                        next.push(mul_terms(arena, a, b));
                    }
                }
                acc = next;
            }
            acc
        }

        ExprNode::Div { num, den } => {
            let num_terms = normal_terms(arena, num);
            let den_norm = normalize(arena, den);
            if let Some(d) = numeric_of(arena.get(den_norm)) {
                if let Some(inv) = d.recip() {
                    let mut terms = num_terms;
                    for t in &mut terms {
                        t.coeff = t.coeff * inv;
                    }
                    return collect(terms);
                }
            }
            // Symbolic denominator becomes a factor with exponent -1
            let neg_one = arena.integer(-1);
            let inv_factor = Term {
                coeff: Q::one(),
                factors: vec![(den_norm, neg_one)],
            };
            num_terms
                .iter()
                .map(|t| mul_terms(arena, t, &inv_factor))
                .collect()
        }

        ExprNode::Pow { base, exp } => normal_pow(arena, base, exp),

        ExprNode::Call { func, args } => normal_call(arena, func, &args),
    };
    collect(terms)
}

/// Normalizes `base^exp` to a term list.
fn normal_pow(arena: &mut ExprArena, base: ExprHandle, exp: ExprHandle) -> Vec<Term> {
    let exp_norm = normalize(arena, exp);
    let base_norm = normalize(arena, base);

    if let Some(e) = numeric_of(arena.get(exp_norm)) {
        if e.is_zero() {
            return vec![Term::constant(Q::one())];
        }
        // Numeric base with integer exponent folds exactly
        if let Some(b) = numeric_of(arena.get(base_norm)) {
            if let Some(v) = b.powi_checked(e) {
                return vec![Term::constant(v)];
            }
        }
        // Integer positive exponent of a sum expands by repeated product
        if e.is_integer() && e.signum() > 0 && e.numer() <= 8 {
            if let ExprNode::Add(_) = arena.get(base_norm) {
                let base_terms = normal_terms(arena, base_norm);
                let mut acc = vec![Term::constant(Q::one())];
                for _ in 0..e.numer() {
                    let mut next = Vec::new();
                    for a in &acc {
                        for b in &base_terms {
                            next.push(mul_terms(arena, a, b));
                        }
                    }
                    acc = next;
                }
                return acc;
            }
        }
    }

    // exp(a)^c rewrites to exp(a*c); (b^a)^c rewrites to b^(a*c)
    match arena.get(base_norm).clone() {
        ExprNode::Call { func: BuiltinFn::Exp, args } if args.len() == 1 => {
            let inner = arena.mul([args[0], exp_norm]);
            let inner_norm = normalize(arena, inner);
            exp_term(arena, inner_norm)
        }
        ExprNode::Pow { base: b, exp: a } => {
            let merged = arena.mul([a, exp_norm]);
            let merged_norm = normalize(arena, merged);
            if arena.get(merged_norm).is_one() {
                return normal_terms(arena, b);
            }
            vec![Term {
                coeff: Q::one(),
                factors: vec![(b, merged_norm)],
            }]
        }
        ExprNode::Mul(args) => {
            // (u*v)^e distributes over the factors
            let mut acc = vec![Term::constant(Q::one())];
            for arg in args {
                let factor = normal_pow(arena, arg, exp_norm);
                let mut next = Vec::new();
                for a in &acc {
                    for b in &factor {
                        next.push(mul_terms(arena, a, b));
                    }
                }
                acc = next;
            }
            acc
        }
        node => {
            if node.is_one() {
                return vec![Term::constant(Q::one())];
            }
            vec![Term {
                coeff: Q::one(),
                factors: vec![(base_norm, exp_norm)],
            }]
        }
    }
}

/// Normalizes a function application.
fn normal_call(arena: &mut ExprArena, func: BuiltinFn, args: &[ExprHandle]) -> Vec<Term> {
    let norm_args: SmallVec<[ExprHandle; 2]> =
        args.iter().map(|&a| normalize(arena, a)).collect();

    if func == BuiltinFn::Exp && norm_args.len() == 1 {
        if arena.get(norm_args[0]).is_zero() {
            return vec![Term::constant(Q::one())];
        }
        return exp_term(arena, norm_args[0]);
    }

    let call = arena.call(func, norm_args);
    let one = arena.integer(1);
    vec![Term {
        coeff: Q::one(),
        factors: vec![(call, one)],
    }]
}

/// Builds the single term for `exp(arg)`, splitting an additive argument
/// into a product of exp factors so that exp(a+b) and exp(a)*exp(b) agree.
fn exp_term(arena: &mut ExprArena, arg: ExprHandle) -> Vec<Term> {
    let addends: Vec<ExprHandle> = match arena.get(arg) {
        ExprNode::Add(args) => args.iter().copied().collect(),
        _ => vec![arg],
    };

    let mut term = Term::constant(Q::one());
    let one = arena.integer(1);
    for addend in addends {
        let factor = arena.exp_of(addend);
        term = mul_terms(
            arena,
            &term,
            &Term {
                coeff: Q::one(),
                factors: vec![(factor, one)],
            },
        );
    }
    vec![term]
}

/// Multiplies two canonical terms, merging factors with equal bases by
/// adding their exponents.
fn mul_terms(arena: &mut ExprArena, a: &Term, b: &Term) -> Term {
    let mut factors: Vec<(ExprHandle, ExprHandle)> = a.factors.clone();

    for &(base, exp) in &b.factors {
        if let Some(entry) = factors.iter_mut().find(|(fb, _)| *fb == base) {
            let sum = arena.add([entry.1, exp]);
            entry.1 = normalize(arena, sum);
        } else {
            factors.push((base, exp));
        }
    }

    // exp factors merge by argument: exp(a)*exp(b) == exp(a+b)
    factors = merge_exp_factors(arena, factors);
    factors.retain(|(_, exp)| !arena.get(*exp).is_zero());
    factors.sort_by_key(|(base, _)| *base);

    Term {
        coeff: a.coeff * b.coeff,
        factors,
    }
}

/// Combines all `exp(...)^1` factors into a single exp of the summed
/// arguments, then re-splits additively so the representation is unique.
fn merge_exp_factors(
    arena: &mut ExprArena,
    factors: Vec<(ExprHandle, ExprHandle)>,
) -> Vec<(ExprHandle, ExprHandle)> {
    let mut exp_args: Vec<ExprHandle> = Vec::new();
    let mut rest: Vec<(ExprHandle, ExprHandle)> = Vec::new();

    for (base, exp) in factors {
        match arena.get(base) {
            ExprNode::Call { func: BuiltinFn::Exp, args } if args.len() == 1 => {
                let arg = args[0];
                // exp(a)^e folds the exponent into the argument
                if arena.get(exp).is_one() {
                    exp_args.push(arg);
                } else {
                    let scaled = arena.mul([arg, exp]);
                    let scaled_norm = normalize(arena, scaled);
                    exp_args.push(scaled_norm);
                }
            }
            _ => rest.push((base, exp)),
        }
    }

    if exp_args.is_empty() {
        return rest;
    }

    let total = arena.add(exp_args);
    let total_norm = normalize(arena, total);
    if !arena.get(total_norm).is_zero() {
        let one = arena.integer(1);
        match arena.get(total_norm).clone() {
            ExprNode::Add(args) => {
                for arg in args {
                    let f = arena.exp_of(arg);
                    rest.push((f, one));
                }
            }
            _ => {
                let f = arena.exp_of(total_norm);
                rest.push((f, one));
            }
        }
    }
    rest
}

/// Collects like terms: terms with equal factor keys merge by adding
/// coefficients, zero-coefficient terms drop out.
fn collect(terms: Vec<Term>) -> Vec<Term> {
    let mut merged: Vec<Term> = Vec::new();
    for term in terms {
        if let Some(existing) = merged.iter_mut().find(|t| t.key() == term.key()) {
            existing.coeff = existing.coeff + term.coeff;
        } else {
            merged.push(term);
        }
    }
    merged.retain(|t| !t.coeff.is_zero());
    merged.sort_by(|a, b| a.key().cmp(b.key()));
    merged
}

/// Rebuilds an expression from canonical terms.
fn rebuild_sum(arena: &mut ExprArena, terms: Vec<Term>) -> ExprHandle {
    if terms.is_empty() {
        return arena.integer(0);
    }

    let mut addends: SmallVec<[ExprHandle; 4]> = SmallVec::new();
    for term in terms {
        addends.push(rebuild_term(arena, &term));
    }
    arena.add(addends)
}

fn rebuild_term(arena: &mut ExprArena, term: &Term) -> ExprHandle {
    let mut factors: SmallVec<[ExprHandle; 4]> = SmallVec::new();
    if !term.coeff.is_one() || term.factors.is_empty() {
        factors.push(arena.number(term.coeff));
    }
    for &(base, exp) in &term.factors {
        if arena.get(exp).is_one() {
            factors.push(base);
        } else {
            factors.push(arena.pow(base, exp));
        }
    }
    arena.mul(factors)
}

fn numeric_of(node: &ExprNode) -> Option<Q> {
    match node {
        ExprNode::Integer(n) => Some(Q::from_integer(*n)),
        #[allow(clippy::cast_possible_wrap)]
        ExprNode::Rational(num, den) => Some(Q::new(*num, *den as i64)),
        _ => None,
    }
}

impl Q {
    /// Power with a rational exponent when the result stays rational.
    fn powi_checked(self, e: Q) -> Option<Q> {
        if e.is_integer() {
            return self.powi(e.numer());
        }
        // Only the half-integer case matters for canonical folding
        if e.denom() == 2 {
            let root = self.sqrt()?;
            return root.powi(e.numer());
        }
        None
    }
}
