//! The stopping predicate for recursive decomposition.

use dissecta_core::poly::{degree_in, depends_on};
use dissecta_core::{ExprArena, ExprHandle, SymbolId};

use crate::classifier::{SemanticTag, ShapeTag};

/// Decides whether a subtree should remain a leaf.
///
/// Rules, in order:
/// - A polynomial of degree at most 2 in the variable stays whole.
/// - A term without a free occurrence of the variable stays whole.
/// - Sums, products and quotients have natural children and continue.
/// - Everything else stops.
#[must_use]
pub fn should_stop(
    arena: &ExprArena,
    variable: SymbolId,
    expr: ExprHandle,
    shape: ShapeTag,
    semantic: SemanticTag,
) -> bool {
    if semantic == SemanticTag::Polynomial
        && degree_in(arena, expr, variable).is_some_and(|d| d <= 2)
    {
        return true;
    }

    if !depends_on(arena, expr, variable) {
        return true;
    }

    !matches!(
        shape,
        ShapeTag::Sum | ShapeTag::Product | ShapeTag::Quotient
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::StructureClassifier;

    fn stops(arena: &ExprArena, variable: SymbolId, expr: ExprHandle) -> bool {
        let classifier = StructureClassifier::new(arena, variable);
        let (shape, semantic) = classifier.classify(expr);
        should_stop(arena, variable, expr, shape, semantic)
    }

    #[test]
    fn low_degree_polynomials_stop() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");
        let two = arena.integer(2);
        let three = arena.integer(3);
        let x2 = arena.pow(x, two);
        let three_x = arena.mul([three, x]);
        let neg_two = arena.integer(-2);
        let quadratic = arena.add([x2, three_x, neg_two]);

        assert!(stops(&arena, var, quadratic));
    }

    #[test]
    fn high_degree_polynomials_continue() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");
        let three = arena.integer(3);
        let x3 = arena.pow(x, three);
        let sum = arena.add([x3, x]);

        assert!(!stops(&arena, var, sum));
    }

    #[test]
    fn constants_stop() {
        let mut arena = ExprArena::new();
        let _ = arena.symbol("x");
        let var = arena.intern_symbol("x");
        let two = arena.integer(2);
        let five = arena.integer(5);
        let product = arena.mul([two, five]);

        assert!(stops(&arena, var, product));
    }

    #[test]
    fn transcendental_sums_continue() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let var = arena.intern_symbol("x");
        let sin = arena.call(dissecta_core::BuiltinFn::Sin, [x]);
        let e_x = arena.exp_of(x);
        let sum = arena.add([sin, e_x]);

        assert!(!stops(&arena, var, sum));
        // the leaves themselves stop
        assert!(stops(&arena, var, sin));
        assert!(stops(&arena, var, e_x));
    }
}
