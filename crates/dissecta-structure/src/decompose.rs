//! Recursive decomposition into a typed component tree.
//!
//! The engine walks an expression top-down. At every node it classifies,
//! gives the exponential-sum factorizer a chance on two-addend sums,
//! consults the stop predicate, and otherwise recurses over the natural
//! children of the shape. Each call returns a freshly allocated tree; the
//! engine keeps no state between calls beyond the arena it interns into.

use num_traits::One;
use smallvec::SmallVec;

use dissecta_core::poly::const_value;
use dissecta_core::{ExprArena, ExprHandle, ExprNode, SymbolId};

use crate::classifier::{SemanticTag, ShapeTag, StructureClassifier};
use crate::factor::factor_exponential_sum;
use crate::stop::should_stop;

/// A node in the decomposition tree.
///
/// Invariant: a component with children recombines to `term` under
/// symbolic equality; a childless component satisfies the stop predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// The sub-expression this component covers.
    pub term: ExprHandle,
    /// The reported shape. Diverges from the syntactic operator in exactly
    /// one case: a factorized exponential sum reports `Product`.
    pub shape: ShapeTag,
    /// The transcendental-family tag.
    pub semantic: SemanticTag,
    /// Decomposed children, in the term's operand order.
    pub children: Vec<Component>,
}

impl Component {
    /// Returns true if this component has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn leaf(term: ExprHandle, shape: ShapeTag, semantic: SemanticTag) -> Self {
        Self {
            term,
            shape,
            semantic,
            children: Vec::new(),
        }
    }
}

/// Recursive decomposition over a mutable arena.
///
/// The arena is mutable because the factorizer and the quotient splitter
/// intern rewritten terms; input expressions are never modified.
pub struct DecompositionEngine<'a> {
    arena: &'a mut ExprArena,
    variable: SymbolId,
}

impl<'a> DecompositionEngine<'a> {
    /// Creates an engine for the given arena and target variable.
    pub fn new(arena: &'a mut ExprArena, variable: SymbolId) -> Self {
        Self { arena, variable }
    }

    /// Decomposes an expression into its component tree.
    pub fn decompose(&mut self, expr: ExprHandle) -> Component {
        let (shape, semantic) = {
            let classifier = StructureClassifier::new(self.arena, self.variable);
            classifier.classify(expr)
        };

        if shape == ShapeTag::Sum && self.addend_count(expr) == 2 {
            let result = factor_exponential_sum(self.arena, expr, self.variable);
            if result.success {
                let common = self.decompose(result.common_factor);
                let residual = self.decompose(result.residual_factor);
                return Component {
                    term: expr,
                    shape: ShapeTag::Product,
                    semantic,
                    children: vec![common, residual],
                };
            }
        }

        if should_stop(self.arena, self.variable, expr, shape, semantic) {
            return Component::leaf(expr, shape, semantic);
        }

        let children = self
            .natural_children(expr, shape)
            .into_iter()
            .map(|child| self.decompose(child))
            .collect::<Vec<_>>();

        if children.is_empty() {
            // no rule split this term; keep it whole
            return Component::leaf(expr, shape, semantic);
        }

        Component {
            term: expr,
            shape,
            semantic,
            children,
        }
    }

    /// Rebuilds a component's term from its children according to its
    /// shape. Leaves rebuild to their own term.
    pub fn recombine(&mut self, component: &Component) -> ExprHandle {
        if component.is_leaf() {
            return component.term;
        }

        let parts: SmallVec<[ExprHandle; 4]> =
            component.children.iter().map(|c| c.term).collect();

        match component.shape {
            ShapeTag::Sum => self.arena.add(parts),
            ShapeTag::Product => self.arena.mul(parts),
            ShapeTag::Quotient => self.arena.div(parts[0], parts[1]),
            ShapeTag::PowerOrComposition | ShapeTag::Atomic => component.term,
        }
    }

    fn addend_count(&self, expr: ExprHandle) -> usize {
        match self.arena.get(expr) {
            ExprNode::Add(args) => args.len(),
            _ => 0,
        }
    }

    /// The natural children of a shape: addends, factors, or the
    /// numerator/denominator pair. Other shapes have no natural children.
    fn natural_children(&mut self, expr: ExprHandle, shape: ShapeTag) -> Vec<ExprHandle> {
        match shape {
            ShapeTag::Sum => match self.arena.get(expr) {
                ExprNode::Add(args) => args.iter().copied().collect(),
                _ => Vec::new(),
            },

            ShapeTag::Product => match self.arena.get(expr).clone() {
                ExprNode::Mul(args) => args.into_iter().collect(),
                ExprNode::Neg(inner) => {
                    let neg_one = self.arena.integer(-1);
                    vec![neg_one, inner]
                }
                _ => Vec::new(),
            },

            ShapeTag::Quotient => match quotient_parts(self.arena, expr) {
                Some((num, den)) => vec![num, den],
                None => Vec::new(),
            },

            ShapeTag::PowerOrComposition | ShapeTag::Atomic => Vec::new(),
        }
    }
}

/// Splits a quotient-shaped expression into `(numerator, denominator)`.
///
/// Handles explicit divisions, negative-constant powers, and products
/// carrying either as factors.
pub fn quotient_parts(arena: &mut ExprArena, expr: ExprHandle) -> Option<(ExprHandle, ExprHandle)> {
    match arena.get(expr).clone() {
        ExprNode::Div { num, den } => Some((num, den)),

        ExprNode::Pow { base, exp } => {
            let e = const_value(arena, exp)?;
            if e.signum() >= 0 {
                return None;
            }
            let num = arena.integer(1);
            let den = reciprocal_factor(arena, base, exp);
            Some((num, den))
        }

        ExprNode::Mul(args) => {
            let mut num_parts: SmallVec<[ExprHandle; 4]> = SmallVec::new();
            let mut den_parts: SmallVec<[ExprHandle; 4]> = SmallVec::new();

            for factor in args {
                match arena.get(factor).clone() {
                    ExprNode::Div { num, den } => {
                        num_parts.push(num);
                        den_parts.push(den);
                    }
                    ExprNode::Pow { base, exp }
                        if const_value(arena, exp).is_some_and(|q| q.signum() < 0) =>
                    {
                        let den = reciprocal_factor(arena, base, exp);
                        den_parts.push(den);
                    }
                    _ => num_parts.push(factor),
                }
            }

            if den_parts.is_empty() {
                return None;
            }
            let num = if num_parts.is_empty() {
                arena.integer(1)
            } else {
                arena.mul(num_parts)
            };
            let den = arena.mul(den_parts);
            Some((num, den))
        }

        _ => None,
    }
}

/// Rebuilds `base^(-exp)` as the denominator form `base^|exp|`.
fn reciprocal_factor(arena: &mut ExprArena, base: ExprHandle, exp: ExprHandle) -> ExprHandle {
    match const_value(arena, exp) {
        Some(q) if (-q).is_one() => base,
        Some(q) => {
            let pos = arena.number(-q);
            arena.pow(base, pos)
        }
        None => arena.pow(base, exp),
    }
}
