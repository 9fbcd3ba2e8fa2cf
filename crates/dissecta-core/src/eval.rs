//! Numeric evaluation of expressions.
//!
//! Used by the test suites to cross-check symbolic identities at sample
//! points, and available to callers that want a quick plot of a component.

use hashbrown::HashMap;

use crate::arena::ExprArena;
use crate::expr::{BuiltinFn, ExprHandle, ExprNode, SymbolId};

/// Evaluates an expression to an `f64` under a symbol assignment.
///
/// Returns `None` if a symbol has no assignment. Domain errors (division
/// by zero, log of a nonpositive number) surface as non-finite floats,
/// which the callers treat the same way they would from `f64` directly.
#[must_use]
pub fn eval_f64(
    arena: &ExprArena,
    expr: ExprHandle,
    bindings: &HashMap<SymbolId, f64>,
) -> Option<f64> {
    match arena.get(expr) {
        #[allow(clippy::cast_precision_loss)]
        ExprNode::Integer(n) => Some(*n as f64),

        #[allow(clippy::cast_precision_loss)]
        ExprNode::Rational(num, den) => Some(*num as f64 / *den as f64),

        ExprNode::Symbol(id) => bindings.get(id).copied(),

        ExprNode::Add(args) => {
            let mut sum = 0.0;
            for &arg in args {
                sum += eval_f64(arena, arg, bindings)?;
            }
            Some(sum)
        }

        ExprNode::Mul(args) => {
            let mut product = 1.0;
            for &arg in args {
                product *= eval_f64(arena, arg, bindings)?;
            }
            Some(product)
        }

        ExprNode::Pow { base, exp } => {
            let b = eval_f64(arena, *base, bindings)?;
            let e = eval_f64(arena, *exp, bindings)?;
            Some(b.powf(e))
        }

        ExprNode::Neg(arg) => Some(-eval_f64(arena, *arg, bindings)?),

        ExprNode::Div { num, den } => {
            let n = eval_f64(arena, *num, bindings)?;
            let d = eval_f64(arena, *den, bindings)?;
            Some(n / d)
        }

        ExprNode::Call { func, args } => {
            let a = eval_f64(arena, *args.first()?, bindings)?;
            Some(match func {
                BuiltinFn::Sin => a.sin(),
                BuiltinFn::Cos => a.cos(),
                BuiltinFn::Tan => a.tan(),
                BuiltinFn::Exp => a.exp(),
                BuiltinFn::Ln => a.ln(),
                BuiltinFn::Log10 => a.log10(),
                BuiltinFn::Sqrt => a.sqrt(),
                BuiltinFn::Abs => a.abs(),
            })
        }
    }
}
