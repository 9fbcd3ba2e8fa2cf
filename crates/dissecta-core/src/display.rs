//! Infix rendering of expressions.

use std::fmt::Write;

use crate::arena::ExprArena;
use crate::expr::{BuiltinFn, ExprHandle, ExprNode};

/// Operator precedence levels, loosest first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Add,
    Mul,
    Unary,
    Pow,
    Atom,
}

/// Renders an expression as a conventional infix string.
///
/// `exp(a)` renders as `e^a`, matching how the structure reports describe
/// exponentials.
#[must_use]
pub fn format_expr(arena: &ExprArena, expr: ExprHandle) -> String {
    let mut out = String::new();
    write_expr(arena, expr, Prec::Add, &mut out);
    out
}

fn write_expr(arena: &ExprArena, expr: ExprHandle, parent: Prec, out: &mut String) {
    let prec = prec_of(arena.get(expr));
    let needs_parens = prec < parent;
    if needs_parens {
        out.push('(');
    }

    match arena.get(expr) {
        ExprNode::Integer(n) => {
            let _ = write!(out, "{n}");
        }
        ExprNode::Rational(num, den) => {
            let _ = write!(out, "{num}/{den}");
        }
        ExprNode::Symbol(id) => {
            out.push_str(arena.symbol_name(*id).unwrap_or("?"));
        }
        ExprNode::Add(args) => {
            for (i, &arg) in args.iter().enumerate() {
                if i > 0 {
                    // Fold a leading negation into the separator
                    if let ExprNode::Neg(inner) = arena.get(arg) {
                        out.push_str(" - ");
                        write_expr(arena, *inner, Prec::Mul, out);
                        continue;
                    }
                    out.push_str(" + ");
                }
                write_expr(arena, arg, Prec::Add, out);
            }
        }
        ExprNode::Mul(args) => {
            for (i, &arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push('*');
                }
                write_expr(arena, arg, Prec::Mul, out);
            }
        }
        ExprNode::Pow { base, exp } => {
            write_expr(arena, *base, Prec::Atom, out);
            out.push('^');
            write_expr(arena, *exp, Prec::Atom, out);
        }
        ExprNode::Neg(arg) => {
            out.push('-');
            write_expr(arena, *arg, Prec::Unary, out);
        }
        ExprNode::Div { num, den } => {
            write_expr(arena, *num, Prec::Mul, out);
            out.push('/');
            write_expr(arena, *den, Prec::Unary, out);
        }
        ExprNode::Call { func, args } => {
            if *func == BuiltinFn::Exp && args.len() == 1 {
                out.push_str("e^");
                write_expr(arena, args[0], Prec::Atom, out);
            } else {
                out.push_str(func.name());
                out.push('(');
                for (i, &arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_expr(arena, arg, Prec::Add, out);
                }
                out.push(')');
            }
        }
    }

    if needs_parens {
        out.push(')');
    }
}

fn prec_of(node: &ExprNode) -> Prec {
    match node {
        ExprNode::Add(_) => Prec::Add,
        ExprNode::Mul(_) | ExprNode::Div { .. } => Prec::Mul,
        ExprNode::Neg(_) => Prec::Unary,
        ExprNode::Pow { .. } | ExprNode::Call { .. } => Prec::Pow,
        ExprNode::Integer(n) if *n < 0 => Prec::Unary,
        _ => Prec::Atom,
    }
}
