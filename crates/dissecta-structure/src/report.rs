//! The analysis entry point and its report type.

use thiserror::Error;

use dissecta_core::{ExprArena, ExprHandle, ExprNode, SymbolId};

use crate::classifier::{SemanticTag, ShapeTag};
use crate::decompose::{Component, DecompositionEngine};

/// The externally consumed result of a structure analysis.
///
/// A plain value object: tags of the root expression plus its top-level
/// components. When the root is itself a leaf, `components` holds that
/// single component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureReport {
    /// The root expression's shape.
    pub shape: ShapeTag,
    /// The root expression's semantic family.
    pub semantic: SemanticTag,
    /// The top-level components.
    pub components: Vec<Component>,
}

impl StructureReport {
    /// Returns true if the analysis found no way to split the input.
    #[must_use]
    pub fn is_single_leaf(&self) -> bool {
        self.components.len() == 1 && self.components[0].is_leaf()
    }
}

/// Caller contract violations surfaced at the analysis boundary.
///
/// Everything else the engine encounters degrades gracefully; only a
/// malformed call fails fast.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    /// The variable argument did not refer to a symbol.
    #[error("target variable is not a symbol expression")]
    VariableNotSymbol,
}

/// Analyzes the structure of `expr` with respect to the variable given as
/// a symbol expression.
///
/// # Errors
///
/// Returns [`StructureError::VariableNotSymbol`] if `variable` is not a
/// `Symbol` node.
pub fn analyze(
    arena: &mut ExprArena,
    expr: ExprHandle,
    variable: ExprHandle,
) -> Result<StructureReport, StructureError> {
    let var_id = symbol_id(arena, variable)?;

    let mut engine = DecompositionEngine::new(arena, var_id);
    let root = engine.decompose(expr);

    let (shape, semantic) = (root.shape, root.semantic);
    let components = if root.is_leaf() {
        vec![root]
    } else {
        root.children
    };

    Ok(StructureReport {
        shape,
        semantic,
        components,
    })
}

fn symbol_id(arena: &ExprArena, variable: ExprHandle) -> Result<SymbolId, StructureError> {
    match arena.get(variable) {
        ExprNode::Symbol(id) => Ok(*id),
        _ => Err(StructureError::VariableNotSymbol),
    }
}
