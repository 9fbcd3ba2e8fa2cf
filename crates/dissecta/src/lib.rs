//! # Dissecta
//!
//! Structure analysis for symbolic expressions.
//!
//! Dissecta classifies an expression's shape and transcendental family,
//! decomposes it recursively into a loss-free tree of typed components,
//! and factors two-term exponential sums into a common-factor form with
//! symbolic verification.
//!
//! ## Quick Start
//!
//! ```rust
//! use dissecta::prelude::*;
//!
//! let mut arena = ExprArena::new();
//! let x = arena.symbol("x");
//! let e1 = arena.exp_of(x);
//! let two = arena.integer(2);
//! let two_x = arena.mul([two, x]);
//! let e2 = arena.exp_of(two_x);
//! let sum = arena.add([e1, e2]);
//!
//! let report = analyze(&mut arena, sum, x).unwrap();
//! // e^x + e^(2x) factors as e^x * (1 + e^x)
//! assert_eq!(report.shape, ShapeTag::Product);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use dissecta_core as core;
pub use dissecta_structure as structure;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use dissecta_core::{equivalent, normalize, ExprArena, ExprHandle, ExprNode, Q};
    pub use dissecta_structure::{
        analyze, factor_exponential_sum, Component, DecompositionEngine, FactorizationResult,
        SemanticTag, ShapeTag, StructureClassifier, StructureReport, TypedComponent,
    };
}
