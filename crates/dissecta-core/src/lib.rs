//! # dissecta-core
//!
//! Expression substrate for the Dissecta structure-analysis engine.
//!
//! This crate provides:
//! - Arena-allocated expression storage with hash-consing
//! - Type-safe expression handles with O(1) structural equality
//! - Exact rational scalars for coefficient work
//! - Polynomial and affine-form introspection over expressions
//! - A normalization-based symbolic equality predicate
//! - Infix display and numeric evaluation
//!
//! ## Design Principles
//!
//! - **Data-Oriented Design**: Expressions stored contiguously in an arena
//! - **Hash-Consing**: Every structurally unique expression stored exactly once
//! - **Exactness**: All introspection returns exact rationals, never floats

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod display;
pub mod eval;
pub mod expr;
pub mod normal;
pub mod poly;
mod proptests;
pub mod rational;

pub use arena::ExprArena;
pub use expr::{BuiltinFn, ExprHandle, ExprNode, SymbolId};
pub use normal::{equivalent, normalize};
pub use rational::Q;
