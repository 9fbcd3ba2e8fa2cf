//! # dissecta-structure
//!
//! Structure classification and typed decomposition of symbolic
//! expressions.
//!
//! Given an expression and a target variable, this crate answers three
//! questions:
//! - What is its top-level shape (sum, product, quotient, power, atom)?
//! - What transcendental family does it belong to (polynomial, trig,
//!   exponential, logarithmic, mixed)?
//! - How does it split into meaningful sub-terms?
//!
//! The decomposition is loss-free: recombining a component's children
//! according to its shape reproduces the parent term under symbolic
//! equality. A specialized rewrite factors two-term exponential sums
//! `c1*b^(k1*x) + c2*b^(k2*x)` into a common-factor-times-residual form,
//! verified symbolically before it is ever reported.
//!
//! Entry point: [`analyze`], which returns a [`StructureReport`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod classifier;
pub mod components;
pub mod decompose;
pub mod factor;
pub mod report;
pub mod stop;

mod proptests;

pub use classifier::{SemanticTag, ShapeTag, StructureClassifier};
pub use components::{ExponentialLeaf, GenericLeaf, LogLeaf, PolynomialLeaf, TrigLeaf, TypedComponent};
pub use decompose::{Component, DecompositionEngine};
pub use factor::{factor_exponential_sum, FactorizationResult};
pub use report::{analyze, StructureError, StructureReport};
pub use stop::should_stop;
