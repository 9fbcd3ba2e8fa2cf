//! Property-based tests for rational arithmetic and normalization.
