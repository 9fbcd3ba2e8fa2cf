//! Property-based tests for decomposition and factorization.
