//! Common utilities for the experiment binaries and the test suite.
//!
//! - **`lattice`**: builds synthetic Hermitian matrices (Anderson tight-binding models,
//!   shifted grid Laplacians) together with their exact spectra, so estimates can be
//!   checked against closed-form references.

pub mod lattice;
