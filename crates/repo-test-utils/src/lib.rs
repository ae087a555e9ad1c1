//! Shared test utilities for the repository generator workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`fixtures`]: package, version and source data builders
//! - [`output`]: [`output::TestOutput`], a temporary publish directory with assertions

pub mod fixtures;
pub mod output;
