//! Utility functions for testing and evaluating fingerprints.
//!
//! # Modules
//!
//! - [`comparison`] - Fingerprint similarity measures
//! - [`generation`] - Synthetic test signal generation

pub mod comparison;
pub mod generation;

pub use comparison::*;
pub use generation::*;
