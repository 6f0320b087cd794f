//! Metron: unit-of-measure catalog with dimensional conversion
//!
//! A catalog of units grouped by dimension, admin-defined affine
//! conversion rules, and an engine that resolves conversions between
//! any connected units in exact decimal arithmetic.

pub mod catalog;
pub mod cli;
pub mod convert;
pub mod core;
