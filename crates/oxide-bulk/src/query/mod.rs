//! Query building types.
//!
//! This module provides Q objects for filtering.

mod filter;

pub use filter::{CompareOp, FilterExpr, Q};
pub(crate) use filter::FilterWriter;
