//! Core error types shared by the concurrent skip list crate
//!
//! This crate is intentionally small: it holds the one error taxonomy the
//! skip list needs (construction-time configuration validation) so that it
//! can be reused without pulling in the full `skiplist` dependency tree.

pub mod error;

pub use error::{Error, Result};
