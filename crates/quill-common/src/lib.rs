//! Common utilities for the Quill text layout crates.
//!
//! This crate provides shared infrastructure used by all Quill components:
//! - **Warning System** - structured `tracing` warnings with optional de-duplication

pub mod warning;
