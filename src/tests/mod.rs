//! Pipeline-level tests wiring several modules together.

pub mod support;
