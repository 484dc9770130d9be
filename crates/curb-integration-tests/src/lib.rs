//! Integration tests for the Curbside marketplace.
//!
//! See the `tests/` directory; this crate exists only to host them.

#![forbid(unsafe_code)]
