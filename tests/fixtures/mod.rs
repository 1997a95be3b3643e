//! Test fixtures for canvass-planner.
//!
//! Provides realistic test data:
//! - Addresses along real Toronto residential streets
//! - Request builders

#![allow(dead_code)]

pub mod toronto_streets;

pub use toronto_streets::*;
