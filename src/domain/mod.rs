//! Core domain types and the VPPA analytics engine.
//!
//! Everything here is a pure function of its inputs: no I/O, no global state.

pub mod bar;
pub mod pivot;
pub mod range;
pub mod profile;
pub mod value_area;
pub mod vppa;
pub mod volume_stats;
pub mod universe;
pub mod config_validation;
pub mod error;
