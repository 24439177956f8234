//! vppa: volume profile, pivot anchored.
//!
//! Hexagonal architecture: the pure analytics engine lives in [`domain`], port
//! traits in [`ports`], concrete implementations in [`adapters`], and the
//! command-line front end in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod logging;
