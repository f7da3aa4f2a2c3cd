//! Stubnet - Session-scoped HTTP client stubbing for deterministic tests
//!
//! Attaches a fake transport to an otherwise real HTTP client handle so
//! outgoing calls are answered from declared stubs instead of the network.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::multiple_crate_versions
)]

pub mod client;
pub mod config;
pub mod error;
pub mod harness;
pub mod intercept;
pub mod record;
pub mod response;
pub mod session;
pub mod stub;

pub use client::StubClient;
pub use error::{Result, StubnetError};
pub use harness::Harness;
