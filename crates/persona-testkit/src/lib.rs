//! Persona Testing Infrastructure
//!
//! Common fixtures for tests across the persona crates: a sample role
//! catalog with matching behaviours, an in-memory durable property store
//! with failure injection, assertion macros for the error taxonomy, and
//! test logging setup.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! Add this to your crate's `Cargo.toml` dev-dependencies:
//! ```toml
//! [dev-dependencies]
//! persona-testkit = { path = "../persona-testkit" }
//! ```
//!
//! Then in your tests:
//! ```rust,no_run
//! use persona_testkit::*;
//!
//! #[test]
//! fn my_test() {
//!     init_tracing();
//!     let composer = sample_composer();
//!     let person = composer.compose_new(&[role("Person")]).unwrap();
//!     // ... test logic
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod logging;
pub mod store;

pub use fixtures::*;
pub use logging::init_tracing;
pub use store::MemoryPropertyStore;
