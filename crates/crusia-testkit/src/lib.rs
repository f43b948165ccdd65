//! # Crusia Testkit
//!
//! Testing utilities for the Crusia save service.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: an in-memory service wired to the real router, plus the
//!   client half of the protocol (sealing saves, calling routes)
//! - **Generators**: Proptest strategies for property-based testing
//!
//! The end-to-end scenarios live in this crate's `tests/` directory.
//!
//! ## Test Fixtures
//!
//! ```rust
//! use crusia_testkit::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let body = fixture.seal(2, br#"{"x":1}"#);
//! assert!(!body.is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use crusia_testkit::generators::{plaintext, save_key};
//!
//! proptest! {
//!     #[test]
//!     fn seal_open(key in save_key(), pt in plaintext(256)) {
//!         let sealed = SealedPayload::seal(&pt, &key).unwrap();
//!         prop_assert_eq!(sealed.open(&key).unwrap(), pt);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{registry, secret_key, Reply, TestFixture, TestService};
