//! # Crusia API
//!
//! The HTTP surface of the save service.
//!
//! ## Routes
//!
//! | Method | Path               | Auth | Response                    |
//! |--------|--------------------|------|-----------------------------|
//! | GET    | `/version`         | no   | current save version (int)  |
//! | GET    | `/crossdomain.xml` | no   | cross-domain policy XML     |
//! | POST   | `/login`           | no   | token (JSON string)         |
//! | POST   | `/register`        | no   | empty 200                   |
//! | POST   | `/save/get`        | yes  | save payload (JSON string)  |
//! | POST   | `/save/set`        | yes  | empty 200                   |
//!
//! Authenticated routes read the token from `X-Authorization` (or
//! `Authorization: Bearer ..`) and are rejected with 401 before any handler
//! runs when it does not resolve to an existing user.
//!
//! Errors are returned as `{"status": <code>, "error": "<kind>"}` with no
//! further detail.
//!
//! Everything the handlers need from the process is reached through the
//! [`Capabilities`] trait, so the router can be driven against any backend.

pub mod auth;
pub mod capabilities;
pub mod error;
pub mod handlers;
pub mod http;
pub mod models;
pub mod state;
pub mod telemetry;

pub use capabilities::Capabilities;
pub use error::{ApiError, ApiErrorKind};
pub use http::router;
pub use models::Credentials;
pub use state::AppState;
pub use telemetry::{CorrelationId, CORRELATION_ID_HEADER};
