//! Core types and utilities for sitepulse.
//!
//! This crate provides the foundational types used throughout the visitor
//! counter service:
//!
//! - **Identifiers**: validated visitor session tokens and counters row IDs
//! - **Clocks**: an injectable time source so expiry and day rollover are testable
//!
//! # Example
//!
//! ```
//! use sitepulse_core::{Clock, CountersId, SystemClock, VisitorSessionId};
//!
//! // Tokens come from the browser and are validated on parse
//! let session_id = VisitorSessionId::parse("b3f1c2d4-visitor").unwrap();
//!
//! // Counters rows get server-generated IDs
//! let counters_id = CountersId::generate();
//!
//! let now = SystemClock.now();
//! # let _ = (session_id, counters_id, now);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod ids;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::{CountersId, IdError, VisitorSessionId, MAX_SESSION_TOKEN_LEN};
