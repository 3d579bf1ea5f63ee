//! Building blocks shared by the campus services: response envelopes, the
//! error taxonomy, request context extraction, tracing/metrics setup and the
//! database and e-mail clients.

pub mod clients;
pub mod errors;
pub mod middleware;
pub mod types;

pub use errors::{AppError, AppResult, ErrorCode};
pub use types::*;
