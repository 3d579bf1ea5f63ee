pub mod attendance_service;
pub mod certificate_service;
pub mod event_service;
pub mod notification_service;
pub mod registration_service;
pub mod reminder_service;

use std::fmt::Display;

use campus_shared::middleware::record_side_effect_failure;

/// Failures of best-effort side effects, collected for the response.
///
/// The primary mutation has already been committed when these are recorded;
/// the user sees the short message, the log gets the cause.
#[derive(Debug, Default)]
pub struct Warnings(Vec<String>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unwrap `result`, or log it, count it and keep `message` for the caller.
    pub fn capture<T, E: Display>(&mut self, kind: &'static str, message: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(kind, error = %e, "{message}");
                record_side_effect_failure(kind);
                self.0.push(message.to_string());
                None
            }
        }
    }

    pub fn extend(&mut self, other: Warnings) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}
