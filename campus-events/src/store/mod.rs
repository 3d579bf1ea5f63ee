//! Query-and-mutate interface over the backing tables.
//!
//! The workflow modules only talk to [`Store`]; [`PgStore`] is the
//! implementation the binary runs on. Test builds add an in-process
//! `MemoryStore` with injectable failures. Methods are synchronous, like the
//! diesel calls underneath, and make no atomicity promise across calls.

#[cfg(test)]
mod memory;
mod pg;

#[cfg(test)]
pub use memory::{FailPoint, MemoryStore};
pub use pg::PgStore;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use campus_shared::errors::AppResult;

use crate::models::{
    Activity, Certificate, Event, NewActivity, NewCertificate, NewEvent, NewNotification,
    NewParticipation, NewPublicRegistration, NewRegistration, Notification, Participation,
    PublicRegistration, Registration, User,
};

pub trait Store: Send + Sync {
    /// Round trip to the backing store, for health checks.
    fn ping(&self) -> AppResult<()>;

    // Users (owned by the identity provider, read-only here)
    fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;

    // Events and activities
    fn insert_event(&self, new: NewEvent) -> AppResult<Event>;
    fn find_event(&self, id: Uuid) -> AppResult<Option<Event>>;
    fn list_events(&self, limit: i64, offset: i64) -> AppResult<(Vec<Event>, i64)>;
    /// Events with `from <= starts_at < to`.
    fn events_starting_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> AppResult<Vec<Event>>;
    fn insert_activity(&self, new: NewActivity) -> AppResult<Activity>;
    fn find_activity(&self, id: Uuid) -> AppResult<Option<Activity>>;
    fn list_activities(&self, event_id: Uuid) -> AppResult<Vec<Activity>>;

    // Registrations
    fn find_registration(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<Registration>>;
    fn insert_registration(&self, new: NewRegistration) -> AppResult<Registration>;
    fn registered_users(&self, event_id: Uuid) -> AppResult<Vec<User>>;
    fn insert_public_registration(&self, new: NewPublicRegistration) -> AppResult<PublicRegistration>;

    // Participations
    fn find_participation(&self, id: Uuid) -> AppResult<Option<Participation>>;
    fn find_user_participation(&self, activity_id: Uuid, user_id: Uuid) -> AppResult<Option<Participation>>;
    fn list_participations(&self, activity_id: Uuid) -> AppResult<Vec<Participation>>;
    fn insert_participation(&self, new: NewParticipation) -> AppResult<Participation>;
    /// Unconditional write; the last caller wins.
    fn set_presence(&self, id: Uuid, present: bool) -> AppResult<Participation>;
    fn set_feedback(&self, id: Uuid, rating: Option<i16>, feedback: Option<String>) -> AppResult<Participation>;

    // Certificates
    fn find_certificates(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<Vec<Certificate>>;
    fn insert_certificate(&self, new: NewCertificate) -> AppResult<Certificate>;
    /// Delete every certificate for the pair and return the removed ids.
    fn delete_certificates(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<Vec<Uuid>>;
    fn find_certificate_by_code(&self, code: &str) -> AppResult<Option<Certificate>>;
    fn list_user_certificates(&self, user_id: Uuid) -> AppResult<Vec<Certificate>>;
    fn count_activity_certificates(&self, activity_id: Uuid) -> AppResult<i64>;

    // Notifications
    fn insert_notification(&self, new: NewNotification) -> AppResult<Notification>;
    fn list_notifications(&self, user_id: Uuid, limit: i64, offset: i64) -> AppResult<(Vec<Notification>, i64)>;
    fn count_unread(&self, user_id: Uuid) -> AppResult<i64>;
    /// Mark read only when the notification belongs to `user_id`.
    fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Notification>>;
    fn mark_all_read(&self, user_id: Uuid) -> AppResult<usize>;
}
