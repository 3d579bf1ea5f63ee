use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use campus_shared::types::auth::UserRole;

use crate::schema::{
    activities, certificates, events, notifications, participations, public_registrations,
    registrations, users,
};

// --- User ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Option<UserRole> {
        self.role.parse().ok()
    }
}

// --- Event ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = events)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub hours: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = events)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub hours: i32,
    pub created_by: Uuid,
}

// --- Activity ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = activities)]
pub struct Activity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub hours: i32,
    pub certificate_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = activities)]
pub struct NewActivity {
    pub event_id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub hours: i32,
    pub certificate_type: Option<String>,
}

// --- Registration ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = registrations)]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = registrations)]
pub struct NewRegistration {
    pub event_id: Uuid,
    pub user_id: Uuid,
}

// --- Public (walk-in) registration ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = public_registrations)]
pub struct PublicRegistration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = public_registrations)]
pub struct NewPublicRegistration {
    pub event_id: Uuid,
    pub full_name: String,
    pub email: String,
}

// --- Participation ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = participations)]
pub struct Participation {
    pub id: Uuid,
    pub activity_id: Uuid,
    /// `None` for walk-in participants, who never receive certificates.
    pub user_id: Option<Uuid>,
    pub public_registration_id: Option<Uuid>,
    pub present: bool,
    pub rating: Option<i16>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = participations)]
pub struct NewParticipation {
    pub activity_id: Uuid,
    pub user_id: Option<Uuid>,
    pub public_registration_id: Option<Uuid>,
    pub present: bool,
}

// --- Certificate ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = certificates)]
pub struct Certificate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub activity_id: Option<Uuid>,
    pub verification_code: String,
    pub certificate_type: String,
    pub hours: i32,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = certificates)]
pub struct NewCertificate {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub activity_id: Option<Uuid>,
    pub verification_code: String,
    pub certificate_type: String,
    pub hours: i32,
}

// --- Notification ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = notifications)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}
