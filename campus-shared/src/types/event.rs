use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tables whose row changes are pushed to change-feed subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Events,
    Activities,
    Registrations,
    PublicRegistrations,
    Participations,
    Certificates,
    Notifications,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Activities => "activities",
            Self::Registrations => "registrations",
            Self::PublicRegistrations => "public_registrations",
            Self::Participations => "participations",
            Self::Certificates => "certificates",
            Self::Notifications => "notifications",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "events" => Ok(Self::Events),
            "activities" => Ok(Self::Activities),
            "registrations" => Ok(Self::Registrations),
            "public_registrations" => Ok(Self::PublicRegistrations),
            "participations" => Ok(Self::Participations),
            "certificates" => Ok(Self::Certificates),
            "notifications" => Ok(Self::Notifications),
            other => Err(format!("unknown table: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

/// Row-level change notification.
///
/// ```json
/// {
///   "id": "chg_0190...",
///   "table": "participations",
///   "action": "update",
///   "record_id": "...",
///   "user_id": "...",
///   "created_at": "2025-06-15T14:22:33.123Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: String,
    pub table: Table,
    pub action: ChangeAction,
    pub record_id: Uuid,
    /// User the changed row belongs to, when there is one.
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(table: Table, action: ChangeAction, record_id: Uuid) -> Self {
        Self {
            id: format!("chg_{}", Uuid::now_v7()),
            table,
            action,
            record_id,
            user_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn insert(table: Table, record_id: Uuid) -> Self {
        Self::new(table, ChangeAction::Insert, record_id)
    }

    pub fn update(table: Table, record_id: Uuid) -> Self {
        Self::new(table, ChangeAction::Update, record_id)
    }

    pub fn delete(table: Table, record_id: Uuid) -> Self {
        Self::new(table, ChangeAction::Delete, record_id)
    }

    pub fn with_user(mut self, user_id: Option<Uuid>) -> Self {
        self.user_id = user_id;
        self
    }
}
