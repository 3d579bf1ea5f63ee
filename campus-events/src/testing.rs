use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use campus_shared::clients::email::{MailError, Mailer};
use campus_shared::types::auth::{RequestContext, UserRole};

use crate::config::AppConfig;
use crate::models::{Activity, Event, NewActivity, NewEvent, NewParticipation, Participation};
use crate::store::{MemoryStore, Store};
use crate::AppState;

/// Mailer that keeps every message and can be told to fail.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn fail_sends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(to, _)| to.clone()).collect()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, s)| s.clone()).collect()
    }
}

#[axum::async_trait]
impl Mailer for RecordingMailer {
    async fn send_email(&self, to: &str, subject: &str, _html: &str) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Api { status: 503, body: "unavailable".into() });
        }
        self.sent.lock().unwrap().push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let config = AppConfig {
            jwt_secret: "test-secret".into(),
            public_base_url: "https://events.uni.edu".into(),
            ..AppConfig::default()
        };
        let state = AppState::new(config, store.clone(), mailer.clone());
        Self { state, store, mailer }
    }

    /// Context for a freshly seeded user with `role`.
    pub fn context(&self, role: UserRole) -> RequestContext {
        let user = self.store.insert_user(&format!("{role} user"), None, role);
        RequestContext::new(user.id, role)
    }

    pub fn staff(&self) -> RequestContext {
        self.context(UserRole::Professor)
    }

    pub fn bearer(&self, ctx: &RequestContext) -> String {
        let token = self.state.jwt_secret.issue(ctx.user_id, ctx.role, 3600).unwrap();
        format!("Bearer {token}")
    }

    pub fn event(&self, title: &str) -> Event {
        self.event_at(title, Utc::now() + Duration::days(14))
    }

    pub fn event_at(&self, title: &str, starts_at: DateTime<Utc>) -> Event {
        self.store
            .insert_event(NewEvent {
                title: title.to_string(),
                description: None,
                location: Some("Main auditorium".into()),
                starts_at,
                ends_at: starts_at + Duration::hours(4),
                hours: 4,
                created_by: Uuid::new_v4(),
            })
            .unwrap()
    }

    pub fn activity(&self, title: &str) -> Activity {
        let event = self.event("Science Week");
        self.store
            .insert_activity(NewActivity {
                event_id: event.id,
                title: title.to_string(),
                starts_at: event.starts_at,
                ends_at: event.starts_at + Duration::hours(2),
                hours: 2,
                certificate_type: None,
            })
            .unwrap()
    }

    pub fn participation(&self, activity: &Activity, user_id: Option<Uuid>, present: bool) -> Participation {
        self.store
            .insert_participation(NewParticipation {
                activity_id: activity.id,
                user_id,
                public_registration_id: None,
                present,
            })
            .unwrap()
    }
}
