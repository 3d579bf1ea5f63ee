pub mod config;
pub mod feed;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use campus_shared::clients::email::Mailer;
use campus_shared::middleware::metrics_middleware;
use campus_shared::types::auth::JwtSecret;

use crate::config::AppConfig;
use crate::feed::ChangeFeed;
use crate::store::Store;

/// Shared handles for handlers and workflows. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub feed: ChangeFeed,
    pub jwt_secret: JwtSecret,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> Self {
        let jwt_secret = JwtSecret::new(&config.jwt_secret);
        Self {
            config: Arc::new(config),
            store,
            mailer,
            feed: ChangeFeed::new(),
            jwt_secret,
            metrics_handle: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}

impl FromRef<AppState> for JwtSecret {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_secret.clone()
    }
}

pub fn router(state: AppState) -> Router {
    use routes::{attendance, certificates, changes, events, health, notifications, registrations, reminders};

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        // Events and activities
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id/activities", post(events::create_activity))
        .route("/events/:id/registrations", post(registrations::register_for_event))
        .route("/events/:id/public-registrations", post(registrations::register_public))
        .route("/activities/:id/participations", post(registrations::enroll))
        .route("/activities/:id/stats", get(registrations::activity_stats))
        .route("/activities/:id/certificates", post(certificates::generate_for_activity))
        // Attendance
        .route("/participations/:id/presence", patch(attendance::toggle_presence))
        .route("/participations/:id/feedback", patch(registrations::submit_feedback))
        // Certificates
        .route("/certificates", get(certificates::my_certificates))
        .route("/certificates/verify/:code", get(certificates::verify))
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/mark-all-read", post(notifications::mark_all_read))
        .route("/notifications/:id/read", post(notifications::mark_read))
        .route("/internal/reminders/run", post(reminders::run_reminders))
        .route("/changes", get(changes::stream_changes))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
