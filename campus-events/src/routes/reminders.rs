use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use campus_shared::errors::AppResult;
use campus_shared::middleware::AdminContext;
use campus_shared::types::api::ApiResponse;

use crate::services::reminder_service::{self, ReminderReport};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RunRemindersQuery {
    /// Reference day (UTC); defaults to today.
    pub date: Option<NaiveDate>,
}

/// POST /internal/reminders/run
/// Meant for a daily scheduler.
pub async fn run_reminders(
    State(state): State<AppState>,
    AdminContext(ctx): AdminContext,
    Query(query): Query<RunRemindersQuery>,
) -> AppResult<Json<ApiResponse<ReminderReport>>> {
    let reference = query.date.unwrap_or_else(|| Utc::now().date_naive());
    tracing::info!(reference = %reference, requested_by = %ctx.user_id, "running event reminders");

    let (report, warnings) = reminder_service::run_reminders(&state, reference).await?;
    Ok(Json(ApiResponse::ok(report).with_warnings(warnings.into_vec())))
}
