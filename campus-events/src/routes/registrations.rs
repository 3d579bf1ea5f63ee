use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use campus_shared::errors::AppResult;
use campus_shared::middleware::StaffContext;
use campus_shared::types::api::ApiResponse;
use campus_shared::types::auth::RequestContext;

use crate::models::{Participation, Registration};
use crate::services::registration_service::{
    self, ActivityStats, FeedbackRequest, PublicRegistrationRequest, PublicRegistrationResult,
};
use crate::AppState;

/// POST /events/:id/registrations
pub async fn register_for_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(event_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Registration>>> {
    let (registration, warnings) = registration_service::register_for_event(&state, &ctx, event_id).await?;
    Ok(Json(
        ApiResponse::ok_with_message(registration, "registration confirmed").with_warnings(warnings.into_vec()),
    ))
}

/// POST /events/:id/public-registrations
/// Walk-in sign-up; no account required.
pub async fn register_public(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<PublicRegistrationRequest>,
) -> AppResult<Json<ApiResponse<PublicRegistrationResult>>> {
    let result = registration_service::register_public(&state, event_id, req)?;
    Ok(Json(ApiResponse::ok(result)))
}

/// POST /activities/:id/participations
pub async fn enroll(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(activity_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Participation>>> {
    let participation = registration_service::enroll_in_activity(&state, &ctx, activity_id)?;
    Ok(Json(ApiResponse::ok(participation)))
}

/// GET /activities/:id/stats
pub async fn activity_stats(
    State(state): State<AppState>,
    StaffContext(_ctx): StaffContext,
    Path(activity_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ActivityStats>>> {
    Ok(Json(ApiResponse::ok(registration_service::activity_stats(&state, activity_id)?)))
}

/// PATCH /participations/:id/feedback
pub async fn submit_feedback(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(participation_id): Path<Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> AppResult<Json<ApiResponse<Participation>>> {
    let participation = registration_service::submit_feedback(&state, &ctx, participation_id, req)?;
    Ok(Json(ApiResponse::ok(participation)))
}
