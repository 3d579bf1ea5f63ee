use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campus_shared::errors::AppResult;
use campus_shared::middleware::StaffContext;
use campus_shared::types::api::ApiResponse;

use crate::models::Participation;
use crate::services::attendance_service::{self, CertificateOutcome, PresenceToggle};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TogglePresenceRequest {
    pub current_presence: bool,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TogglePresenceResponse {
    pub participation: Participation,
    pub certificate: CertificateOutcome,
}

/// PATCH /participations/:id/presence
/// Flip presence; certificate and notification problems come back as warnings.
pub async fn toggle_presence(
    State(state): State<AppState>,
    StaffContext(ctx): StaffContext,
    Path(id): Path<Uuid>,
    Json(req): Json<TogglePresenceRequest>,
) -> AppResult<Json<ApiResponse<TogglePresenceResponse>>> {
    let outcome = attendance_service::toggle_presence(
        &state,
        &ctx,
        PresenceToggle {
            participation_id: id,
            current_presence: req.current_presence,
            user_id: req.user_id,
        },
    )
    .await?;

    let message = match &outcome.certificate {
        CertificateOutcome::Generated { .. } => "presence confirmed, certificate generated",
        CertificateOutcome::AlreadyExisted => "presence confirmed, certificate already existed",
        CertificateOutcome::Revoked { .. } => "presence removed",
        CertificateOutcome::NotApplicable => "presence updated",
        CertificateOutcome::Failed if outcome.participation.present => "presence confirmed, error generating certificate",
        CertificateOutcome::Failed => "presence removed, error removing certificate",
    };

    let response = TogglePresenceResponse {
        participation: outcome.participation,
        certificate: outcome.certificate,
    };

    Ok(Json(
        ApiResponse::ok_with_message(response, message).with_warnings(outcome.warnings.into_vec()),
    ))
}
