use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use campus_shared::errors::AppResult;
use campus_shared::middleware::StaffContext;
use campus_shared::types::api::ApiResponse;
use campus_shared::types::auth::RequestContext;

use crate::models::Certificate;
use crate::services::certificate_service::{self, CertificateDetails, GenerationReport};
use crate::AppState;

/// POST /activities/:id/certificates
/// Issue certificates for every present participant of the activity.
pub async fn generate_for_activity(
    State(state): State<AppState>,
    StaffContext(ctx): StaffContext,
    Path(activity_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<GenerationReport>>> {
    let (report, warnings) = certificate_service::generate_for_activity(&state, &ctx, activity_id).await?;
    Ok(Json(ApiResponse::ok(report).with_warnings(warnings.into_vec())))
}

/// GET /certificates
pub async fn my_certificates(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Json<ApiResponse<Vec<Certificate>>>> {
    let certificates = certificate_service::list_for_user(&state, ctx.user_id)?;
    Ok(Json(ApiResponse::ok(certificates)))
}

/// GET /certificates/verify/:code
/// Public lookup used by the verification page.
pub async fn verify(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<CertificateDetails>>> {
    let details = certificate_service::verify(&state, &code)?;
    Ok(Json(ApiResponse::ok(details)))
}
