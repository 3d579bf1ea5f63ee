use chrono::{DateTime, Utc};
use metrics::counter;
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use campus_shared::errors::{AppError, AppResult, ErrorCode};
use campus_shared::types::auth::RequestContext;
use campus_shared::types::event::{ChangeEvent, Table};

use crate::models::{Activity, Certificate, NewCertificate};
use crate::services::{notification_service, Warnings};
use crate::AppState;

const DEFAULT_CERTIFICATE_TYPE: &str = "participation";
const SUFFIX_LEN: usize = 8;
const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `<prefix><millis in base 36><8 random base-36 chars>`, upper case.
pub fn generate_verification_code(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    format!("{prefix}{}{suffix}", to_base36(millis))
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[derive(Debug)]
pub enum IssueOutcome {
    Issued(Certificate),
    /// Number of certificates already on file for the pair.
    AlreadyExisted(usize),
}

/// Issue a certificate for (user, activity) unless one already exists.
///
/// The existence check and the insert are separate statements; two
/// concurrent confirmations can both pass the check.
pub fn issue_for_participant(state: &AppState, activity: &Activity, user_id: Uuid) -> AppResult<IssueOutcome> {
    let existing = state.store.find_certificates(user_id, activity.id)?;
    if !existing.is_empty() {
        tracing::debug!(user_id = %user_id, activity_id = %activity.id, "certificate already on file");
        return Ok(IssueOutcome::AlreadyExisted(existing.len()));
    }

    let certificate = state.store.insert_certificate(NewCertificate {
        user_id,
        event_id: activity.event_id,
        activity_id: Some(activity.id),
        verification_code: generate_verification_code(&state.config.certificate_code_prefix),
        certificate_type: activity
            .certificate_type
            .clone()
            .unwrap_or_else(|| DEFAULT_CERTIFICATE_TYPE.to_string()),
        hours: activity.hours,
    })?;

    counter!("certificates_issued_total").increment(1);
    state.feed.publish(ChangeEvent::insert(Table::Certificates, certificate.id).with_user(Some(user_id)));

    tracing::info!(
        certificate_id = %certificate.id,
        user_id = %user_id,
        activity_id = %activity.id,
        code = %certificate.verification_code,
        "certificate issued"
    );

    Ok(IssueOutcome::Issued(certificate))
}

/// Delete every certificate for (user, activity). Returns the removed ids;
/// an empty list is not an error.
pub fn revoke_for_participant(state: &AppState, user_id: Uuid, activity_id: Uuid) -> AppResult<Vec<Uuid>> {
    let removed = state.store.delete_certificates(user_id, activity_id)?;

    if !removed.is_empty() {
        counter!("certificates_revoked_total").increment(removed.len() as u64);
        for id in &removed {
            state.feed.publish(ChangeEvent::delete(Table::Certificates, *id).with_user(Some(user_id)));
        }
        tracing::info!(
            user_id = %user_id,
            activity_id = %activity_id,
            count = removed.len(),
            "certificates revoked"
        );
    }

    Ok(removed)
}

#[derive(Debug, Default, Serialize)]
pub struct GenerationReport {
    pub generated: usize,
    pub already_existed: usize,
    /// Enrolled users not yet marked present.
    pub pending: usize,
    pub skipped_guests: usize,
    pub failed: usize,
}

/// Issue certificates for every present, account-linked participant of an
/// activity. Per-participant failures are counted and reported, not raised.
pub async fn generate_for_activity(
    state: &AppState,
    ctx: &RequestContext,
    activity_id: Uuid,
) -> AppResult<(GenerationReport, Warnings)> {
    let activity = state
        .store
        .find_activity(activity_id)?
        .ok_or_else(|| AppError::new(ErrorCode::ActivityNotFound, "activity not found"))?;

    let mut report = GenerationReport::default();
    let mut warnings = Warnings::new();

    for participation in state.store.list_participations(activity.id)? {
        let Some(user_id) = participation.user_id else {
            if participation.present {
                report.skipped_guests += 1;
            }
            continue;
        };
        if !participation.present {
            report.pending += 1;
            continue;
        }

        match warnings.capture(
            "certificate_issue",
            "error generating certificate",
            issue_for_participant(state, &activity, user_id),
        ) {
            Some(IssueOutcome::Issued(certificate)) => {
                report.generated += 1;
                let user = warnings
                    .capture("notification", "could not load participant", state.store.find_user(user_id))
                    .flatten();
                if let Some(user) = user {
                    warnings.extend(
                        notification_service::notify_certificate_issued(state, &user, &activity, &certificate).await,
                    );
                }
            }
            Some(IssueOutcome::AlreadyExisted(_)) => report.already_existed += 1,
            None => report.failed += 1,
        }
    }

    tracing::info!(
        activity_id = %activity.id,
        requested_by = %ctx.user_id,
        generated = report.generated,
        already_existed = report.already_existed,
        pending = report.pending,
        skipped_guests = report.skipped_guests,
        failed = report.failed,
        "certificate generation finished"
    );

    Ok((report, warnings))
}

/// Public view of a certificate, resolved from its verification code.
#[derive(Debug, Serialize)]
pub struct CertificateDetails {
    pub verification_code: String,
    pub holder_name: Option<String>,
    pub event_title: Option<String>,
    pub activity_title: Option<String>,
    pub certificate_type: String,
    pub hours: i32,
    pub issued_at: DateTime<Utc>,
}

pub fn verify(state: &AppState, code: &str) -> AppResult<CertificateDetails> {
    let certificate = state
        .store
        .find_certificate_by_code(code.trim())?
        .ok_or_else(|| AppError::new(ErrorCode::CertificateNotFound, "no certificate with this verification code"))?;

    let holder_name = state.store.find_user(certificate.user_id)?.map(|u| u.full_name);
    let event_title = state.store.find_event(certificate.event_id)?.map(|e| e.title);
    let activity_title = match certificate.activity_id {
        Some(id) => state.store.find_activity(id)?.map(|a| a.title),
        None => None,
    };

    Ok(CertificateDetails {
        verification_code: certificate.verification_code,
        holder_name,
        event_title,
        activity_title,
        certificate_type: certificate.certificate_type,
        hours: certificate.hours,
        issued_at: certificate.issued_at,
    })
}

pub fn list_for_user(state: &AppState, user_id: Uuid) -> AppResult<Vec<Certificate>> {
    state.store.list_user_certificates(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FailPoint;
    use crate::testing::TestApp;
    use campus_shared::types::auth::UserRole;

    #[test]
    fn verification_codes_have_expected_shape() {
        let code = generate_verification_code("CERT-");
        let body = code.strip_prefix("CERT-").unwrap();

        assert!(body.len() > SUFFIX_LEN);
        assert!(body.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_ne!(code, generate_verification_code("CERT-"));
    }

    #[test]
    fn base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "ZZ");
    }

    #[test]
    fn issuing_twice_keeps_one_certificate() {
        let app = TestApp::new();
        let user = app.store.insert_user("Ana", None, UserRole::Student);
        let activity = app.activity("Rust Workshop");

        let first = issue_for_participant(&app.state, &activity, user.id).unwrap();
        let IssueOutcome::Issued(certificate) = first else {
            panic!("expected a new certificate");
        };
        assert_eq!(certificate.hours, activity.hours);
        assert_eq!(certificate.certificate_type, "participation");

        let second = issue_for_participant(&app.state, &activity, user.id).unwrap();
        assert!(matches!(second, IssueOutcome::AlreadyExisted(1)));
        assert_eq!(app.store.certificate_count(), 1);
    }

    #[test]
    fn revoking_nothing_is_not_an_error() {
        let app = TestApp::new();
        let activity = app.activity("Rust Workshop");
        assert!(revoke_for_participant(&app.state, Uuid::new_v4(), activity.id).unwrap().is_empty());
    }

    #[test]
    fn verify_resolves_holder_and_titles() {
        let app = TestApp::new();
        let user = app.store.insert_user("Ana Souza", None, UserRole::Student);
        let activity = app.activity("Rust Workshop");
        let IssueOutcome::Issued(certificate) = issue_for_participant(&app.state, &activity, user.id).unwrap() else {
            panic!("expected a new certificate");
        };

        let details = verify(&app.state, &certificate.verification_code).unwrap();
        assert_eq!(details.holder_name.as_deref(), Some("Ana Souza"));
        assert_eq!(details.activity_title.as_deref(), Some("Rust Workshop"));
        assert!(details.event_title.is_some());

        let err = verify(&app.state, "CERT-NOPE").unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::CertificateNotFound);
    }

    #[tokio::test]
    async fn batch_generation_counts_every_bucket() {
        let app = TestApp::new();
        let staff = app.staff();
        let activity = app.activity("Rust Workshop");

        let present = app.store.insert_user("Ana", Some("ana@uni.edu"), UserRole::Student);
        let absent = app.store.insert_user("Bruno", None, UserRole::Student);
        let certified = app.store.insert_user("Carla", None, UserRole::Student);
        app.participation(&activity, Some(present.id), true);
        app.participation(&activity, Some(absent.id), false);
        app.participation(&activity, Some(certified.id), true);
        app.participation(&activity, None, true);
        issue_for_participant(&app.state, &activity, certified.id).unwrap();

        let (report, warnings) = generate_for_activity(&app.state, &staff, activity.id).await.unwrap();
        assert_eq!(report.generated, 1);
        assert_eq!(report.already_existed, 1);
        assert_eq!(report.pending, 1);
        assert_eq!(report.skipped_guests, 1);
        assert_eq!(report.failed, 0);
        assert!(warnings.is_empty());
        assert_eq!(app.mailer.sent_to(), vec!["ana@uni.edu".to_string()]);
    }

    #[tokio::test]
    async fn batch_generation_reports_insert_failures() {
        let app = TestApp::new();
        let staff = app.staff();
        let activity = app.activity("Rust Workshop");
        let user = app.store.insert_user("Ana", None, UserRole::Student);
        app.participation(&activity, Some(user.id), true);
        app.store.fail(FailPoint::InsertCertificate);

        let (report, warnings) = generate_for_activity(&app.state, &staff, activity.id).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(warnings.into_vec(), vec!["error generating certificate".to_string()]);
    }

    #[tokio::test]
    async fn participant_lookup_failure_is_reported_as_warning() {
        let app = TestApp::new();
        let staff = app.staff();
        let activity = app.activity("Rust Workshop");
        let user = app.store.insert_user("Ana", Some("ana@uni.edu"), UserRole::Student);
        app.participation(&activity, Some(user.id), true);
        app.store.fail(FailPoint::FindUser);

        let (report, warnings) = generate_for_activity(&app.state, &staff, activity.id).await.unwrap();
        assert_eq!(report.generated, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(warnings.into_vec(), vec!["could not load participant".to_string()]);
        assert_eq!(app.store.certificate_count(), 1);
        assert!(app.mailer.sent_to().is_empty());
    }
}
