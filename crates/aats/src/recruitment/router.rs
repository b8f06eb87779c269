use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{ApplicationId, Caller, JobId, JobStatus, Role, UserId};
use super::eligibility::Ineligibility;
use super::evaluation::EvaluationSubmission;
use super::lifecycle::WriteOutcome;
use super::repository::Upsert;
use super::service::{
    ApplicationQuery, ApplicationSubmission, ErrorKind, JobDraft, JobUpdate, NoteDraft,
    RecruitmentError, RecruitmentService, StatusUpdate,
};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

type SharedService = Arc<RecruitmentService>;

/// Router builder exposing the recruitment endpoints.
pub fn recruitment_router(service: SharedService) -> Router {
    Router::new()
        .route(
            "/api/v1/applications",
            post(submit_handler).get(list_handler),
        )
        .route("/api/v1/applications/:application_id", get(detail_handler))
        .route(
            "/api/v1/applications/:application_id/status",
            patch(status_handler),
        )
        .route(
            "/api/v1/applications/:application_id/evaluation",
            post(evaluate_handler).get(evaluation_handler),
        )
        .route(
            "/api/v1/applications/:application_id/notes",
            post(add_note_handler).get(notes_handler),
        )
        .route("/api/v1/jobs", get(jobs_handler).post(create_job_handler))
        .route("/api/v1/jobs/:job_id", get(job_handler).put(update_job_handler))
        .route(
            "/api/v1/applicants/:applicant_id/eligibility",
            get(eligibility_handler),
        )
        .with_state(service)
}

/// Identity forwarded by the upstream authenticator.
#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers).map_err(|reason| {
            let payload = json!({
                "error": reason,
                "kind": "UNAUTHENTICATED",
            });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        })
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, String> {
    let id = header_value(headers, USER_ID_HEADER)
        .ok_or_else(|| format!("missing {USER_ID_HEADER} header"))?;
    let role = header_value(headers, USER_ROLE_HEADER)
        .ok_or_else(|| format!("missing {USER_ROLE_HEADER} header"))?
        .parse::<Role>()
        .map_err(|err| err.to_string())?;

    Ok(Caller::new(id, role))
}

impl IntoResponse for RecruitmentError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = match kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::DuplicateActiveApplication => StatusCode::CONFLICT,
            ErrorKind::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::TooManyActive
            | ErrorKind::RejectionCooldown
            | ErrorKind::HireCooldown
            | ErrorKind::EvaluationRequired
            | ErrorKind::InvalidEvaluator
            | ErrorKind::EvaluationNotAllowedYet
            | ErrorKind::InvalidScore
            | ErrorKind::InvalidRequest => StatusCode::UNPROCESSABLE_ENTITY,
        };

        let message = if kind == ErrorKind::StorageFailure {
            error!(error = %self, "recruitment storage failure");
            "internal storage failure".to_string()
        } else {
            self.to_string()
        };

        let mut payload = json!({
            "error": message,
            "kind": kind.code(),
        });
        if let (Some(body), RecruitmentError::Ineligible(reason)) = (payload.as_object_mut(), &self)
        {
            match reason {
                Ineligibility::TooManyActive { active, limit } => {
                    body.insert("active".into(), json!(active));
                    body.insert("limit".into(), json!(limit));
                }
                Ineligibility::DuplicateActiveApplication { status } => {
                    if let Some(status) = status {
                        body.insert("existing_status".into(), json!(status));
                    }
                }
                Ineligibility::RejectionCooldown {
                    eligible_at,
                    stage,
                    waiting_months,
                } => {
                    body.insert("eligible_at".into(), json!(eligible_at));
                    body.insert("stage".into(), json!(stage));
                    body.insert("waiting_months".into(), json!(waiting_months));
                }
                Ineligibility::HireCooldown {
                    eligible_at,
                    hired_job_id,
                } => {
                    body.insert("eligible_at".into(), json!(eligible_at));
                    body.insert("hired_job_id".into(), json!(hired_job_id));
                }
            }
        }

        (status, Json(payload)).into_response()
    }
}

/// Success body for a write whose side effects may have partially failed.
fn committed<T: Serialize>(status: StatusCode, outcome: WriteOutcome<T>) -> Response {
    let (value, warning) = outcome.into_parts();
    let mut body = match serde_json::to_value(&value) {
        Ok(body) => body,
        Err(err) => {
            error!(error = %err, "failed to serialize response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    if let (Some(object), Some(warning)) = (body.as_object_mut(), warning) {
        object.insert("warning".into(), json!(warning));
    }
    (status, Json(body)).into_response()
}

pub(crate) async fn submit_handler(
    State(service): State<SharedService>,
    caller: Caller,
    Json(submission): Json<ApplicationSubmission>,
) -> Response {
    match service.submit(&caller, submission).await {
        Ok(outcome) => committed(StatusCode::CREATED, outcome),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_handler(
    State(service): State<SharedService>,
    caller: Caller,
    Query(query): Query<ApplicationQuery>,
) -> Response {
    match service.list_applications(&caller, query).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn detail_handler(
    State(service): State<SharedService>,
    caller: Caller,
    Path(application_id): Path<String>,
) -> Response {
    let id = ApplicationId(application_id);
    match service.application_detail(&caller, &id).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn status_handler(
    State(service): State<SharedService>,
    caller: Caller,
    Path(application_id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Response {
    let id = ApplicationId(application_id);
    match service.update_status(&caller, &id, update).await {
        Ok(outcome) => committed(StatusCode::OK, outcome),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn evaluate_handler(
    State(service): State<SharedService>,
    caller: Caller,
    Path(application_id): Path<String>,
    Json(submission): Json<EvaluationSubmission>,
) -> Response {
    let id = ApplicationId(application_id);
    match service.upsert_evaluation(&caller, &id, submission).await {
        Ok(Upsert::Created(evaluation)) => {
            (StatusCode::CREATED, Json(evaluation)).into_response()
        }
        Ok(Upsert::Updated(evaluation)) => (StatusCode::OK, Json(evaluation)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn evaluation_handler(
    State(service): State<SharedService>,
    caller: Caller,
    Path(application_id): Path<String>,
) -> Response {
    let id = ApplicationId(application_id);
    match service.evaluation(&caller, &id).await {
        Ok(evaluation) => (StatusCode::OK, Json(evaluation)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn add_note_handler(
    State(service): State<SharedService>,
    caller: Caller,
    Path(application_id): Path<String>,
    Json(draft): Json<NoteDraft>,
) -> Response {
    let id = ApplicationId(application_id);
    match service.add_note(&caller, &id, draft).await {
        Ok(note) => (StatusCode::CREATED, Json(note)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn notes_handler(
    State(service): State<SharedService>,
    caller: Caller,
    Path(application_id): Path<String>,
) -> Response {
    let id = ApplicationId(application_id);
    match service.notes(&caller, &id).await {
        Ok(notes) => (StatusCode::OK, Json(json!({ "items": notes }))).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobListQuery {
    #[serde(default)]
    status: Option<JobStatus>,
}

pub(crate) async fn jobs_handler(
    State(service): State<SharedService>,
    Query(query): Query<JobListQuery>,
) -> Response {
    match service.jobs(query.status).await {
        Ok(jobs) => (StatusCode::OK, Json(json!({ "items": jobs }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn job_handler(
    State(service): State<SharedService>,
    Path(job_id): Path<String>,
) -> Response {
    match service.job(&JobId(job_id)).await {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn create_job_handler(
    State(service): State<SharedService>,
    caller: Caller,
    Json(draft): Json<JobDraft>,
) -> Response {
    match service.create_job(&caller, draft).await {
        Ok(job) => (StatusCode::CREATED, Json(job)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn update_job_handler(
    State(service): State<SharedService>,
    caller: Caller,
    Path(job_id): Path<String>,
    Json(update): Json<JobUpdate>,
) -> Response {
    match service.update_job(&caller, &JobId(job_id), update).await {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EligibilityQuery {
    job_id: JobId,
}

pub(crate) async fn eligibility_handler(
    State(service): State<SharedService>,
    caller: Caller,
    Path(applicant_id): Path<String>,
    Query(query): Query<EligibilityQuery>,
) -> Response {
    let applicant_id = UserId(applicant_id);
    match service
        .check_eligibility(&caller, &applicant_id, &query.job_id)
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => err.into_response(),
    }
}
