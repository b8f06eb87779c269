use chrono::{DateTime, Utc};

use crate::recruitment::domain::ApplicationStatus;
use crate::recruitment::eligibility::Ineligibility;
use crate::recruitment::evaluation::ScoreOutOfRange;
use crate::recruitment::lifecycle::GateViolation;
use crate::recruitment::repository::RepositoryError;

/// Error raised by the recruitment service.
#[derive(Debug, thiserror::Error)]
pub enum RecruitmentError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Ineligible(#[from] Ineligibility),
    #[error(transparent)]
    Gate(#[from] GateViolation),
    #[error("evaluations are only accepted from the interview stage onwards (current status: {status})")]
    EvaluationNotAllowedYet { status: ApplicationStatus },
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    InvalidScore(#[from] ScoreOutOfRange),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// Closed classification of every failure the core reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    TooManyActive,
    DuplicateActiveApplication,
    RejectionCooldown,
    HireCooldown,
    EvaluationRequired,
    InvalidEvaluator,
    EvaluationNotAllowedYet,
    Forbidden,
    InvalidScore,
    InvalidRequest,
    StorageFailure,
}

impl ErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::TooManyActive => "TOO_MANY_ACTIVE",
            ErrorKind::DuplicateActiveApplication => "DUPLICATE_ACTIVE_APPLICATION",
            ErrorKind::RejectionCooldown => "REJECTION_COOLDOWN",
            ErrorKind::HireCooldown => "HIRE_COOLDOWN",
            ErrorKind::EvaluationRequired => "EVALUATION_REQUIRED",
            ErrorKind::InvalidEvaluator => "INVALID_EVALUATOR",
            ErrorKind::EvaluationNotAllowedYet => "EVALUATION_NOT_ALLOWED_YET",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::InvalidScore => "INVALID_SCORE",
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::StorageFailure => "STORAGE_FAILURE",
        }
    }
}

impl RecruitmentError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RecruitmentError::NotFound { .. } => ErrorKind::NotFound,
            RecruitmentError::Ineligible(reason) => match reason {
                Ineligibility::TooManyActive { .. } => ErrorKind::TooManyActive,
                Ineligibility::DuplicateActiveApplication { .. } => {
                    ErrorKind::DuplicateActiveApplication
                }
                Ineligibility::RejectionCooldown { .. } => ErrorKind::RejectionCooldown,
                Ineligibility::HireCooldown { .. } => ErrorKind::HireCooldown,
            },
            RecruitmentError::Gate(GateViolation::EvaluationRequired { .. }) => {
                ErrorKind::EvaluationRequired
            }
            RecruitmentError::Gate(GateViolation::InvalidEvaluator { .. }) => {
                ErrorKind::InvalidEvaluator
            }
            RecruitmentError::EvaluationNotAllowedYet { .. } => ErrorKind::EvaluationNotAllowedYet,
            RecruitmentError::Forbidden(_) => ErrorKind::Forbidden,
            RecruitmentError::InvalidScore(_) => ErrorKind::InvalidScore,
            RecruitmentError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            RecruitmentError::Storage(_) => ErrorKind::StorageFailure,
        }
    }

    /// Instant after which retrying may succeed, for cooldown refusals.
    pub fn eligible_at(&self) -> Option<DateTime<Utc>> {
        match self {
            RecruitmentError::Ineligible(reason) => reason.eligible_at(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recruitment::domain::JobId;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn codes_follow_taxonomy() {
        let eligible_at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let cases = [
            (RecruitmentError::not_found("job", "job-9"), "NOT_FOUND"),
            (
                Ineligibility::HireCooldown {
                    eligible_at,
                    hired_job_id: JobId::from("job-1"),
                }
                .into(),
                "HIRE_COOLDOWN",
            ),
            (
                GateViolation::EvaluationRequired {
                    target: ApplicationStatus::Offer,
                }
                .into(),
                "EVALUATION_REQUIRED",
            ),
            (
                RepositoryError::Timeout(Duration::from_millis(5)).into(),
                "STORAGE_FAILURE",
            ),
            (RecruitmentError::forbidden("nope"), "FORBIDDEN"),
        ];

        for (error, code) in cases {
            assert_eq!(error.kind().code(), code, "{error}");
        }
    }

    #[test]
    fn only_cooldowns_expose_eligible_at() {
        let eligible_at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let cooldown: RecruitmentError = Ineligibility::RejectionCooldown {
            eligible_at,
            stage: crate::recruitment::eligibility::RejectionStage::Screening,
            waiting_months: 3,
        }
        .into();
        assert_eq!(cooldown.eligible_at(), Some(eligible_at));

        let cap: RecruitmentError = Ineligibility::TooManyActive {
            active: 5,
            limit: 5,
        }
        .into();
        assert_eq!(cap.eligible_at(), None);
    }
}
