//! Re-application eligibility.
//!
//! Pure decision logic: callers gather the applicant's applications, the
//! rejection facts for the relevant application, and the latest hire, then ask
//! the engine whether a new submission is permitted at a given instant. The
//! list view reuses the same cooldown computation so both paths agree.

mod policy;
mod rules;

pub use policy::EligibilityPolicy;
pub(crate) use rules::add_months;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationStatus, JobId, TimelineEntry};

/// How far the rejected application got, which decides the waiting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionStage {
    #[serde(rename = "screening")]
    Screening,
    #[serde(rename = "post-interview")]
    PostInterview,
}

impl RejectionStage {
    pub const fn label(self) -> &'static str {
        match self {
            RejectionStage::Screening => "screening",
            RejectionStage::PostInterview => "post-interview",
        }
    }
}

/// Timeline-derived facts about a rejected application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectionFacts {
    pub rejected_at: DateTime<Utc>,
    pub interviewed_before: bool,
}

impl RejectionFacts {
    /// When the rejection happened: the latest `rejected` timeline entry, or
    /// the application's `updated_at` when the timeline has none.
    pub fn rejected_at(
        application: &Application,
        latest_rejection: Option<&TimelineEntry>,
    ) -> DateTime<Utc> {
        latest_rejection
            .map(|entry| entry.occurred_at)
            .unwrap_or(application.updated_at)
    }
}

/// Waiting period that follows a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CooldownWindow {
    pub stage: RejectionStage,
    pub waiting_months: u32,
    pub eligible_at: DateTime<Utc>,
}

/// Everything the engine needs to judge one submission.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityInput<'a> {
    pub job_id: &'a JobId,
    pub applications: &'a [Application],
    /// Facts for the most recent application to `job_id`, when it was rejected.
    pub same_job_rejection: Option<RejectionFacts>,
    /// Most recently updated `hired` application across every job.
    pub latest_hire: Option<&'a Application>,
}

/// Why a submission is refused right now.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Ineligibility {
    #[error("applicant already has {active} open applications (limit {limit})")]
    TooManyActive { active: usize, limit: usize },
    #[error("an application for this job is already in progress")]
    DuplicateActiveApplication { status: Option<ApplicationStatus> },
    #[error(
        "previous application was rejected ({}); re-apply after {eligible_at} ({waiting_months} month wait)",
        .stage.label()
    )]
    RejectionCooldown {
        eligible_at: DateTime<Utc>,
        stage: RejectionStage,
        waiting_months: u32,
    },
    #[error("applicant was hired for job {hired_job_id}; other jobs open after {eligible_at}")]
    HireCooldown {
        eligible_at: DateTime<Utc>,
        hired_job_id: JobId,
    },
}

impl Ineligibility {
    pub fn eligible_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Ineligibility::RejectionCooldown { eligible_at, .. }
            | Ineligibility::HireCooldown { eligible_at, .. } => Some(*eligible_at),
            Ineligibility::TooManyActive { .. }
            | Ineligibility::DuplicateActiveApplication { .. } => None,
        }
    }
}

/// Re-application hints attached to every application in a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReapplyAnnotation {
    pub can_reapply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_reapply_at: Option<DateTime<Utc>>,
    pub waiting_months: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_stage: Option<RejectionStage>,
}

impl ReapplyAnnotation {
    const BLOCKED: ReapplyAnnotation = ReapplyAnnotation {
        can_reapply: false,
        can_reapply_at: None,
        waiting_months: 0,
        rejection_stage: None,
    };
}

/// Stateless evaluator for the re-application rules.
#[derive(Debug, Clone, Default)]
pub struct EligibilityEngine {
    policy: EligibilityPolicy,
}

impl EligibilityEngine {
    pub fn new(policy: EligibilityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    /// Most recently submitted application for the job, if any.
    pub fn most_recent_for_job<'a>(
        &self,
        applications: &'a [Application],
        job_id: &JobId,
    ) -> Option<&'a Application> {
        rules::most_recent_for_job(applications, job_id)
    }

    pub fn rejection_window(&self, facts: &RejectionFacts) -> CooldownWindow {
        rules::rejection_window(facts, &self.policy)
    }

    /// Apply the rules in order; the first failing rule decides.
    pub fn evaluate(
        &self,
        input: &EligibilityInput<'_>,
        now: DateTime<Utc>,
    ) -> Result<(), Ineligibility> {
        let active = rules::count_toward_cap(input.applications);
        if active >= self.policy.max_active_applications {
            return Err(Ineligibility::TooManyActive {
                active,
                limit: self.policy.max_active_applications,
            });
        }

        if let Some(latest) = self.most_recent_for_job(input.applications, input.job_id) {
            if latest.status.is_active() {
                return Err(Ineligibility::DuplicateActiveApplication {
                    status: Some(latest.status),
                });
            }

            if latest.status == ApplicationStatus::Rejected {
                let facts = input.same_job_rejection.unwrap_or(RejectionFacts {
                    rejected_at: latest.updated_at,
                    interviewed_before: false,
                });
                let window = self.rejection_window(&facts);
                if now < window.eligible_at {
                    return Err(Ineligibility::RejectionCooldown {
                        eligible_at: window.eligible_at,
                        stage: window.stage,
                        waiting_months: window.waiting_months,
                    });
                }
            }
        }

        if let Some(hired) = input.latest_hire {
            if &hired.job_id != input.job_id {
                let eligible_at = rules::hire_eligible_at(hired, &self.policy);
                if now < eligible_at {
                    return Err(Ineligibility::HireCooldown {
                        eligible_at,
                        hired_job_id: hired.job_id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Listing annotation for one existing application.
    ///
    /// `rejection` is only consulted for rejected applications; when absent the
    /// application's `updated_at` stands in for the rejection time.
    pub fn annotate(
        &self,
        application: &Application,
        rejection: Option<&RejectionFacts>,
        now: DateTime<Utc>,
    ) -> ReapplyAnnotation {
        match application.status {
            ApplicationStatus::Withdrawn => ReapplyAnnotation {
                can_reapply: true,
                can_reapply_at: Some(application.updated_at),
                waiting_months: 0,
                rejection_stage: None,
            },
            ApplicationStatus::Rejected => {
                let facts = rejection.copied().unwrap_or(RejectionFacts {
                    rejected_at: application.updated_at,
                    interviewed_before: false,
                });
                let window = self.rejection_window(&facts);
                ReapplyAnnotation {
                    can_reapply: now >= window.eligible_at,
                    can_reapply_at: Some(window.eligible_at),
                    waiting_months: window.waiting_months,
                    rejection_stage: Some(window.stage),
                }
            }
            _ => ReapplyAnnotation::BLOCKED,
        }
    }
}
