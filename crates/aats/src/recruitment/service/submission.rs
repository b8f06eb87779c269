use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{RecruitmentError, RecruitmentService};
use crate::recruitment::domain::{
    Application, ApplicationId, ApplicationStatus, Caller, JobId, UserId,
};
use crate::recruitment::eligibility::{EligibilityInput, Ineligibility};
use crate::recruitment::lifecycle::WriteOutcome;
use crate::recruitment::repository::RepositoryError;

/// Payload for a new application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub job_id: JobId,
    /// Defaults to the caller; only HR may name someone else.
    #[serde(default)]
    pub applicant_id: Option<UserId>,
    #[serde(default)]
    pub resume: String,
    #[serde(default)]
    pub cover_letter: String,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub skills: String,
}

/// Dry-run answer to "could this applicant apply to this job now?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityReport {
    pub applicant_id: UserId,
    pub job_id: JobId,
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligible_at: Option<DateTime<Utc>>,
}

impl RecruitmentService {
    /// Submit a new application after the eligibility rules pass.
    ///
    /// The application row is the primary write; the initial `submitted`
    /// timeline entry is best effort.
    pub async fn submit(
        &self,
        caller: &Caller,
        submission: ApplicationSubmission,
    ) -> Result<WriteOutcome<Application>, RecruitmentError> {
        let now = self.now();

        let job = self
            .guarded(self.repositories.jobs.get(&submission.job_id))
            .await?
            .ok_or_else(|| RecruitmentError::not_found("job", &submission.job_id))?;

        let applicant_id = resolve_applicant(caller, submission.applicant_id)?;

        if let Err(reason) = self.assess(&applicant_id, &job.id, now).await? {
            debug!(
                applicant_id = %applicant_id,
                job_id = %job.id,
                reason = %reason,
                "submission refused"
            );
            return Err(reason.into());
        }

        let application = Application {
            id: ApplicationId::generate(),
            job_id: job.id,
            applicant_id,
            resume: submission.resume,
            cover_letter: submission.cover_letter,
            education: submission.education,
            experience: submission.experience,
            skills: submission.skills,
            status: ApplicationStatus::Submitted,
            submitted_at: now,
            updated_at: now,
        };

        let stored = match self
            .guarded(self.repositories.applications.create(application))
            .await
        {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => {
                return Err(Ineligibility::DuplicateActiveApplication { status: None }.into())
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            application_id = %stored.id,
            applicant_id = %stored.applicant_id,
            job_id = %stored.job_id,
            "application submitted"
        );

        Ok(
            match self
                .append_timeline(
                    &stored.id,
                    ApplicationStatus::Submitted,
                    now,
                    "Application submitted",
                )
                .await
            {
                Ok(_) => WriteOutcome::Committed(stored),
                Err(warning) => WriteOutcome::CommittedWithWarning {
                    value: stored,
                    warning,
                },
            },
        )
    }

    /// Run the eligibility rules without writing anything.
    pub async fn check_eligibility(
        &self,
        caller: &Caller,
        applicant_id: &UserId,
        job_id: &JobId,
    ) -> Result<EligibilityReport, RecruitmentError> {
        if !caller.is_staff() && &caller.id != applicant_id {
            return Err(RecruitmentError::forbidden(
                "candidates may only check their own eligibility",
            ));
        }

        let job = self
            .guarded(self.repositories.jobs.get(job_id))
            .await?
            .ok_or_else(|| RecruitmentError::not_found("job", job_id))?;

        let verdict = self.assess(applicant_id, &job.id, self.now()).await?;
        let report = match verdict {
            Ok(()) => EligibilityReport {
                applicant_id: applicant_id.clone(),
                job_id: job.id,
                eligible: true,
                reason: None,
                message: None,
                eligible_at: None,
            },
            Err(reason) => {
                let eligible_at = reason.eligible_at();
                let message = reason.to_string();
                let code = RecruitmentError::from(reason).kind().code();
                EligibilityReport {
                    applicant_id: applicant_id.clone(),
                    job_id: job.id,
                    eligible: false,
                    reason: Some(code),
                    message: Some(message),
                    eligible_at,
                }
            }
        };
        Ok(report)
    }

    /// Gather the applicant's history and ask the engine for a verdict.
    async fn assess(
        &self,
        applicant_id: &UserId,
        job_id: &JobId,
        now: DateTime<Utc>,
    ) -> Result<Result<(), Ineligibility>, RepositoryError> {
        let applications = self
            .guarded(self.repositories.applications.list_by_applicant(applicant_id))
            .await?;

        let same_job_rejection = match self.engine.most_recent_for_job(&applications, job_id) {
            Some(latest) if latest.status == ApplicationStatus::Rejected => {
                Some(self.rejection_facts(latest).await?)
            }
            _ => None,
        };

        let latest_hire = self
            .guarded(
                self.repositories
                    .applications
                    .find_latest_hired_by_applicant(applicant_id),
            )
            .await?;

        let input = EligibilityInput {
            job_id,
            applications: &applications,
            same_job_rejection,
            latest_hire: latest_hire.as_ref(),
        };
        Ok(self.engine.evaluate(&input, now))
    }
}

fn resolve_applicant(
    caller: &Caller,
    requested: Option<UserId>,
) -> Result<UserId, RecruitmentError> {
    match requested {
        Some(applicant_id) if applicant_id != caller.id && !caller.is_privileged() => Err(
            RecruitmentError::forbidden("only HR may submit on behalf of another applicant"),
        ),
        Some(applicant_id) => Ok(applicant_id),
        None => Ok(caller.id.clone()),
    }
}
