use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{RecruitmentError, RecruitmentService};
use crate::recruitment::domain::{ApplicationId, ApplicationStatus, Caller, Role, UserId};
use crate::recruitment::eligibility::Ineligibility;
use crate::recruitment::lifecycle::{check_gate, StatusChange, WriteOutcome};
use crate::recruitment::repository::RepositoryError;

/// Requested status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
    /// Timeline description; a generic one is used when omitted.
    #[serde(default)]
    pub description: Option<String>,
}

impl StatusUpdate {
    pub fn new(status: ApplicationStatus) -> Self {
        Self {
            status,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl RecruitmentService {
    /// Move an application to a new status.
    ///
    /// `offer` and `hired` pass through the evaluation gate. The status write is
    /// the commit point; a failed timeline append afterwards is reported as a
    /// warning and never rolls the status back.
    pub async fn update_status(
        &self,
        caller: &Caller,
        application_id: &ApplicationId,
        update: StatusUpdate,
    ) -> Result<WriteOutcome<StatusChange>, RecruitmentError> {
        let mut application = self.load_application(application_id).await?;
        let target = update.status;
        authorize_transition(caller, &application.applicant_id, target)?;

        if target.requires_evaluation() {
            let evaluation = self
                .guarded(
                    self.repositories
                        .evaluations
                        .get_by_application(&application.id),
                )
                .await?;
            let evaluator_role = match &evaluation {
                Some(evaluation) => self.evaluator_role(&evaluation.evaluator_id).await?,
                None => None,
            };
            if let Err(violation) = check_gate(target, evaluation.as_ref(), evaluator_role) {
                debug!(
                    application_id = %application.id,
                    target = %target,
                    reason = %violation,
                    "status change refused"
                );
                return Err(violation.into());
            }
        }

        let previous_status = application.status;
        if !previous_status.is_active() && target.is_active() {
            let sibling = self
                .guarded(
                    self.repositories
                        .applications
                        .find_active_by_applicant_and_job(
                            &application.applicant_id,
                            &application.job_id,
                        ),
                )
                .await?;
            if let Some(sibling) = sibling.filter(|sibling| sibling.id != application.id) {
                return Err(Ineligibility::DuplicateActiveApplication {
                    status: Some(sibling.status),
                }
                .into());
            }
        }

        let now = self.now();
        application.status = target;
        application.updated_at = now;

        let application = match self
            .guarded(self.repositories.applications.update(application))
            .await
        {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => {
                return Err(Ineligibility::DuplicateActiveApplication { status: None }.into())
            }
            Err(RepositoryError::NotFound) => {
                return Err(RecruitmentError::not_found("application", application_id))
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            application_id = %application.id,
            from = %previous_status,
            to = %target,
            caller_id = %caller.id,
            "application status updated"
        );

        let description = update
            .description
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| format!("Status changed to {target}"));

        let appended = self
            .append_timeline(&application.id, target, now, &description)
            .await;

        Ok(match appended {
            Ok(entry) => WriteOutcome::Committed(StatusChange {
                application,
                previous_status,
                timeline_entry: Some(entry),
            }),
            Err(warning) => WriteOutcome::CommittedWithWarning {
                value: StatusChange {
                    application,
                    previous_status,
                    timeline_entry: None,
                },
                warning,
            },
        })
    }

    /// Directory role of an evaluator; `None` when the directory has no entry.
    async fn evaluator_role(&self, evaluator_id: &UserId) -> Result<Option<Role>, RepositoryError> {
        match self
            .guarded(self.repositories.directory.find(evaluator_id))
            .await
        {
            Ok(account) => Ok(account.map(|account| account.role)),
            Err(RepositoryError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Staff may set any status; candidates may only withdraw their own application.
fn authorize_transition(
    caller: &Caller,
    applicant_id: &UserId,
    target: ApplicationStatus,
) -> Result<(), RecruitmentError> {
    if caller.is_staff() {
        return Ok(());
    }
    if &caller.id != applicant_id {
        return Err(RecruitmentError::forbidden(
            "candidates may only change their own applications",
        ));
    }
    if target != ApplicationStatus::Withdrawn {
        return Err(RecruitmentError::forbidden(
            "candidates may only withdraw an application",
        ));
    }
    Ok(())
}
