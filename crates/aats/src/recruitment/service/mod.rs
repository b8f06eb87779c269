//! Recruitment service facade.
//!
//! Composes the collaborator repositories, the eligibility engine, and a clock.
//! Every store call is wrapped in the configured deadline; an elapsed deadline
//! surfaces as `RepositoryError::Timeout` and is reported as a storage failure.

mod catalog;
mod error;
mod evaluations;
mod listing;
mod submission;
mod transitions;

pub use catalog::{JobDraft, JobUpdate, NoteDraft};
pub use error::{ErrorKind, RecruitmentError};
pub use listing::{
    ApplicationDetail, ApplicationListItem, ApplicationPage, ApplicationQuery, JobSummary,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use submission::{ApplicationSubmission, EligibilityReport};
pub use transitions::StatusUpdate;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::clock::Clock;
use super::domain::{Application, ApplicationId, ApplicationStatus, Caller, TimelineEntry};
use super::eligibility::{EligibilityEngine, EligibilityPolicy, RejectionFacts};
use super::lifecycle::SideWriteWarning;
use super::repository::{RecruitmentRepositories, RepositoryError};
use crate::config::RecruitmentConfig;

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Service composing the repositories, eligibility engine, and clock.
pub struct RecruitmentService {
    repositories: RecruitmentRepositories,
    engine: EligibilityEngine,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl RecruitmentService {
    pub fn new(
        repositories: RecruitmentRepositories,
        policy: EligibilityPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repositories,
            engine: EligibilityEngine::new(policy),
            clock,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn from_config(
        repositories: RecruitmentRepositories,
        config: &RecruitmentConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(repositories, config.policy, clock).with_store_timeout(config.store_timeout)
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub fn engine(&self) -> &EligibilityEngine {
        &self.engine
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn guarded<T, F>(&self, call: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RepositoryError::Timeout(self.store_timeout)),
        }
    }

    async fn load_application(&self, id: &ApplicationId) -> Result<Application, RecruitmentError> {
        self.guarded(self.repositories.applications.get(id))
            .await?
            .ok_or_else(|| RecruitmentError::not_found("application", id))
    }

    /// Candidates only see their own applications.
    fn ensure_can_view(caller: &Caller, application: &Application) -> Result<(), RecruitmentError> {
        if caller.is_staff() || caller.id == application.applicant_id {
            Ok(())
        } else {
            Err(RecruitmentError::forbidden(
                "candidates may only access their own applications",
            ))
        }
    }

    /// Timeline facts for a rejected application.
    async fn rejection_facts(
        &self,
        application: &Application,
    ) -> Result<RejectionFacts, RepositoryError> {
        let latest = self
            .guarded(
                self.repositories
                    .timeline
                    .latest_by_status(&application.id, ApplicationStatus::Rejected),
            )
            .await?;
        let rejected_at = RejectionFacts::rejected_at(application, latest.as_ref());
        let interviewed_before = self
            .guarded(self.repositories.timeline.exists_before(
                &application.id,
                ApplicationStatus::Interview,
                rejected_at,
            ))
            .await?;

        Ok(RejectionFacts {
            rejected_at,
            interviewed_before,
        })
    }

    /// Best-effort history append after a committed status write.
    async fn append_timeline(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
        occurred_at: DateTime<Utc>,
        description: &str,
    ) -> Result<TimelineEntry, SideWriteWarning> {
        self.guarded(self.repositories.timeline.append(
            application_id,
            status,
            occurred_at,
            description,
        ))
        .await
        .map_err(|err| {
            warn!(
                application_id = %application_id,
                status = %status,
                error = %err,
                "timeline append failed after status commit"
            );
            SideWriteWarning::timeline(err.to_string())
        })
    }
}
