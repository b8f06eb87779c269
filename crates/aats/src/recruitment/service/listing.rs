use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{RecruitmentError, RecruitmentService};
use crate::recruitment::domain::{
    Application, ApplicationId, ApplicationStatus, Caller, JobId, JobPosting, Note,
    TimelineEntry, UserId,
};
use crate::recruitment::eligibility::ReapplyAnnotation;
use crate::recruitment::evaluation::Evaluation;
use crate::recruitment::repository::{ApplicationFilter, PageWindow};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 200;

/// Listing filters and pagination as received from the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationQuery {
    #[serde(default)]
    pub applicant_id: Option<UserId>,
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default, rename = "q")]
    pub text: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ApplicationQuery {
    /// Page numbers start at 1; a limit outside 1..=200 falls back to 20.
    fn pagination(&self) -> (usize, usize) {
        let page = self.page.filter(|page| *page >= 1).unwrap_or(1);
        let limit = self
            .limit
            .filter(|limit| (1..=MAX_PAGE_SIZE).contains(limit))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        (page, limit)
    }
}

/// Job fields echoed next to each listed application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub id: JobId,
    pub title: String,
    pub department: String,
    pub location: String,
}

impl From<&JobPosting> for JobSummary {
    fn from(job: &JobPosting) -> Self {
        Self {
            id: job.id.clone(),
            title: job.title.clone(),
            department: job.department.clone(),
            location: job.location.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationListItem {
    #[serde(flatten)]
    pub application: Application,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<JobSummary>,
    #[serde(flatten)]
    pub reapply: ReapplyAnnotation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationPage {
    pub items: Vec<ApplicationListItem>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// Everything known about one application, filtered for the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationDetail {
    pub application: Application,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<JobPosting>,
    pub timeline: Vec<TimelineEntry>,
    /// Staff-only; always empty for candidates.
    pub notes: Vec<Note>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
    pub reapply: ReapplyAnnotation,
}

impl RecruitmentService {
    /// Filtered, paginated listing with re-application hints per item.
    ///
    /// Candidates are always scoped to their own applications whatever the
    /// query says.
    pub async fn list_applications(
        &self,
        caller: &Caller,
        query: ApplicationQuery,
    ) -> Result<ApplicationPage, RecruitmentError> {
        let (page, limit) = query.pagination();
        let applicant_id = if caller.is_staff() {
            query.applicant_id
        } else {
            Some(caller.id.clone())
        };
        let filter = ApplicationFilter {
            applicant_id,
            job_id: query.job_id,
            status: query.status,
            text: query.text,
        };
        let window = PageWindow {
            offset: (page - 1).saturating_mul(limit),
            limit,
        };

        let found = self
            .guarded(self.repositories.applications.search(&filter, window))
            .await?;

        let now = self.now();
        let mut jobs: HashMap<JobId, Option<JobSummary>> = HashMap::new();
        let mut items = Vec::with_capacity(found.items.len());
        for application in found.items {
            if !jobs.contains_key(&application.job_id) {
                let summary = self.job_best_effort(&application.job_id).await;
                jobs.insert(
                    application.job_id.clone(),
                    summary.as_ref().map(JobSummary::from),
                );
            }
            let job = jobs.get(&application.job_id).cloned().flatten();
            let reapply = self.annotate(&application, now).await?;
            items.push(ApplicationListItem {
                application,
                job,
                reapply,
            });
        }

        Ok(ApplicationPage {
            items,
            total: found.total,
            page,
            limit,
        })
    }

    /// One application with its job, history, notes, and evaluation.
    pub async fn application_detail(
        &self,
        caller: &Caller,
        application_id: &ApplicationId,
    ) -> Result<ApplicationDetail, RecruitmentError> {
        let application = self.load_application(application_id).await?;
        Self::ensure_can_view(caller, &application)?;

        let job = self.job_best_effort(&application.job_id).await;
        let timeline = self
            .guarded(self.repositories.timeline.list(application_id))
            .await?;
        let notes = if caller.is_staff() {
            self.guarded(self.repositories.notes.list(application_id))
                .await?
        } else {
            Vec::new()
        };
        let evaluation = if application.status.is_evaluation_stage() {
            self.guarded(
                self.repositories
                    .evaluations
                    .get_by_application(application_id),
            )
            .await?
        } else {
            None
        };
        let reapply = self.annotate(&application, self.now()).await?;

        Ok(ApplicationDetail {
            application,
            job,
            timeline,
            notes,
            evaluation,
            reapply,
        })
    }

    async fn annotate(
        &self,
        application: &Application,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<ReapplyAnnotation, RecruitmentError> {
        let facts = if application.status == ApplicationStatus::Rejected {
            Some(self.rejection_facts(application).await?)
        } else {
            None
        };
        Ok(self.engine.annotate(application, facts.as_ref(), now))
    }

    /// Job lookups for display never fail the surrounding request.
    async fn job_best_effort(&self, job_id: &JobId) -> Option<JobPosting> {
        self.guarded(self.repositories.jobs.get(job_id))
            .await
            .ok()
            .flatten()
    }
}
