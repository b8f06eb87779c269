use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{RecruitmentError, RecruitmentService};
use crate::recruitment::domain::{
    ApplicationId, Caller, JobId, JobPosting, JobStatus, Note, NoteId,
};
use crate::recruitment::eligibility::add_months;
use crate::recruitment::repository::RepositoryError;

/// Months a posting stays open when no closing date is given.
const DEFAULT_POSTING_MONTHS: u32 = 2;

/// Payload for a new job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub responsibilities: String,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub closing_at: Option<DateTime<Utc>>,
}

/// Partial edit of a posting. Absent or blank text fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub experience_level: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub responsibilities: Option<String>,
    pub status: Option<JobStatus>,
    pub closing_at: Option<DateTime<Utc>>,
}

impl JobUpdate {
    fn apply_to(self, job: &mut JobPosting) {
        let fields = [
            (self.title, &mut job.title),
            (self.department, &mut job.department),
            (self.location, &mut job.location),
            (self.experience_level, &mut job.experience_level),
            (self.description, &mut job.description),
            (self.requirements, &mut job.requirements),
            (self.responsibilities, &mut job.responsibilities),
        ];
        for (value, slot) in fields {
            if let Some(value) = value.filter(|value| !value.trim().is_empty()) {
                *slot = value.trim().to_string();
            }
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(closing_at) = self.closing_at {
            job.closing_at = closing_at;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub content: String,
    /// Display name; falls back to the caller's directory name.
    #[serde(default)]
    pub author: Option<String>,
}

impl RecruitmentService {
    pub async fn jobs(&self, status: Option<JobStatus>) -> Result<Vec<JobPosting>, RecruitmentError> {
        Ok(self.guarded(self.repositories.jobs.list(status)).await?)
    }

    pub async fn job(&self, job_id: &JobId) -> Result<JobPosting, RecruitmentError> {
        self.guarded(self.repositories.jobs.get(job_id))
            .await?
            .ok_or_else(|| RecruitmentError::not_found("job", job_id))
    }

    /// Publish a posting; HR only.
    pub async fn create_job(
        &self,
        caller: &Caller,
        draft: JobDraft,
    ) -> Result<JobPosting, RecruitmentError> {
        if !caller.is_privileged() {
            return Err(RecruitmentError::forbidden("only HR may create job postings"));
        }
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(RecruitmentError::InvalidRequest(
                "job title must not be empty".to_string(),
            ));
        }

        let posted_at = self.now();
        let closing_at = draft
            .closing_at
            .unwrap_or_else(|| add_months(posted_at, DEFAULT_POSTING_MONTHS));
        if closing_at < posted_at {
            return Err(RecruitmentError::InvalidRequest(
                "closing date must not precede the posting date".to_string(),
            ));
        }

        let job = JobPosting {
            id: JobId::generate(),
            title: title.to_string(),
            department: draft.department,
            location: draft.location,
            experience_level: draft.experience_level,
            description: draft.description,
            requirements: draft.requirements,
            responsibilities: draft.responsibilities,
            status: draft.status.unwrap_or(JobStatus::Active),
            posted_at,
            closing_at,
            created_by: caller.id.clone(),
            updated_at: posted_at,
        };
        let stored = self.guarded(self.repositories.jobs.create(job)).await?;
        info!(job_id = %stored.id, title = %stored.title, "job posted");
        Ok(stored)
    }

    /// Edit a posting in place, including closing or re-opening it; HR only.
    pub async fn update_job(
        &self,
        caller: &Caller,
        job_id: &JobId,
        update: JobUpdate,
    ) -> Result<JobPosting, RecruitmentError> {
        if !caller.is_privileged() {
            return Err(RecruitmentError::forbidden("only HR may edit job postings"));
        }
        let mut job = self.job(job_id).await?;
        let previous_status = job.status;

        update.apply_to(&mut job);
        if job.closing_at < job.posted_at {
            return Err(RecruitmentError::InvalidRequest(
                "closing date must not precede the posting date".to_string(),
            ));
        }
        job.updated_at = self.now();

        let stored = match self.guarded(self.repositories.jobs.update(job)).await {
            Ok(stored) => stored,
            Err(RepositoryError::NotFound) => {
                return Err(RecruitmentError::not_found("job", job_id))
            }
            Err(err) => return Err(err.into()),
        };
        info!(
            job_id = %stored.id,
            from = ?previous_status,
            to = ?stored.status,
            "job posting updated"
        );
        Ok(stored)
    }

    /// Attach a staff note to an application.
    pub async fn add_note(
        &self,
        caller: &Caller,
        application_id: &ApplicationId,
        draft: NoteDraft,
    ) -> Result<Note, RecruitmentError> {
        if !caller.is_staff() {
            return Err(RecruitmentError::forbidden(
                "only HR or hiring managers may add notes",
            ));
        }
        let content = draft.content.trim();
        if content.is_empty() {
            return Err(RecruitmentError::InvalidRequest(
                "note content must not be empty".to_string(),
            ));
        }

        let application = self.load_application(application_id).await?;
        let author = match draft.author.filter(|author| !author.trim().is_empty()) {
            Some(author) => author,
            None => self.directory_name(caller).await?,
        };

        let note = Note {
            id: NoteId::generate(),
            application_id: application.id,
            author,
            created_by: caller.id.clone(),
            content: content.to_string(),
            created_at: self.now(),
        };
        let stored = self.guarded(self.repositories.notes.append(note)).await?;
        info!(application_id = %stored.application_id, note_id = %stored.id, "note added");
        Ok(stored)
    }

    pub async fn notes(
        &self,
        caller: &Caller,
        application_id: &ApplicationId,
    ) -> Result<Vec<Note>, RecruitmentError> {
        if !caller.is_staff() {
            return Err(RecruitmentError::forbidden(
                "only HR or hiring managers may read notes",
            ));
        }
        let application = self.load_application(application_id).await?;
        Ok(self
            .guarded(self.repositories.notes.list(&application.id))
            .await?)
    }

    async fn directory_name(&self, caller: &Caller) -> Result<String, RecruitmentError> {
        match self.guarded(self.repositories.directory.find(&caller.id)).await {
            Ok(Some(account)) => Ok(account.name),
            Ok(None) | Err(RepositoryError::NotFound) => Ok(caller.id.to_string()),
            Err(err) => Err(err.into()),
        }
    }
}
