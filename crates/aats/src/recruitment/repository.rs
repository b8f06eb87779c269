use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, JobId, JobPosting, JobStatus, Note,
    TimelineEntry, UserAccount, UserId,
};
use super::evaluation::Evaluation;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A uniqueness constraint rejected the write.
    #[error("record conflicts with an existing record")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store call exceeded {0:?}")]
    Timeout(Duration),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Whether an upsert inserted or replaced.
#[derive(Debug, Clone, PartialEq)]
pub enum Upsert<T> {
    Created(T),
    Updated(T),
}

impl<T> Upsert<T> {
    pub fn into_inner(self) -> T {
        match self {
            Upsert::Created(value) | Upsert::Updated(value) => value,
        }
    }

    pub fn created(&self) -> bool {
        matches!(self, Upsert::Created(_))
    }
}

/// Listing filter; every field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationFilter {
    #[serde(default)]
    pub applicant_id: Option<UserId>,
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    /// Case-insensitive match against cover letter, education, experience, and skills.
    #[serde(default)]
    pub text: Option<String>,
}

/// Offset window into an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub limit: usize,
}

/// One page of results plus the size of the full result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Application storage. `create` and `update` must reject a second active
/// application for the same (applicant, job) pair with `Conflict`.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn get(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    async fn create(&self, application: Application) -> Result<Application, RepositoryError>;
    async fn update(&self, application: Application) -> Result<Application, RepositoryError>;
    async fn list_by_applicant(
        &self,
        applicant_id: &UserId,
    ) -> Result<Vec<Application>, RepositoryError>;
    async fn find_active_by_applicant_and_job(
        &self,
        applicant_id: &UserId,
        job_id: &JobId,
    ) -> Result<Option<Application>, RepositoryError>;
    /// Most recently updated `hired` application across every job.
    async fn find_latest_hired_by_applicant(
        &self,
        applicant_id: &UserId,
    ) -> Result<Option<Application>, RepositoryError>;
    /// Filtered listing ordered by submission time, newest first.
    async fn search(
        &self,
        filter: &ApplicationFilter,
        window: PageWindow,
    ) -> Result<Paged<Application>, RepositoryError>;
}

/// Append-only status history.
#[async_trait]
pub trait TimelineRepository: Send + Sync {
    async fn append(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
        occurred_at: DateTime<Utc>,
        description: &str,
    ) -> Result<TimelineEntry, RepositoryError>;
    async fn latest_by_status(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Option<TimelineEntry>, RepositoryError>;
    /// Whether an entry with `status` occurred strictly before `before`.
    async fn exists_before(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
        before: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;
    /// Full history, newest first.
    async fn list(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<TimelineEntry>, RepositoryError>;
}

/// At most one evaluation per application; upsert is keyed by application id.
#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    async fn get_by_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Option<Evaluation>, RepositoryError>;
    async fn upsert(&self, evaluation: Evaluation) -> Result<Upsert<Evaluation>, RepositoryError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn get(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError>;
    /// Newest posting first.
    async fn list(&self, status: Option<JobStatus>) -> Result<Vec<JobPosting>, RepositoryError>;
    async fn create(&self, job: JobPosting) -> Result<JobPosting, RepositoryError>;
    /// Replace an existing posting; `NotFound` when the id is unknown.
    async fn update(&self, job: JobPosting) -> Result<JobPosting, RepositoryError>;
}

#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn append(&self, note: Note) -> Result<Note, RepositoryError>;
    /// Newest first.
    async fn list(&self, application_id: &ApplicationId) -> Result<Vec<Note>, RepositoryError>;
}

/// Read side of the identity collaborator.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find(&self, id: &UserId) -> Result<Option<UserAccount>, RepositoryError>;
}

/// The collaborators the recruitment service is wired with.
#[derive(Clone)]
pub struct RecruitmentRepositories {
    pub applications: Arc<dyn ApplicationRepository>,
    pub timeline: Arc<dyn TimelineRepository>,
    pub evaluations: Arc<dyn EvaluationRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub notes: Arc<dyn NoteRepository>,
    pub directory: Arc<dyn UserDirectory>,
}

impl RecruitmentRepositories {
    /// Wire every collaborator to one store that implements them all.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ApplicationRepository
            + TimelineRepository
            + EvaluationRepository
            + JobRepository
            + NoteRepository
            + UserDirectory
            + 'static,
    {
        Self {
            applications: store.clone(),
            timeline: store.clone(),
            evaluations: store.clone(),
            jobs: store.clone(),
            notes: store.clone(),
            directory: store,
        }
    }
}
