use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, JobId, JobPosting, JobStatus, Note,
    TimelineEntry, TimelineEntryId, UserAccount, UserId,
};
use super::evaluation::Evaluation;
use super::repository::{
    ApplicationFilter, ApplicationRepository, EvaluationRepository, JobRepository, NoteRepository,
    PageWindow, Paged, RepositoryError, TimelineRepository, Upsert, UserDirectory,
};

#[derive(Default)]
struct StoreState {
    applications: HashMap<ApplicationId, Application>,
    timeline: Vec<TimelineEntry>,
    evaluations: HashMap<ApplicationId, Evaluation>,
    jobs: HashMap<JobId, JobPosting>,
    notes: Vec<Note>,
    users: HashMap<UserId, UserAccount>,
}

impl StoreState {
    /// Another active application for the same (applicant, job) pair.
    fn active_duplicate(&self, candidate: &Application) -> bool {
        candidate.status.is_active()
            && self.applications.values().any(|existing| {
                existing.id != candidate.id
                    && existing.applicant_id == candidate.applicant_id
                    && existing.job_id == candidate.job_id
                    && existing.status.is_active()
            })
    }
}

/// Process-local store implementing every recruitment collaborator.
///
/// All collections sit behind one mutex so the uniqueness checks and the
/// writes they guard happen atomically.
#[derive(Default)]
pub struct InMemoryRecruitmentStore {
    state: Mutex<StoreState>,
}

impl InMemoryRecruitmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("recruitment store mutex poisoned".into()))
    }

    /// Add or replace a directory entry.
    pub fn register_user(&self, account: UserAccount) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.users.insert(account.id.clone(), account);
        Ok(())
    }
}

fn matches_filter(application: &Application, filter: &ApplicationFilter) -> bool {
    if let Some(applicant_id) = &filter.applicant_id {
        if &application.applicant_id != applicant_id {
            return false;
        }
    }
    if let Some(job_id) = &filter.job_id {
        if &application.job_id != job_id {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if application.status != status {
            return false;
        }
    }
    match filter.text.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => {
            let needle = text.to_lowercase();
            [
                &application.cover_letter,
                &application.education,
                &application.experience,
                &application.skills,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
        }
        _ => true,
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryRecruitmentStore {
    async fn get(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(id).cloned())
    }

    async fn create(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut state = self.lock()?;
        if state.applications.contains_key(&application.id) || state.active_duplicate(&application)
        {
            return Err(RepositoryError::Conflict);
        }
        state
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    async fn update(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut state = self.lock()?;
        if !state.applications.contains_key(&application.id) {
            return Err(RepositoryError::NotFound);
        }
        if state.active_duplicate(&application) {
            return Err(RepositoryError::Conflict);
        }
        state
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    async fn list_by_applicant(
        &self,
        applicant_id: &UserId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let state = self.lock()?;
        let mut applications: Vec<_> = state
            .applications
            .values()
            .filter(|application| &application.applicant_id == applicant_id)
            .cloned()
            .collect();
        applications.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(applications)
    }

    async fn find_active_by_applicant_and_job(
        &self,
        applicant_id: &UserId,
        job_id: &JobId,
    ) -> Result<Option<Application>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .applications
            .values()
            .find(|application| {
                &application.applicant_id == applicant_id
                    && &application.job_id == job_id
                    && application.status.is_active()
            })
            .cloned())
    }

    async fn find_latest_hired_by_applicant(
        &self,
        applicant_id: &UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .applications
            .values()
            .filter(|application| {
                &application.applicant_id == applicant_id
                    && application.status == ApplicationStatus::Hired
            })
            .max_by(|a, b| {
                a.updated_at
                    .cmp(&b.updated_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .cloned())
    }

    async fn search(
        &self,
        filter: &ApplicationFilter,
        window: PageWindow,
    ) -> Result<Paged<Application>, RepositoryError> {
        let state = self.lock()?;
        let mut matched: Vec<_> = state
            .applications
            .values()
            .filter(|application| matches_filter(application, filter))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = matched.len();
        let items = matched
            .into_iter()
            .skip(window.offset)
            .take(window.limit)
            .collect();
        Ok(Paged { items, total })
    }
}

#[async_trait]
impl TimelineRepository for InMemoryRecruitmentStore {
    async fn append(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
        occurred_at: DateTime<Utc>,
        description: &str,
    ) -> Result<TimelineEntry, RepositoryError> {
        let entry = TimelineEntry {
            id: TimelineEntryId::generate(),
            application_id: application_id.clone(),
            status,
            occurred_at,
            description: description.to_string(),
        };
        self.lock()?.timeline.push(entry.clone());
        Ok(entry)
    }

    async fn latest_by_status(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Option<TimelineEntry>, RepositoryError> {
        let state = self.lock()?;
        // Later appends win ties on `occurred_at`.
        Ok(state
            .timeline
            .iter()
            .filter(|entry| &entry.application_id == application_id && entry.status == status)
            .fold(None::<&TimelineEntry>, |latest, entry| match latest {
                Some(current) if current.occurred_at > entry.occurred_at => Some(current),
                _ => Some(entry),
            })
            .cloned())
    }

    async fn exists_before(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
        before: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let state = self.lock()?;
        Ok(state.timeline.iter().any(|entry| {
            &entry.application_id == application_id
                && entry.status == status
                && entry.occurred_at < before
        }))
    }

    async fn list(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<TimelineEntry>, RepositoryError> {
        let state = self.lock()?;
        let mut entries: Vec<_> = state
            .timeline
            .iter()
            .rev()
            .filter(|entry| &entry.application_id == application_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(entries)
    }
}

#[async_trait]
impl EvaluationRepository for InMemoryRecruitmentStore {
    async fn get_by_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Option<Evaluation>, RepositoryError> {
        Ok(self.lock()?.evaluations.get(application_id).cloned())
    }

    async fn upsert(&self, mut evaluation: Evaluation) -> Result<Upsert<Evaluation>, RepositoryError> {
        let mut state = self.lock()?;
        match state.evaluations.get(&evaluation.application_id) {
            Some(existing) => {
                evaluation.id = existing.id.clone();
                state
                    .evaluations
                    .insert(evaluation.application_id.clone(), evaluation.clone());
                Ok(Upsert::Updated(evaluation))
            }
            None => {
                state
                    .evaluations
                    .insert(evaluation.application_id.clone(), evaluation.clone());
                Ok(Upsert::Created(evaluation))
            }
        }
    }
}

#[async_trait]
impl JobRepository for InMemoryRecruitmentStore {
    async fn get(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError> {
        Ok(self.lock()?.jobs.get(id).cloned())
    }

    async fn list(&self, status: Option<JobStatus>) -> Result<Vec<JobPosting>, RepositoryError> {
        let state = self.lock()?;
        let mut jobs: Vec<_> = state
            .jobs
            .values()
            .filter(|job| status.map_or(true, |wanted| job.status == wanted))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.posted_at.cmp(&a.posted_at).then_with(|| a.id.cmp(&b.id)));
        Ok(jobs)
    }

    async fn create(&self, job: JobPosting) -> Result<JobPosting, RepositoryError> {
        let mut state = self.lock()?;
        if state.jobs.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        state.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn update(&self, job: JobPosting) -> Result<JobPosting, RepositoryError> {
        let mut state = self.lock()?;
        match state.jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job.clone();
                Ok(job)
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

#[async_trait]
impl NoteRepository for InMemoryRecruitmentStore {
    async fn append(&self, note: Note) -> Result<Note, RepositoryError> {
        self.lock()?.notes.push(note.clone());
        Ok(note)
    }

    async fn list(&self, application_id: &ApplicationId) -> Result<Vec<Note>, RepositoryError> {
        let state = self.lock()?;
        let mut notes: Vec<_> = state
            .notes
            .iter()
            .rev()
            .filter(|note| &note.application_id == application_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }
}

#[async_trait]
impl UserDirectory for InMemoryRecruitmentStore {
    async fn find(&self, id: &UserId) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(self.lock()?.users.get(id).cloned())
    }
}
