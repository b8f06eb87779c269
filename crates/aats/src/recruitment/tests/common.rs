use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::recruitment::clock::FixedClock;
use crate::recruitment::domain::{
    Application, ApplicationId, ApplicationStatus, Caller, JobId, JobPosting, JobStatus, Role,
    TimelineEntry, UserAccount, UserId,
};
use crate::recruitment::eligibility::EligibilityPolicy;
use crate::recruitment::evaluation::{EvaluationSubmission, ScoreCard};
use crate::recruitment::memory::InMemoryRecruitmentStore;
use crate::recruitment::repository::{
    ApplicationFilter, ApplicationRepository, JobRepository, PageWindow, Paged,
    RecruitmentRepositories, RepositoryError, TimelineRepository,
};
use crate::recruitment::service::{ApplicationSubmission, RecruitmentService};

pub(super) const CANDIDATE: &str = "cand-1";
pub(super) const OTHER_CANDIDATE: &str = "cand-2";
pub(super) const HR: &str = "hr-1";
pub(super) const HIRING_MANAGER: &str = "hm-1";

pub(super) fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn start() -> DateTime<Utc> {
    at(2025, 1, 15)
}

pub(super) fn candidate() -> Caller {
    Caller::new(CANDIDATE, Role::Candidate)
}

pub(super) fn other_candidate() -> Caller {
    Caller::new(OTHER_CANDIDATE, Role::Candidate)
}

pub(super) fn hr() -> Caller {
    Caller::new(HR, Role::Hr)
}

pub(super) fn hiring_manager() -> Caller {
    Caller::new(HIRING_MANAGER, Role::HiringManager)
}

pub(super) fn application(
    id: &str,
    job: &str,
    status: ApplicationStatus,
    submitted_at: DateTime<Utc>,
) -> Application {
    Application {
        id: ApplicationId::from(id),
        job_id: JobId::from(job),
        applicant_id: UserId::from(CANDIDATE),
        resume: "resume.pdf".to_string(),
        cover_letter: "I enjoy building reliable services".to_string(),
        education: "BSc Computer Science".to_string(),
        experience: "5 years backend".to_string(),
        skills: "rust, postgres".to_string(),
        status,
        submitted_at,
        updated_at: submitted_at,
    }
}

pub(super) fn timeline_entry(
    application_id: &str,
    status: ApplicationStatus,
    occurred_at: DateTime<Utc>,
) -> TimelineEntry {
    TimelineEntry {
        id: format!("tl-{application_id}-{status}").into(),
        application_id: ApplicationId::from(application_id),
        status,
        occurred_at,
        description: status.label().to_string(),
    }
}

pub(super) fn job(id: &str, title: &str) -> JobPosting {
    JobPosting {
        id: JobId::from(id),
        title: title.to_string(),
        department: "Engineering".to_string(),
        location: "Bangkok".to_string(),
        experience_level: "mid".to_string(),
        description: format!("{title} role"),
        requirements: "3+ years of production experience".to_string(),
        responsibilities: "Own services end to end".to_string(),
        status: JobStatus::Active,
        posted_at: at(2024, 12, 1),
        closing_at: at(2025, 2, 1),
        created_by: UserId::from(HR),
        updated_at: at(2024, 12, 1),
    }
}

pub(super) fn submission(job: &str) -> ApplicationSubmission {
    ApplicationSubmission {
        job_id: JobId::from(job),
        applicant_id: None,
        resume: "resume.pdf".to_string(),
        cover_letter: "I enjoy building reliable services".to_string(),
        education: "BSc Computer Science".to_string(),
        experience: "5 years backend".to_string(),
        skills: "rust, postgres".to_string(),
    }
}

pub(super) fn scores() -> EvaluationSubmission {
    EvaluationSubmission {
        scores: ScoreCard {
            technical: 5,
            communication: 4,
            problem_solving: 4,
            cultural_fit: 3,
        },
        overall_score: None,
        strengths: "clear system design".to_string(),
        weaknesses: "limited frontend exposure".to_string(),
        comments: String::new(),
    }
}

/// Store seeded with the standard directory and seven open jobs.
pub(super) async fn seeded_store() -> Arc<InMemoryRecruitmentStore> {
    let store = Arc::new(InMemoryRecruitmentStore::new());
    for (id, name, role) in [
        (CANDIDATE, "Nok Srisuk", Role::Candidate),
        (OTHER_CANDIDATE, "Arthit Chai", Role::Candidate),
        (HR, "Pim HR", Role::Hr),
        (HIRING_MANAGER, "Dao Manager", Role::HiringManager),
    ] {
        store
            .register_user(UserAccount {
                id: UserId::from(id),
                name: name.to_string(),
                email: format!("{id}@example.com"),
                role,
            })
            .expect("register user");
    }
    for index in 1..=7 {
        JobRepository::create(
            store.as_ref(),
            job(&format!("job-{index}"), &format!("Engineer {index}")),
        )
        .await
        .expect("seed job");
    }
    store
}

pub(super) struct Harness {
    pub(super) service: Arc<RecruitmentService>,
    pub(super) store: Arc<InMemoryRecruitmentStore>,
    pub(super) clock: Arc<FixedClock>,
}

impl Harness {
    pub(super) async fn insert(&self, application: Application) {
        ApplicationRepository::create(self.store.as_ref(), application)
            .await
            .expect("insert application");
    }

    pub(super) async fn record(&self, entry: TimelineEntry) {
        TimelineRepository::append(
            self.store.as_ref(),
            &entry.application_id,
            entry.status,
            entry.occurred_at,
            &entry.description,
        )
        .await
        .expect("append timeline");
    }

    pub(super) async fn history(&self, application_id: &ApplicationId) -> Vec<TimelineEntry> {
        TimelineRepository::list(self.store.as_ref(), application_id)
            .await
            .expect("timeline")
    }

    pub(super) async fn stored(&self, application_id: &ApplicationId) -> Application {
        ApplicationRepository::get(self.store.as_ref(), application_id)
            .await
            .expect("read application")
            .expect("application exists")
    }
}

pub(super) async fn harness() -> Harness {
    let store = seeded_store().await;
    let clock = Arc::new(FixedClock::new(start()));
    let service = RecruitmentService::new(
        RecruitmentRepositories::from_store(store.clone()),
        EligibilityPolicy::default(),
        clock.clone(),
    );
    Harness {
        service: Arc::new(service),
        store,
        clock,
    }
}

/// Harness whose timeline rejects every append.
pub(super) async fn harness_with_failing_timeline() -> Harness {
    let store = seeded_store().await;
    let clock = Arc::new(FixedClock::new(start()));
    let repositories = RecruitmentRepositories {
        timeline: Arc::new(FailingTimeline {
            inner: store.clone(),
        }),
        ..RecruitmentRepositories::from_store(store.clone())
    };
    let service = RecruitmentService::new(repositories, EligibilityPolicy::default(), clock.clone());
    Harness {
        service: Arc::new(service),
        store,
        clock,
    }
}

/// Service whose application store never answers.
pub(super) async fn stalled_service(store_timeout: Duration) -> RecruitmentService {
    let store = seeded_store().await;
    let repositories = RecruitmentRepositories {
        applications: Arc::new(StalledApplications),
        ..RecruitmentRepositories::from_store(store)
    };
    RecruitmentService::new(
        repositories,
        EligibilityPolicy::default(),
        Arc::new(FixedClock::new(start())),
    )
    .with_store_timeout(store_timeout)
}

/// Harness whose application reads lag behind writes, leaving the store's
/// uniqueness constraint as the only duplicate guard.
pub(super) async fn harness_with_stale_reads() -> Harness {
    let store = seeded_store().await;
    let clock = Arc::new(FixedClock::new(start()));
    let repositories = RecruitmentRepositories {
        applications: Arc::new(StaleApplications {
            inner: store.clone(),
        }),
        ..RecruitmentRepositories::from_store(store.clone())
    };
    let service = RecruitmentService::new(repositories, EligibilityPolicy::default(), clock.clone());
    Harness {
        service: Arc::new(service),
        store,
        clock,
    }
}

pub(super) struct FailingTimeline {
    inner: Arc<InMemoryRecruitmentStore>,
}

#[async_trait]
impl TimelineRepository for FailingTimeline {
    async fn append(
        &self,
        _application_id: &ApplicationId,
        _status: ApplicationStatus,
        _occurred_at: DateTime<Utc>,
        _description: &str,
    ) -> Result<TimelineEntry, RepositoryError> {
        Err(RepositoryError::Unavailable("timeline offline".to_string()))
    }

    async fn latest_by_status(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Option<TimelineEntry>, RepositoryError> {
        self.inner.latest_by_status(application_id, status).await
    }

    async fn exists_before(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
        before: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        self.inner
            .exists_before(application_id, status, before)
            .await
    }

    async fn list(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<TimelineEntry>, RepositoryError> {
        TimelineRepository::list(self.inner.as_ref(), application_id).await
    }
}

pub(super) struct StaleApplications {
    inner: Arc<InMemoryRecruitmentStore>,
}

#[async_trait]
impl ApplicationRepository for StaleApplications {
    async fn get(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        ApplicationRepository::get(self.inner.as_ref(), id).await
    }

    async fn create(&self, application: Application) -> Result<Application, RepositoryError> {
        ApplicationRepository::create(self.inner.as_ref(), application).await
    }

    async fn update(&self, application: Application) -> Result<Application, RepositoryError> {
        ApplicationRepository::update(self.inner.as_ref(), application).await
    }

    async fn list_by_applicant(
        &self,
        _applicant_id: &UserId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn find_active_by_applicant_and_job(
        &self,
        _applicant_id: &UserId,
        _job_id: &JobId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(None)
    }

    async fn find_latest_hired_by_applicant(
        &self,
        applicant_id: &UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        self.inner.find_latest_hired_by_applicant(applicant_id).await
    }

    async fn search(
        &self,
        filter: &ApplicationFilter,
        window: PageWindow,
    ) -> Result<Paged<Application>, RepositoryError> {
        self.inner.search(filter, window).await
    }
}

pub(super) struct StalledApplications;

impl StalledApplications {
    async fn stall<T: Send>() -> Result<T, RepositoryError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(RepositoryError::Unavailable("stalled".to_string()))
    }
}

#[async_trait]
impl ApplicationRepository for StalledApplications {
    async fn get(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Self::stall().await
    }

    async fn create(&self, _application: Application) -> Result<Application, RepositoryError> {
        Self::stall().await
    }

    async fn update(&self, _application: Application) -> Result<Application, RepositoryError> {
        Self::stall().await
    }

    async fn list_by_applicant(
        &self,
        _applicant_id: &UserId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Self::stall().await
    }

    async fn find_active_by_applicant_and_job(
        &self,
        _applicant_id: &UserId,
        _job_id: &JobId,
    ) -> Result<Option<Application>, RepositoryError> {
        Self::stall().await
    }

    async fn find_latest_hired_by_applicant(
        &self,
        _applicant_id: &UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        Self::stall().await
    }

    async fn search(
        &self,
        _filter: &ApplicationFilter,
        _window: PageWindow,
    ) -> Result<Paged<Application>, RepositoryError> {
        Self::stall().await
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
