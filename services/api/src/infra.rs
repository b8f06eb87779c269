use aats::recruitment::repository::JobRepository;
use aats::recruitment::{
    InMemoryRecruitmentStore, JobId, JobPosting, JobStatus, RecruitmentError, Role, UserAccount,
    UserId,
};
use chrono::{DateTime, Months, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) const DEMO_CANDIDATE: &str = "cand-nok";
pub(crate) const DEMO_HR: &str = "hr-pim";
pub(crate) const DEMO_HIRING_MANAGER: &str = "hm-dao";

const DEMO_USERS: [(&str, &str, Role); 4] = [
    (DEMO_CANDIDATE, "Nok Srisuk", Role::Candidate),
    ("cand-arthit", "Arthit Chai", Role::Candidate),
    (DEMO_HR, "Pim Rattana", Role::Hr),
    (DEMO_HIRING_MANAGER, "Dao Wong", Role::HiringManager),
];

const DEMO_JOBS: [(&str, &str, &str); 3] = [
    ("job-backend", "Backend Engineer", "Engineering"),
    ("job-design", "Product Designer", "Design"),
    ("job-data", "Data Analyst", "Analytics"),
];

/// In-memory store pre-loaded with a handful of accounts and open postings.
pub(crate) async fn seeded_store() -> Result<Arc<InMemoryRecruitmentStore>, RecruitmentError> {
    seeded_store_at(Utc::now()).await
}

pub(crate) async fn seeded_store_at(
    posted_at: DateTime<Utc>,
) -> Result<Arc<InMemoryRecruitmentStore>, RecruitmentError> {
    let store = Arc::new(InMemoryRecruitmentStore::new());

    for (id, name, role) in DEMO_USERS {
        store.register_user(UserAccount {
            id: UserId::from(id),
            name: name.to_string(),
            email: format!("{id}@example.com"),
            role,
        })?;
    }

    let closing_at = posted_at
        .checked_add_months(Months::new(2))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    for (id, title, department) in DEMO_JOBS {
        store
            .create(JobPosting {
                id: JobId::from(id),
                title: title.to_string(),
                department: department.to_string(),
                location: "Bangkok".to_string(),
                experience_level: "mid".to_string(),
                description: String::new(),
                requirements: String::new(),
                responsibilities: String::new(),
                status: JobStatus::Active,
                posted_at,
                closing_at,
                created_by: UserId::from(DEMO_HR),
                updated_at: posted_at,
            })
            .await?;
    }

    Ok(store)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
