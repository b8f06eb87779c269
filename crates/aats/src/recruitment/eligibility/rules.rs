use chrono::{DateTime, Datelike, Duration, Months, Utc};

use super::super::domain::{Application, ApplicationId, JobId};
use super::policy::EligibilityPolicy;
use super::{CooldownWindow, RejectionFacts, RejectionStage};

/// Calendar-month addition that keeps the day of month; a day past the end of
/// the target month rolls over into the next one (Nov 30 + 3 months = Mar 2).
pub(crate) fn add_months(at: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let overflow_days = i64::from(at.day0());
    at.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(months)))
        .and_then(|shifted| shifted.checked_add_signed(Duration::days(overflow_days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub(crate) fn count_toward_cap(applications: &[Application]) -> usize {
    applications
        .iter()
        .filter(|application| application.status.counts_toward_cap())
        .count()
}

/// Latest submission for the job; equal timestamps fall back to the larger id.
pub(crate) fn most_recent_for_job<'a>(
    applications: &'a [Application],
    job_id: &JobId,
) -> Option<&'a Application> {
    applications
        .iter()
        .filter(|application| &application.job_id == job_id)
        .fold(None, |latest: Option<&Application>, candidate| match latest {
            Some(current) if recency(current) >= recency(candidate) => Some(current),
            _ => Some(candidate),
        })
}

fn recency(application: &Application) -> (DateTime<Utc>, &ApplicationId) {
    (application.submitted_at, &application.id)
}

pub(crate) fn rejection_window(
    facts: &RejectionFacts,
    policy: &EligibilityPolicy,
) -> CooldownWindow {
    let (stage, waiting_months) = if facts.interviewed_before {
        (
            RejectionStage::PostInterview,
            policy.interview_cooldown_months,
        )
    } else {
        (RejectionStage::Screening, policy.screening_cooldown_months)
    };

    CooldownWindow {
        stage,
        waiting_months,
        eligible_at: add_months(facts.rejected_at, waiting_months),
    }
}

pub(crate) fn hire_eligible_at(hired: &Application, policy: &EligibilityPolicy) -> DateTime<Utc> {
    add_months(hired.updated_at, policy.hire_cooldown_months)
}
