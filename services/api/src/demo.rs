use crate::infra::{seeded_store_at, DEMO_CANDIDATE, DEMO_HIRING_MANAGER, DEMO_HR};
use aats::error::AppError;
use aats::recruitment::{
    ApplicationId, ApplicationStatus, ApplicationSubmission, Caller, EligibilityPolicy,
    EvaluationSubmission, FixedClock, JobId, RecruitmentError, RecruitmentRepositories,
    RecruitmentService, Role, ScoreCard, StatusUpdate, UserId,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the scenario starts on (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Print the final application timeline as JSON.
    #[arg(long)]
    pub(crate) show_timeline: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let start = match args.start {
        Some(date) => date.and_hms_opt(9, 0, 0).map(|naive| naive.and_utc()),
        None => Some(Utc::now()),
    }
    .ok_or_else(|| RecruitmentError::InvalidRequest("start date out of range".to_string()))?;

    let clock = Arc::new(FixedClock::new(start));
    let store = seeded_store_at(start).await?;
    let service = RecruitmentService::new(
        RecruitmentRepositories::from_store(store),
        EligibilityPolicy::default(),
        clock.clone(),
    );

    let candidate = Caller::new(DEMO_CANDIDATE, Role::Candidate);
    let hr = Caller::new(DEMO_HR, Role::Hr);
    let manager = Caller::new(DEMO_HIRING_MANAGER, Role::HiringManager);

    println!("Applicant tracking demo starting {}", format_instant(start));

    println!("\nScreening rejection and cooldown");
    let backend = service
        .submit(&candidate, submission("job-backend"))
        .await?
        .into_parts()
        .0;
    println!("- {} applied to job-backend ({})", DEMO_CANDIDATE, backend.id);

    clock.advance(Duration::days(4));
    move_to(&service, &hr, &backend.id, ApplicationStatus::Screening, None).await?;
    clock.advance(Duration::days(2));
    move_to(
        &service,
        &hr,
        &backend.id,
        ApplicationStatus::Rejected,
        Some("Missing distributed systems experience"),
    )
    .await?;

    clock.advance(Duration::days(30));
    report_attempt(&service, &candidate, "job-backend").await?;

    println!("\nInterview, evaluation gate and hire");
    let design = service
        .submit(&candidate, submission("job-design"))
        .await?
        .into_parts()
        .0;
    println!("- {} applied to job-design ({})", DEMO_CANDIDATE, design.id);

    for status in [ApplicationStatus::Screening, ApplicationStatus::Interview] {
        clock.advance(Duration::days(3));
        move_to(&service, &hr, &design.id, status, None).await?;
    }

    match service
        .update_status(&hr, &design.id, StatusUpdate::new(ApplicationStatus::Offer))
        .await
    {
        Ok(_) => println!("  Offer went through without an evaluation"),
        Err(err) => println!("  Offer refused [{}]: {}", err.kind().code(), err),
    }

    let evaluation = service
        .upsert_evaluation(&manager, &design.id, evaluation())
        .await?
        .into_inner();
    println!(
        "  {} recorded an evaluation (overall {:.2})",
        DEMO_HIRING_MANAGER, evaluation.overall_score
    );

    clock.advance(Duration::days(1));
    move_to(&service, &hr, &design.id, ApplicationStatus::Offer, None).await?;
    clock.advance(Duration::days(5));
    move_to(&service, &hr, &design.id, ApplicationStatus::Hired, None).await?;

    println!("\nRe-application after hire");
    if let Some(eligible_at) = report_attempt(&service, &candidate, "job-data").await? {
        clock.set(eligible_at);
        println!("- clock moved to {}", format_instant(eligible_at));
        report_attempt(&service, &candidate, "job-data").await?;
    }

    if args.show_timeline {
        let detail = service.application_detail(&hr, &design.id).await?;
        match serde_json::to_string_pretty(&detail.timeline) {
            Ok(json) => println!("\nTimeline for {}:\n{}", design.id, json),
            Err(err) => println!("\nTimeline unavailable: {}", err),
        }
    }

    Ok(())
}

async fn move_to(
    service: &RecruitmentService,
    caller: &Caller,
    application_id: &ApplicationId,
    status: ApplicationStatus,
    description: Option<&str>,
) -> Result<(), RecruitmentError> {
    let mut update = StatusUpdate::new(status);
    if let Some(description) = description {
        update = update.with_description(description);
    }

    let (change, warning) = service
        .update_status(caller, application_id, update)
        .await?
        .into_parts();
    println!(
        "  {} -> {} at {}",
        change.previous_status,
        change.application.status,
        format_instant(change.application.updated_at)
    );
    if let Some(warning) = warning {
        println!("  warning: {} ({})", warning.operation, warning.detail);
    }
    Ok(())
}

/// Submits when eligible; otherwise prints the refusal and returns when the
/// applicant may try again.
async fn report_attempt(
    service: &RecruitmentService,
    candidate: &Caller,
    job: &str,
) -> Result<Option<DateTime<Utc>>, RecruitmentError> {
    let report = service
        .check_eligibility(candidate, &candidate.id, &JobId::from(job))
        .await?;
    if report.eligible {
        let application = service
            .submit(candidate, submission(job))
            .await?
            .into_parts()
            .0;
        println!("- application to {} accepted ({})", job, application.id);
        return Ok(None);
    }

    println!(
        "- application to {} refused [{}]: {}",
        job,
        report.reason.unwrap_or("UNKNOWN"),
        report.message.as_deref().unwrap_or("")
    );
    if let Some(eligible_at) = report.eligible_at {
        println!("  eligible again at {}", format_instant(eligible_at));
    }
    Ok(report.eligible_at)
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn submission(job: &str) -> ApplicationSubmission {
    ApplicationSubmission {
        job_id: JobId::from(job),
        applicant_id: Some(UserId::from(DEMO_CANDIDATE)),
        resume: "nok-srisuk-cv.pdf".to_string(),
        cover_letter: "I would love to join the team.".to_string(),
        education: "BEng Computer Engineering".to_string(),
        experience: "4 years".to_string(),
        skills: "rust, sql, figma".to_string(),
    }
}

fn evaluation() -> EvaluationSubmission {
    EvaluationSubmission {
        scores: ScoreCard {
            technical: 4,
            communication: 5,
            problem_solving: 4,
            cultural_fit: 5,
        },
        overall_score: None,
        strengths: "Clear communicator with a strong portfolio".to_string(),
        weaknesses: "Limited large-team experience".to_string(),
        comments: "Recommend hire".to_string(),
    }
}
