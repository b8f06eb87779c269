use chrono::Duration;

use super::common::*;
use crate::recruitment::domain::{ApplicationId, ApplicationStatus, Role, UserAccount, UserId};
use crate::recruitment::lifecycle::{GateViolation, WriteOutcome};
use crate::recruitment::service::{ErrorKind, RecruitmentError, StatusUpdate};

async fn interviewing(harness: &Harness) -> ApplicationId {
    harness
        .insert(application(
            "a1",
            "job-1",
            ApplicationStatus::Interview,
            at(2025, 1, 2),
        ))
        .await;
    ApplicationId::from("a1")
}

#[tokio::test]
async fn offer_without_evaluation_is_refused_then_succeeds_after_evaluating() {
    let harness = harness().await;
    let id = interviewing(&harness).await;

    let err = harness
        .service
        .update_status(&hr(), &id, StatusUpdate::new(ApplicationStatus::Offer))
        .await
        .expect_err("no evaluation yet");
    assert!(matches!(
        err,
        RecruitmentError::Gate(GateViolation::EvaluationRequired {
            target: ApplicationStatus::Offer
        })
    ));
    assert_eq!(
        harness.stored(&id).await.status,
        ApplicationStatus::Interview
    );

    harness
        .service
        .upsert_evaluation(&hiring_manager(), &id, scores())
        .await
        .expect("evaluated");
    let outcome = harness
        .service
        .update_status(&hr(), &id, StatusUpdate::new(ApplicationStatus::Offer))
        .await
        .expect("gate satisfied");

    let change = outcome.value();
    assert_eq!(change.previous_status, ApplicationStatus::Interview);
    assert_eq!(change.application.status, ApplicationStatus::Offer);
    assert!(outcome.warning().is_none());
}

#[tokio::test]
async fn hired_without_evaluation_is_refused() {
    let harness = harness().await;
    let id = interviewing(&harness).await;

    let err = harness
        .service
        .update_status(&hr(), &id, StatusUpdate::new(ApplicationStatus::Hired))
        .await
        .expect_err("gate");
    assert_eq!(err.kind(), ErrorKind::EvaluationRequired);
}

#[tokio::test]
async fn evaluation_from_non_hiring_manager_fails_the_gate() {
    let harness = harness().await;
    let id = interviewing(&harness).await;
    harness
        .service
        .upsert_evaluation(&hr(), &id, scores())
        .await
        .expect("hr may record an evaluation");

    let err = harness
        .service
        .update_status(&hr(), &id, StatusUpdate::new(ApplicationStatus::Hired))
        .await
        .expect_err("evaluator is hr");
    assert!(matches!(
        err,
        RecruitmentError::Gate(GateViolation::InvalidEvaluator {
            evaluator_role: Role::Hr,
            ..
        })
    ));
    assert_eq!(err.kind().code(), "INVALID_EVALUATOR");
}

#[tokio::test]
async fn unresolvable_evaluator_lets_the_evaluation_stand() {
    let harness = harness().await;
    let id = interviewing(&harness).await;
    let ghost = crate::recruitment::domain::Caller::new("hm-departed", Role::HiringManager);
    harness
        .service
        .upsert_evaluation(&ghost, &id, scores())
        .await
        .expect("evaluated");

    harness
        .service
        .update_status(&hr(), &id, StatusUpdate::new(ApplicationStatus::Offer))
        .await
        .expect("evaluator not in directory");
}

#[tokio::test]
async fn evaluator_role_is_read_at_transition_time() {
    let harness = harness().await;
    let id = interviewing(&harness).await;
    harness
        .service
        .upsert_evaluation(&hiring_manager(), &id, scores())
        .await
        .expect("evaluated");

    harness
        .store
        .register_user(UserAccount {
            id: UserId::from(HIRING_MANAGER),
            name: "Dao Manager".to_string(),
            email: "hm-1@example.com".to_string(),
            role: Role::Hr,
        })
        .expect("role change");

    let err = harness
        .service
        .update_status(&hr(), &id, StatusUpdate::new(ApplicationStatus::Offer))
        .await
        .expect_err("evaluator no longer a hiring manager");
    assert_eq!(err.kind(), ErrorKind::InvalidEvaluator);
}

#[tokio::test]
async fn transition_appends_timeline_with_description() {
    let harness = harness().await;
    let id = interviewing(&harness).await;
    harness.clock.advance(Duration::days(3));

    let outcome = harness
        .service
        .update_status(
            &hiring_manager(),
            &id,
            StatusUpdate::new(ApplicationStatus::Rejected).with_description("Not a fit for the team"),
        )
        .await
        .expect("rejected");

    let change = outcome.value();
    let entry = change.timeline_entry.as_ref().expect("timeline entry");
    assert_eq!(entry.status, ApplicationStatus::Rejected);
    assert_eq!(entry.description, "Not a fit for the team");
    assert_eq!(entry.occurred_at, start() + Duration::days(3));
    assert_eq!(change.application.updated_at, start() + Duration::days(3));

    let history = harness.history(&id).await;
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn arbitrary_jumps_are_permitted() {
    let harness = harness().await;
    harness
        .insert(application(
            "a1",
            "job-1",
            ApplicationStatus::Rejected,
            at(2024, 12, 1),
        ))
        .await;
    let id = ApplicationId::from("a1");

    let outcome = harness
        .service
        .update_status(&hr(), &id, StatusUpdate::new(ApplicationStatus::Submitted))
        .await
        .expect("no transition graph beyond the gate");
    assert_eq!(outcome.value().previous_status, ApplicationStatus::Rejected);
    let entry = outcome
        .value()
        .timeline_entry
        .as_ref()
        .expect("timeline entry");
    assert_eq!(entry.description, "Status changed to submitted");
}

#[tokio::test]
async fn failed_timeline_append_keeps_the_status_change() {
    let harness = harness_with_failing_timeline().await;
    let id = interviewing(&harness).await;

    let outcome = harness
        .service
        .update_status(&hr(), &id, StatusUpdate::new(ApplicationStatus::Rejected))
        .await
        .expect("status committed");

    match outcome {
        WriteOutcome::CommittedWithWarning { value, warning } => {
            assert_eq!(value.application.status, ApplicationStatus::Rejected);
            assert!(value.timeline_entry.is_none());
            assert_eq!(warning.operation, "timeline_append");
            assert!(warning.detail.contains("timeline offline"));
        }
        other => panic!("expected warning, got {other:?}"),
    }
    assert_eq!(harness.stored(&id).await.status, ApplicationStatus::Rejected);
}

#[tokio::test]
async fn failed_timeline_append_on_submit_is_a_warning() {
    let harness = harness_with_failing_timeline().await;
    let outcome = harness
        .service
        .submit(&candidate(), submission("job-1"))
        .await
        .expect("application committed");

    let (application, warning) = outcome.into_parts();
    assert!(warning.is_some());
    assert_eq!(
        harness.stored(&application.id).await.status,
        ApplicationStatus::Submitted
    );
}

#[tokio::test]
async fn candidates_may_only_withdraw_their_own_application() {
    let harness = harness().await;
    let id = interviewing(&harness).await;

    let err = harness
        .service
        .update_status(&candidate(), &id, StatusUpdate::new(ApplicationStatus::Offer))
        .await
        .expect_err("candidates cannot promote themselves");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = harness
        .service
        .update_status(
            &other_candidate(),
            &id,
            StatusUpdate::new(ApplicationStatus::Withdrawn),
        )
        .await
        .expect_err("not their application");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    harness
        .service
        .update_status(
            &candidate(),
            &id,
            StatusUpdate::new(ApplicationStatus::Withdrawn),
        )
        .await
        .expect("own withdrawal");
}

#[tokio::test]
async fn reactivating_next_to_a_live_sibling_is_a_duplicate() {
    let harness = harness().await;
    let mut withdrawn = application("old", "job-1", ApplicationStatus::Withdrawn, at(2024, 11, 1));
    withdrawn.updated_at = at(2024, 11, 5);
    harness.insert(withdrawn).await;
    harness
        .insert(application(
            "new",
            "job-1",
            ApplicationStatus::Screening,
            at(2024, 12, 1),
        ))
        .await;

    let err = harness
        .service
        .update_status(
            &hr(),
            &ApplicationId::from("old"),
            StatusUpdate::new(ApplicationStatus::Interview),
        )
        .await
        .expect_err("would create two live applications");
    assert_eq!(err.kind(), ErrorKind::DuplicateActiveApplication);
    assert_eq!(
        harness.stored(&ApplicationId::from("old")).await.status,
        ApplicationStatus::Withdrawn
    );
}

#[tokio::test]
async fn unknown_application_is_not_found() {
    let harness = harness().await;
    let err = harness
        .service
        .update_status(
            &hr(),
            &ApplicationId::from("missing"),
            StatusUpdate::new(ApplicationStatus::Screening),
        )
        .await
        .expect_err("missing");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
