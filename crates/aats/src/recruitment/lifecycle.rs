use serde::Serialize;

use super::domain::{Application, ApplicationStatus, Role, TimelineEntry};
use super::evaluation::Evaluation;

/// Role whose evaluation unlocks `offer` and `hired`.
pub const EVALUATOR_ROLE: Role = Role::HiringManager;

/// Reasons the evaluation gate refuses a transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateViolation {
    #[error("moving to '{target}' requires a hiring-manager evaluation first")]
    EvaluationRequired { target: ApplicationStatus },
    #[error("moving to '{target}' requires the evaluation to come from a hiring manager (evaluator role: {evaluator_role})")]
    InvalidEvaluator {
        target: ApplicationStatus,
        evaluator_role: Role,
    },
}

/// Check the evaluation gate for `target`.
///
/// `evaluator_role` is `None` when the evaluator could not be resolved, in which
/// case the evaluation's presence alone satisfies the gate.
pub fn check_gate(
    target: ApplicationStatus,
    evaluation: Option<&Evaluation>,
    evaluator_role: Option<Role>,
) -> Result<(), GateViolation> {
    if !target.requires_evaluation() {
        return Ok(());
    }

    if evaluation.is_none() {
        return Err(GateViolation::EvaluationRequired { target });
    }

    match evaluator_role {
        Some(role) if role != EVALUATOR_ROLE => Err(GateViolation::InvalidEvaluator {
            target,
            evaluator_role: role,
        }),
        _ => Ok(()),
    }
}

/// A best-effort write that failed after the primary change committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SideWriteWarning {
    pub operation: &'static str,
    pub detail: String,
}

impl SideWriteWarning {
    pub fn timeline(detail: impl Into<String>) -> Self {
        Self {
            operation: "timeline_append",
            detail: detail.into(),
        }
    }
}

/// Outcome of a primary write followed by best-effort side writes.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome<T> {
    Committed(T),
    CommittedWithWarning { value: T, warning: SideWriteWarning },
}

impl<T> WriteOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            WriteOutcome::Committed(value) | WriteOutcome::CommittedWithWarning { value, .. } => {
                value
            }
        }
    }

    pub fn warning(&self) -> Option<&SideWriteWarning> {
        match self {
            WriteOutcome::Committed(_) => None,
            WriteOutcome::CommittedWithWarning { warning, .. } => Some(warning),
        }
    }

    pub fn into_parts(self) -> (T, Option<SideWriteWarning>) {
        match self {
            WriteOutcome::Committed(value) => (value, None),
            WriteOutcome::CommittedWithWarning { value, warning } => (value, Some(warning)),
        }
    }
}

/// Result of an applied status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub application: Application,
    pub previous_status: ApplicationStatus,
    /// Absent when the timeline append failed.
    pub timeline_entry: Option<TimelineEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recruitment::domain::{ApplicationId, EvaluationId, UserId};
    use crate::recruitment::evaluation::ScoreCard;
    use chrono::{TimeZone, Utc};

    fn evaluation() -> Evaluation {
        Evaluation {
            id: EvaluationId::from("eval-1"),
            application_id: ApplicationId::from("app-1"),
            evaluator_id: UserId::from("hm-1"),
            scores: ScoreCard {
                technical: 4,
                communication: 4,
                problem_solving: 3,
                cultural_fit: 5,
            },
            overall_score: 4.0,
            strengths: String::new(),
            weaknesses: String::new(),
            comments: String::new(),
            evaluated_at: Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn ungated_statuses_pass_without_evaluation() {
        for status in ApplicationStatus::ALL {
            if status.requires_evaluation() {
                continue;
            }
            assert_eq!(check_gate(status, None, None), Ok(()), "{status}");
        }
    }

    #[test]
    fn offer_and_hired_need_an_evaluation() {
        for target in [ApplicationStatus::Offer, ApplicationStatus::Hired] {
            assert_eq!(
                check_gate(target, None, Some(Role::HiringManager)),
                Err(GateViolation::EvaluationRequired { target })
            );
        }
    }

    #[test]
    fn evaluator_role_must_be_hiring_manager_when_known() {
        let evaluation = evaluation();
        assert_eq!(
            check_gate(ApplicationStatus::Offer, Some(&evaluation), Some(Role::Hr)),
            Err(GateViolation::InvalidEvaluator {
                target: ApplicationStatus::Offer,
                evaluator_role: Role::Hr,
            })
        );
        assert!(check_gate(
            ApplicationStatus::Offer,
            Some(&evaluation),
            Some(Role::HiringManager)
        )
        .is_ok());
        assert!(check_gate(ApplicationStatus::Hired, Some(&evaluation), None).is_ok());
    }

    #[test]
    fn write_outcome_exposes_warning() {
        let clean = WriteOutcome::Committed(1);
        assert!(clean.warning().is_none());

        let warned = WriteOutcome::CommittedWithWarning {
            value: 2,
            warning: SideWriteWarning::timeline("store offline"),
        };
        assert_eq!(*warned.value(), 2);
        let (value, warning) = warned.into_parts();
        assert_eq!(value, 2);
        assert_eq!(warning.map(|w| w.operation), Some("timeline_append"));
    }
}
