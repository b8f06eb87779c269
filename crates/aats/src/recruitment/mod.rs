//! Application lifecycle for the hiring pipeline.
//!
//! Submissions pass through the re-application eligibility engine, status
//! changes into `offer`/`hired` pass through the evaluation gate, and every
//! committed status change is mirrored into the append-only timeline.

pub mod clock;
pub mod domain;
pub mod eligibility;
pub mod evaluation;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, Caller, JobId, JobPosting, JobStatus, Note,
    Role, TimelineEntry, UserAccount, UserId,
};
pub use eligibility::{
    EligibilityEngine, EligibilityPolicy, Ineligibility, ReapplyAnnotation, RejectionStage,
};
pub use evaluation::{Evaluation, EvaluationSubmission, ScoreCard};
pub use lifecycle::{SideWriteWarning, StatusChange, WriteOutcome};
pub use memory::InMemoryRecruitmentStore;
pub use repository::{RecruitmentRepositories, RepositoryError, Upsert};
pub use router::recruitment_router;
pub use service::{
    ApplicationQuery, ApplicationSubmission, ErrorKind, JobDraft, JobUpdate, NoteDraft,
    RecruitmentError, RecruitmentService, StatusUpdate,
};
