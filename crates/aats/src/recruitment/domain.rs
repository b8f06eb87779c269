use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Mint a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier wrapper for submitted applications.
    ApplicationId
);
string_id!(
    /// Identifier of a job posting.
    JobId
);
string_id!(
    /// Identifier of a user account (applicant, HR, or hiring manager).
    UserId
);
string_id!(EvaluationId);
string_id!(TimelineEntryId);
string_id!(NoteId);

/// Lifecycle status of an application.
///
/// Any status may replace any other; the only enforced rule is the evaluation
/// gate in front of `Offer` and `Hired` (see `lifecycle::check_gate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    Screening,
    Interview,
    Offer,
    Rejected,
    Withdrawn,
    Hired,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 7] = [
        ApplicationStatus::Submitted,
        ApplicationStatus::Screening,
        ApplicationStatus::Interview,
        ApplicationStatus::Offer,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
        ApplicationStatus::Hired,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Screening => "screening",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
            ApplicationStatus::Hired => "hired",
        }
    }

    /// Still in flight for its (applicant, job) pair.
    pub const fn is_active(self) -> bool {
        !matches!(
            self,
            ApplicationStatus::Rejected | ApplicationStatus::Withdrawn | ApplicationStatus::Hired
        )
    }

    /// Counted against the per-applicant concurrency cap.
    pub const fn counts_toward_cap(self) -> bool {
        !matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Hired)
    }

    /// Entering this status requires a hiring-manager evaluation.
    pub const fn requires_evaluation(self) -> bool {
        matches!(self, ApplicationStatus::Offer | ApplicationStatus::Hired)
    }

    /// Evaluations may be recorded (and are exposed) from interview onwards.
    pub const fn is_evaluation_stage(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Interview | ApplicationStatus::Offer | ApplicationStatus::Hired
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown application status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

/// Roles known to the identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "candidate")]
    Candidate,
    #[serde(rename = "hr")]
    Hr,
    #[serde(rename = "hm")]
    HiringManager,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Candidate => "candidate",
            Role::Hr => "hr",
            Role::HiringManager => "hm",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "candidate" | "applicant" => Ok(Role::Candidate),
            "hr" => Ok(Role::Hr),
            "hm" | "hiring_manager" => Ok(Role::HiringManager),
            _ => Err(UnknownRole(value.to_string())),
        }
    }
}

/// Resolved identity of whoever is calling into the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn new(id: impl Into<UserId>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// HR may act on behalf of any applicant.
    pub fn is_privileged(&self) -> bool {
        self.role == Role::Hr
    }

    /// Staff roles that review applications, score them, and keep notes.
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Hr | Role::HiringManager)
    }
}

/// A candidate's application to one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub applicant_id: UserId,
    pub resume: String,
    pub cover_letter: String,
    pub education: String,
    pub experience: String,
    pub skills: String,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only record of a status being entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: TimelineEntryId,
    pub application_id: ApplicationId,
    pub status: ApplicationStatus,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    Closed,
    Draft,
}

/// Advertised position candidates apply to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub title: String,
    pub department: String,
    pub location: String,
    pub experience_level: String,
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub responsibilities: String,
    pub status: JobStatus,
    pub posted_at: DateTime<Utc>,
    pub closing_at: DateTime<Utc>,
    pub created_by: UserId,
    pub updated_at: DateTime<Utc>,
}

/// Free-text remark left by HR or a hiring manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub application_id: ApplicationId,
    pub author: String,
    pub created_by: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Directory entry used to resolve evaluator roles and note authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}
