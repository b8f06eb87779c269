//! Applicant tracking core.
//!
//! The `recruitment` module owns the application lifecycle: submission with
//! re-application eligibility, status transitions gated on hiring-manager
//! evaluations, evaluation upserts, and HR notes. Persistence and identity are
//! reached through the collaborator traits in `recruitment::repository`.

pub mod config;
pub mod error;
pub mod recruitment;
pub mod telemetry;
