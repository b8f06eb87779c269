use serde::{Deserialize, Serialize};

/// Limits and waiting periods applied to new submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityPolicy {
    pub max_active_applications: usize,
    pub screening_cooldown_months: u32,
    pub interview_cooldown_months: u32,
    pub hire_cooldown_months: u32,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            max_active_applications: 5,
            screening_cooldown_months: 3,
            interview_cooldown_months: 6,
            hire_cooldown_months: 3,
        }
    }
}
