use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, EvaluationId, UserId};

/// Bounds every sub-score must respect.
pub const SCORE_RANGE: RangeInclusive<u8> = 1..=5;

/// The four rubric dimensions a hiring manager scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub technical: u8,
    pub communication: u8,
    pub problem_solving: u8,
    pub cultural_fit: u8,
}

impl ScoreCard {
    pub fn mean(&self) -> f32 {
        let sum = u16::from(self.technical)
            + u16::from(self.communication)
            + u16::from(self.problem_solving)
            + u16::from(self.cultural_fit);
        f32::from(sum) / 4.0
    }

    fn fields(&self) -> [(&'static str, u8); 4] {
        [
            ("technical", self.technical),
            ("communication", self.communication),
            ("problem_solving", self.problem_solving),
            ("cultural_fit", self.cultural_fit),
        ]
    }

    pub fn validate(&self) -> Result<(), ScoreOutOfRange> {
        for (field, value) in self.fields() {
            if !SCORE_RANGE.contains(&value) {
                return Err(ScoreOutOfRange {
                    field,
                    value: f32::from(value),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field} must be between 1 and 5 (got {value})")]
pub struct ScoreOutOfRange {
    pub field: &'static str,
    pub value: f32,
}

/// The single evaluation attached to an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub application_id: ApplicationId,
    pub evaluator_id: UserId,
    pub scores: ScoreCard,
    pub overall_score: f32,
    pub strengths: String,
    pub weaknesses: String,
    pub comments: String,
    pub evaluated_at: DateTime<Utc>,
}

/// Caller-supplied evaluation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSubmission {
    pub scores: ScoreCard,
    #[serde(default)]
    pub overall_score: Option<f32>,
    #[serde(default)]
    pub strengths: String,
    #[serde(default)]
    pub weaknesses: String,
    #[serde(default)]
    pub comments: String,
}

impl EvaluationSubmission {
    /// Validate the payload and turn it into a record ready for upsert.
    ///
    /// The overall score falls back to the mean of the sub-scores.
    pub fn into_evaluation(
        self,
        application_id: ApplicationId,
        evaluator_id: UserId,
        evaluated_at: DateTime<Utc>,
    ) -> Result<Evaluation, ScoreOutOfRange> {
        self.scores.validate()?;

        let overall_score = match self.overall_score {
            Some(explicit) => {
                let min = f32::from(*SCORE_RANGE.start());
                let max = f32::from(*SCORE_RANGE.end());
                if !(min..=max).contains(&explicit) {
                    return Err(ScoreOutOfRange {
                        field: "overall_score",
                        value: explicit,
                    });
                }
                explicit
            }
            None => self.scores.mean(),
        };

        Ok(Evaluation {
            id: EvaluationId::generate(),
            application_id,
            evaluator_id,
            scores: self.scores,
            overall_score,
            strengths: self.strengths,
            weaknesses: self.weaknesses,
            comments: self.comments,
            evaluated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn submission(scores: ScoreCard, overall_score: Option<f32>) -> EvaluationSubmission {
        EvaluationSubmission {
            scores,
            overall_score,
            strengths: "systems thinking".to_string(),
            weaknesses: String::new(),
            comments: String::new(),
        }
    }

    fn cards() -> ScoreCard {
        ScoreCard {
            technical: 5,
            communication: 4,
            problem_solving: 4,
            cultural_fit: 2,
        }
    }

    #[test]
    fn overall_defaults_to_mean_of_sub_scores() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let evaluation = submission(cards(), None)
            .into_evaluation(ApplicationId::from("app-1"), UserId::from("hm-1"), at)
            .expect("valid scores");

        assert!((evaluation.overall_score - 3.75).abs() < f32::EPSILON);
        assert_eq!(evaluation.evaluated_at, at);
    }

    #[test]
    fn explicit_overall_is_kept() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let evaluation = submission(cards(), Some(4.5))
            .into_evaluation(ApplicationId::from("app-1"), UserId::from("hm-1"), at)
            .expect("valid scores");

        assert!((evaluation.overall_score - 4.5).abs() < f32::EPSILON);
    }

    #[test]
    fn out_of_range_sub_score_names_the_field() {
        let mut scores = cards();
        scores.problem_solving = 0;
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();

        let err = submission(scores, None)
            .into_evaluation(ApplicationId::from("app-1"), UserId::from("hm-1"), at)
            .expect_err("zero is below range");

        assert_eq!(err.field, "problem_solving");
        assert!(err.to_string().contains("between 1 and 5"));
    }

    #[test]
    fn out_of_range_overall_is_rejected() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let err = submission(cards(), Some(7.0))
            .into_evaluation(ApplicationId::from("app-1"), UserId::from("hm-1"), at)
            .expect_err("overall above range");

        assert_eq!(err.field, "overall_score");
    }
}
