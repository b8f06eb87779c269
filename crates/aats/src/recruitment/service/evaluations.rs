use tracing::info;

use super::{RecruitmentError, RecruitmentService};
use crate::recruitment::domain::{ApplicationId, Caller};
use crate::recruitment::evaluation::{Evaluation, EvaluationSubmission};
use crate::recruitment::repository::Upsert;

impl RecruitmentService {
    /// Create or replace the evaluation for an application.
    ///
    /// The caller becomes the evaluator. Only applications at interview or
    /// later accept evaluations.
    pub async fn upsert_evaluation(
        &self,
        caller: &Caller,
        application_id: &ApplicationId,
        submission: EvaluationSubmission,
    ) -> Result<Upsert<Evaluation>, RecruitmentError> {
        if !caller.is_staff() {
            return Err(RecruitmentError::forbidden(
                "only HR or hiring managers may evaluate applications",
            ));
        }

        let application = self.load_application(application_id).await?;
        if !application.status.is_evaluation_stage() {
            return Err(RecruitmentError::EvaluationNotAllowedYet {
                status: application.status,
            });
        }

        let evaluation =
            submission.into_evaluation(application.id, caller.id.clone(), self.now())?;
        let stored = self
            .guarded(self.repositories.evaluations.upsert(evaluation))
            .await?;

        info!(
            application_id = %application_id,
            evaluator_id = %caller.id,
            created = stored.created(),
            "evaluation recorded"
        );
        Ok(stored)
    }

    /// The evaluation for an application.
    ///
    /// Candidates see it only for their own application and only once the
    /// application has reached the interview stage.
    pub async fn evaluation(
        &self,
        caller: &Caller,
        application_id: &ApplicationId,
    ) -> Result<Evaluation, RecruitmentError> {
        let application = self.load_application(application_id).await?;
        Self::ensure_can_view(caller, &application)?;

        let hidden = !caller.is_staff() && !application.status.is_evaluation_stage();
        let evaluation = if hidden {
            None
        } else {
            self.guarded(
                self.repositories
                    .evaluations
                    .get_by_application(application_id),
            )
            .await?
        };

        evaluation.ok_or_else(|| RecruitmentError::not_found("evaluation", application_id))
    }
}
