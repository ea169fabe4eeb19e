//! Launch orchestration.
//!
//! A launch saves the campaign first and only then attaches the dependent
//! resources:
//!
//! 1. create the campaign (or update it when the draft already has an id);
//!    any failure here aborts the launch,
//! 2. create the follow-up sequence and link it to the campaign, when the
//!    draft has follow-ups,
//! 3. bulk-add the pending recipients, when there are any.
//!
//! Steps 2 and 3 are best effort. Each failure is captured in the
//! [`LaunchReport`] on its own so the caller can report both.

use reach_client::{ClientError, SmsBackend};
use reach_core::draft::CampaignDraft;
use reach_core::error::CoreError;
use reach_core::recipients::Recipient;
use reach_core::types::RecordId;
use reach_core::wizard::{validate_step, WizardStep};

use crate::payload::{campaign_payload, recipient_items, sequence_payload};

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

/// A launch that did not leave a saved campaign behind.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// Launching is only possible from the review step.
    #[error("Campaign can only be launched from the review step (current step: {0})")]
    NotOnReview(WizardStep),

    /// The draft no longer passes a required step's validation.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// The create or update call failed.
    #[error("Failed to save campaign: {0}")]
    Save(#[source] ClientError),

    /// The session was already launched or closed.
    #[error("Wizard session is closed")]
    SessionClosed,
}

/// A dependent launch step that failed after the campaign was saved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartialLaunchError {
    #[error("Failed to create follow-ups: {0}")]
    FollowUps(String),

    #[error("Failed to add recipients: {0}")]
    Recipients(String),
}

/// Outcome of one best-effort launch step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing to submit.
    Skipped,
    Succeeded { count: usize },
    Failed(PartialLaunchError),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Result of a launch whose campaign save succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    pub campaign_id: RecordId,
    /// `true` when the campaign was created, `false` when updated.
    pub created: bool,
    pub follow_ups: StepOutcome,
    pub recipients: StepOutcome,
    /// Where the caller should go next (the campaign list).
    pub redirect_to: String,
}

impl LaunchReport {
    /// Whether every dependent step either succeeded or had nothing to do.
    pub fn is_complete(&self) -> bool {
        !self.follow_ups.is_failed() && !self.recipients.is_failed()
    }

    /// The dependent-step failures, follow-ups first.
    pub fn failures(&self) -> Vec<&PartialLaunchError> {
        [&self.follow_ups, &self.recipients]
            .into_iter()
            .filter_map(|outcome| match outcome {
                StepOutcome::Failed(e) => Some(e),
                _ => None,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Check the steps that gate navigation, so a draft edited after reaching
/// review cannot be launched half-empty.
pub fn validate_for_launch(
    draft: &CampaignDraft,
    recipients: &[Recipient],
) -> Result<(), CoreError> {
    for step in WizardStep::ALL {
        validate_step(step, draft, recipients)?;
    }
    Ok(())
}

/// Run the three launch steps against `backend`.
///
/// On success `draft.campaign_id` holds the saved id. When the save fails
/// the draft is left exactly as it was and nothing else is attempted.
pub async fn launch_campaign(
    backend: &dyn SmsBackend,
    draft: &mut CampaignDraft,
    recipients: &[Recipient],
    redirect_to: &str,
) -> Result<LaunchReport, LaunchError> {
    validate_for_launch(draft, recipients)?;

    let payload = campaign_payload(draft, recipients.len());
    let (campaign_id, created) = match draft.campaign_id.clone() {
        None => {
            let campaign = backend.create_campaign(&payload).await.map_err(|e| {
                tracing::error!(error = %e, "Failed to create campaign");
                LaunchError::Save(e)
            })?;
            (campaign.id, true)
        }
        Some(id) => {
            backend.update_campaign(&id, &payload).await.map_err(|e| {
                tracing::error!(campaign_id = %id, error = %e, "Failed to update campaign");
                LaunchError::Save(e)
            })?;
            (id, false)
        }
    };
    draft.campaign_id = Some(campaign_id.clone());
    tracing::info!(%campaign_id, created, "Campaign saved");

    let follow_ups = attach_follow_ups(backend, draft, &campaign_id).await;
    let recipients = attach_recipients(backend, &campaign_id, recipients).await;

    Ok(LaunchReport {
        campaign_id,
        created,
        follow_ups,
        recipients,
        redirect_to: redirect_to.to_string(),
    })
}

async fn attach_follow_ups(
    backend: &dyn SmsBackend,
    draft: &CampaignDraft,
    campaign_id: &str,
) -> StepOutcome {
    if draft.follow_ups.is_empty() {
        return StepOutcome::Skipped;
    }

    let result = async {
        let sequence = backend.create_sequence(&sequence_payload(draft)).await?;
        backend.link_sequence(campaign_id, &sequence.id).await?;
        Ok::<_, ClientError>(sequence.id)
    }
    .await;

    match result {
        Ok(sequence_id) => {
            tracing::info!(%campaign_id, %sequence_id, "Follow-up sequence linked");
            StepOutcome::Succeeded {
                count: draft.follow_ups.len(),
            }
        }
        Err(e) => {
            tracing::warn!(%campaign_id, error = %e, "Failed to create follow-ups");
            StepOutcome::Failed(PartialLaunchError::FollowUps(e.to_string()))
        }
    }
}

async fn attach_recipients(
    backend: &dyn SmsBackend,
    campaign_id: &str,
    recipients: &[Recipient],
) -> StepOutcome {
    if recipients.is_empty() {
        return StepOutcome::Skipped;
    }

    match backend
        .add_recipients(&recipient_items(campaign_id, recipients))
        .await
    {
        Ok(_) => {
            tracing::info!(%campaign_id, count = recipients.len(), "Recipients added");
            StepOutcome::Succeeded {
                count: recipients.len(),
            }
        }
        Err(e) => {
            tracing::warn!(%campaign_id, error = %e, "Failed to add recipients");
            StepOutcome::Failed(PartialLaunchError::Recipients(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_failures_in_order() {
        let report = LaunchReport {
            campaign_id: "1".into(),
            created: true,
            follow_ups: StepOutcome::Failed(PartialLaunchError::FollowUps("500".into())),
            recipients: StepOutcome::Failed(PartialLaunchError::Recipients("timeout".into())),
            redirect_to: "/x".into(),
        };
        assert!(!report.is_complete());
        let messages: Vec<_> = report.failures().iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            ["Failed to create follow-ups: 500", "Failed to add recipients: timeout"]
        );
    }

    #[test]
    fn skipped_steps_are_complete() {
        let report = LaunchReport {
            campaign_id: "1".into(),
            created: false,
            follow_ups: StepOutcome::Skipped,
            recipients: StepOutcome::Succeeded { count: 2 },
            redirect_to: "/x".into(),
        };
        assert!(report.is_complete());
        assert!(report.failures().is_empty());
    }
}
