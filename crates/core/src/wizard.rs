//! Campaign wizard step definitions and gating.
//!
//! Defines the six wizard steps, their fixed order, the per-step validation
//! predicate used to gate forward navigation, and the [`StepController`]
//! that owns the current step pointer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::draft::CampaignDraft;
use crate::error::CoreError;
use crate::recipients::Recipient;

// ---------------------------------------------------------------------------
// Wizard steps
// ---------------------------------------------------------------------------

/// The six steps of the SMS campaign wizard, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Account,
    Content,
    #[serde(rename = "followups")]
    FollowUps,
    Audience,
    Settings,
    Review,
}

/// Total number of steps in the wizard.
pub const TOTAL_STEPS: usize = 6;

impl WizardStep {
    /// Every step in navigation order.
    pub const ALL: [WizardStep; TOTAL_STEPS] = [
        Self::Account,
        Self::Content,
        Self::FollowUps,
        Self::Audience,
        Self::Settings,
        Self::Review,
    ];

    /// The step a new session starts on.
    pub const FIRST: WizardStep = Self::Account;

    /// The final step, from which the campaign is launched.
    pub const LAST: WizardStep = Self::Review;

    /// Zero-based index into [`WizardStep::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::Account => 0,
            Self::Content => 1,
            Self::FollowUps => 2,
            Self::Audience => 3,
            Self::Settings => 4,
            Self::Review => 5,
        }
    }

    /// One-based position, as shown in "step 2 of 6".
    pub fn position(self) -> usize {
        self.index() + 1
    }

    /// Convert a 1-based position back to a step.
    pub fn from_position(n: usize) -> Result<Self, CoreError> {
        n.checked_sub(1)
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| {
                CoreError::InvalidInput(format!(
                    "Invalid step position {n}. Must be between 1 and {TOTAL_STEPS}"
                ))
            })
    }

    /// The step after this one, or `None` on the last step.
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// The step before this one, or `None` on the first step.
    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Content => "content",
            Self::FollowUps => "followups",
            Self::Audience => "audience",
            Self::Settings => "settings",
            Self::Review => "review",
        }
    }

    /// Human-readable title for the step.
    pub fn title(self) -> &'static str {
        match self {
            Self::Account => "SMS Account",
            Self::Content => "Content",
            Self::FollowUps => "Follow-ups",
            Self::Audience => "Audience",
            Self::Settings => "Settings",
            Self::Review => "Review",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Account => "Choose the SMS service to send from",
            Self::Content => "Create your SMS content and campaign basics",
            Self::FollowUps => "Set up follow-up SMS messages to increase response rates",
            Self::Audience => "Select your recipients and target audience",
            Self::Settings => "Configure sending schedule and preferences",
            Self::Review => "Review and launch your SMS campaign",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardStep {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| {
                CoreError::InvalidInput(format!(
                    "Invalid wizard step '{s}'. Must be one of: account, content, followups, audience, settings, review"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that `step` can be left in the forward direction.
///
/// The account step only needs a campaign name; a sender number is not
/// required so a campaign can still be drafted when no telephony provider
/// is connected.
pub fn validate_step(
    step: WizardStep,
    draft: &CampaignDraft,
    recipients: &[Recipient],
) -> Result<(), CoreError> {
    match step {
        WizardStep::Account => {
            if draft.name.trim().is_empty() {
                return Err(CoreError::Validation(
                    "Please enter a campaign name".to_string(),
                ));
            }
        }
        WizardStep::Content => {
            if draft.message.trim().is_empty() {
                return Err(CoreError::Validation("Please enter a message".to_string()));
            }
        }
        WizardStep::Audience => {
            if recipients.is_empty() {
                return Err(CoreError::Validation(
                    "Please add at least one recipient".to_string(),
                ));
            }
        }
        WizardStep::FollowUps | WizardStep::Settings | WizardStep::Review => {}
    }

    Ok(())
}

/// Whether the wizard may advance past `step` with the given draft.
pub fn can_proceed(step: WizardStep, draft: &CampaignDraft, recipients: &[Recipient]) -> bool {
    validate_step(step, draft, recipients).is_ok()
}

/// Validate a step transition.
///
/// A transition is valid only if it moves exactly one position forward or
/// backward in the fixed order.
pub fn validate_step_transition(current: WizardStep, next: WizardStep) -> Result<(), CoreError> {
    let diff = next.index() as isize - current.index() as isize;
    if diff != 1 && diff != -1 {
        return Err(CoreError::InvalidInput(format!(
            "Cannot transition from step '{current}' to step '{next}'. \
             Must advance or go back exactly one step."
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Step controller
// ---------------------------------------------------------------------------

/// Owns the current step pointer and gates transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepController {
    current: WizardStep,
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::FIRST
    }
}

impl StepController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> WizardStep {
        self.current
    }

    pub fn is_first(&self) -> bool {
        self.current == WizardStep::FIRST
    }

    pub fn is_last(&self) -> bool {
        self.current == WizardStep::LAST
    }

    /// `(position, total)` for progress display.
    pub fn progress(&self) -> (usize, usize) {
        (self.current.position(), TOTAL_STEPS)
    }

    /// Advance one step if the current step validates.
    ///
    /// On a validation failure the pointer does not move. Advancing from
    /// the last step is a no-op. Returns the (possibly unchanged) current
    /// step.
    pub fn next(
        &mut self,
        draft: &CampaignDraft,
        recipients: &[Recipient],
    ) -> Result<WizardStep, CoreError> {
        validate_step(self.current, draft, recipients)?;
        if let Some(next) = self.current.next() {
            validate_step_transition(self.current, next)?;
            self.current = next;
        }
        Ok(self.current)
    }

    /// Go back one step. Never validates; a no-op on the first step.
    pub fn previous(&mut self) -> WizardStep {
        if let Some(previous) = self.current.previous() {
            self.current = previous;
        }
        self.current
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
