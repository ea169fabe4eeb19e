//! Per-step views of the wizard session.
//!
//! [`StepView`] has one variant per [`WizardStep`], each borrowing exactly
//! the state that step shows.

use std::collections::BTreeSet;
use std::fmt;

use reach_client::models::{AbTest, ExistingRecipient, SenderNumber, SmsTemplate};
use reach_core::draft::{CampaignDraft, DraftSettings, FollowUp};
use reach_core::personalize;
use reach_core::recipients::Recipient;
use reach_core::test_send::TestSendHistory;
use reach_core::types::RecordId;
use reach_core::wizard::WizardStep;

use crate::loader::LoadState;

/// Characters of a follow-up shown on the review step.
pub const EXCERPT_CHARS: usize = 100;

#[derive(Debug)]
pub enum StepView<'a> {
    Account {
        name: &'a str,
        sender_number: Option<&'a str>,
        numbers: &'a LoadState<Vec<SenderNumber>>,
        /// Only tests of the `sms_content` type.
        ab_tests: Vec<&'a AbTest>,
        selected_ab_test: Option<&'a str>,
    },
    Content {
        message: &'a str,
        char_count: usize,
        over_soft_cap: bool,
        soft_cap: usize,
        templates: &'a LoadState<Vec<SmsTemplate>>,
        selected_template: Option<&'a str>,
        preview: String,
        test_history: &'a TestSendHistory,
    },
    FollowUps {
        follow_ups: &'a [FollowUp],
    },
    Audience {
        recipients: &'a [Recipient],
        existing: &'a LoadState<Vec<ExistingRecipient>>,
        selected_existing: &'a BTreeSet<RecordId>,
    },
    Settings {
        settings: &'a DraftSettings,
    },
    Review(ReviewSummary),
}

impl StepView<'_> {
    pub fn step(&self) -> WizardStep {
        match self {
            Self::Account { .. } => WizardStep::Account,
            Self::Content { .. } => WizardStep::Content,
            Self::FollowUps { .. } => WizardStep::FollowUps,
            Self::Audience { .. } => WizardStep::Audience,
            Self::Settings { .. } => WizardStep::Settings,
            Self::Review(_) => WizardStep::Review,
        }
    }
}

/// Everything the review step shows before launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSummary {
    pub name: String,
    pub sender_number: Option<String>,
    pub message_preview: String,
    /// The message rendered for the first recipient, if there is one.
    pub first_recipient_message: Option<String>,
    pub recipient_count: usize,
    pub follow_up_count: usize,
    pub follow_up_excerpts: Vec<String>,
    pub scheduled_at: Option<String>,
    pub timezone: String,
}

impl ReviewSummary {
    pub fn new(draft: &CampaignDraft, recipients: &[Recipient]) -> Self {
        Self {
            name: draft.name.trim().to_string(),
            sender_number: draft.sender_number.clone(),
            message_preview: personalize::preview(&draft.message),
            first_recipient_message: recipients.first().map(|r| {
                personalize::render_for(
                    &draft.message,
                    r,
                    personalize::SAMPLE_UNSUBSCRIBE_URL,
                )
            }),
            recipient_count: recipients.len(),
            follow_up_count: draft.follow_ups.len(),
            follow_up_excerpts: draft
                .follow_ups
                .iter()
                .map(|f| excerpt(&f.content, EXCERPT_CHARS))
                .collect(),
            scheduled_at: draft
                .settings
                .effective_scheduled_at()
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string()),
            timezone: draft.settings.timezone.clone(),
        }
    }
}

/// First `max` characters of `text`, with `...` appended when cut.
pub fn excerpt(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

// ---------------------------------------------------------------------------
// Plain-text rendering
// ---------------------------------------------------------------------------

impl fmt::Display for StepView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = self.step();
        writeln!(
            f,
            "== Step {} of {}: {} ==",
            step.position(),
            WizardStep::ALL.len(),
            step.title()
        )?;
        writeln!(f, "{}", step.description())?;

        match self {
            Self::Account {
                name,
                sender_number,
                numbers,
                ab_tests,
                selected_ab_test,
            } => {
                writeln!(f, "Campaign name: {name}")?;
                writeln!(f, "Sender number: {}", sender_number.unwrap_or("(none)"))?;
                match numbers {
                    LoadState::Loading => writeln!(f, "Available numbers: loading...")?,
                    LoadState::Failed(e) => writeln!(f, "Available numbers: unavailable ({e})")?,
                    LoadState::Ready(list) if list.is_empty() => {
                        writeln!(f, "Available numbers: none")?
                    }
                    LoadState::Ready(list) => {
                        writeln!(f, "Available numbers:")?;
                        for n in list {
                            writeln!(f, "  {} ({})", n.phone_number, n.friendly_name)?;
                        }
                    }
                }
                if !ab_tests.is_empty() {
                    writeln!(f, "A/B tests:")?;
                    for test in ab_tests {
                        let mark = if Some(test.id.as_str()) == *selected_ab_test { "*" } else { " " };
                        writeln!(f, " {mark} {} [{}]", test.name, test.id)?;
                    }
                }
            }
            Self::Content {
                char_count,
                over_soft_cap,
                soft_cap,
                templates,
                selected_template,
                preview,
                test_history,
                ..
            } => {
                let warn = if *over_soft_cap { " (over limit)" } else { "" };
                writeln!(f, "Characters: {char_count}/{soft_cap}{warn}")?;
                writeln!(f, "Templates: {}", templates.items().len())?;
                if let Some(id) = selected_template {
                    writeln!(f, "Template: {id}")?;
                }
                writeln!(f, "Preview: {preview}")?;
                for record in test_history.iter() {
                    writeln!(f, "Test sent to {} at {}", record.phone, record.sent_at.format("%H:%M:%S"))?;
                }
            }
            Self::FollowUps { follow_ups } => {
                if follow_ups.is_empty() {
                    writeln!(f, "No follow-up SMS messages")?;
                }
                for (i, follow_up) in follow_ups.iter().enumerate() {
                    writeln!(
                        f,
                        "Follow-up SMS {} after {} day(s): {}",
                        i + 1,
                        follow_up.delay_days,
                        follow_up.content
                    )?;
                }
            }
            Self::Audience {
                recipients,
                existing,
                selected_existing,
            } => {
                writeln!(f, "Recipients: {}", recipients.len())?;
                writeln!(
                    f,
                    "Existing recipients: {} ({} selected)",
                    existing.items().len(),
                    selected_existing.len()
                )?;
            }
            Self::Settings { settings } => {
                writeln!(f, "Timezone: {}", settings.timezone)?;
                match settings.effective_scheduled_at() {
                    Some(at) => writeln!(f, "Scheduled: {}", at.format("%Y-%m-%d %H:%M"))?,
                    None => writeln!(f, "Scheduled: send immediately")?,
                }
                if settings.respect_sending_window {
                    let days: Vec<_> = settings.sending_days.iter().map(|d| d.short_label()).collect();
                    writeln!(
                        f,
                        "Sending window: {}-{} on {}",
                        settings.sending_window_start.format("%H:%M"),
                        settings.sending_window_end.format("%H:%M"),
                        days.join(", ")
                    )?;
                }
                writeln!(
                    f,
                    "Throttle: {}s delay, batches of {}, {} retries, {} priority",
                    settings.sms_delay_secs,
                    settings.batch_size,
                    settings.retry_attempts,
                    settings.priority
                )?;
            }
            Self::Review(summary) => {
                writeln!(f, "Campaign: {}", summary.name)?;
                writeln!(
                    f,
                    "Sender: {}",
                    summary.sender_number.as_deref().unwrap_or("(none)")
                )?;
                writeln!(f, "Message: {}", summary.message_preview)?;
                writeln!(f, "Recipients: {}", summary.recipient_count)?;
                writeln!(f, "Follow-ups: {}", summary.follow_up_count)?;
                for (i, text) in summary.follow_up_excerpts.iter().enumerate() {
                    writeln!(f, "  SMS Follow-up {}: {text}", i + 1)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reach_core::defaults::CampaignDefaults;

    #[test]
    fn excerpt_cuts_at_char_boundary() {
        assert_eq!(excerpt("short", 100), "short");
        let long = "ü".repeat(101);
        let cut = excerpt(&long, 100);
        assert_eq!(cut.chars().count(), 103);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt(&"a".repeat(100), 100).len(), 100);
    }

    #[test]
    fn review_summary_counts() {
        let mut draft = CampaignDraft::new(&CampaignDefaults::default());
        draft.name = "Q1".into();
        draft.message = "Hi {{firstName}}".into();
        let i = draft.add_follow_up(3);
        draft.set_follow_up_content(i, &"x".repeat(120)).unwrap();

        let summary = ReviewSummary::new(&draft, &[]);
        assert_eq!(summary.message_preview, "Hi John");
        assert_eq!(summary.follow_up_count, 1);
        assert_eq!(summary.follow_up_excerpts[0].len(), 103);
        assert!(summary.first_recipient_message.is_none());
    }
}
