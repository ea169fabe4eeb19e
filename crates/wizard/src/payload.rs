//! Conversion between the in-memory draft and backend request bodies.

use chrono::NaiveTime;

use reach_client::models::{
    Campaign, CampaignPayload, RecipientItem, SequencePayload, SequenceStepPayload,
    CAMPAIGN_STATUS_SCHEDULED, DELAY_UNIT_HOURS,
};
use reach_core::draft::{local_minutes, CampaignDraft, Priority, SendingDay};
use reach_core::recipients::Recipient;

const TIME_FORMAT: &str = "%H:%M";

/// Body of the create or update call for `draft`.
pub fn campaign_payload(draft: &CampaignDraft, total_recipients: usize) -> CampaignPayload {
    let settings = &draft.settings;
    CampaignPayload {
        name: draft.name.trim().to_string(),
        message: draft.message.clone(),
        sender_number: draft.sender_number.clone(),
        total_recipients,
        status: CAMPAIGN_STATUS_SCHEDULED,
        ab_test_id: draft.ab_test_id.clone(),
        timezone: settings.timezone.clone(),
        scheduled_at: settings
            .effective_scheduled_at()
            .map(|at| at.format("%Y-%m-%dT%H:%M").to_string()),
        respect_sending_window: settings.respect_sending_window,
        sending_window_start: settings.sending_window_start.format(TIME_FORMAT).to_string(),
        sending_window_end: settings.sending_window_end.format(TIME_FORMAT).to_string(),
        sending_days: settings.sending_days.iter().map(|d| d.as_str()).collect(),
        sms_delay: settings.sms_delay_secs,
        batch_size: settings.batch_size,
        retry_attempts: settings.retry_attempts,
        priority: settings.priority.as_str(),
        unsubscribe_plain_text: settings.unsubscribe_text.clone(),
    }
}

/// The follow-up sequence for `draft`. Step order is list position, so
/// gaps left by removed follow-ups are closed.
pub fn sequence_payload(draft: &CampaignDraft) -> SequencePayload {
    let name = draft.name.trim();
    SequencePayload {
        name: format!("{name} Follow-ups"),
        description: format!("Auto-generated follow-up sequence for campaign: {name}"),
        steps: draft
            .follow_ups
            .iter()
            .enumerate()
            .map(|(index, follow_up)| SequenceStepPayload {
                message: follow_up.content.clone(),
                delay_hours: follow_up.delay_hours(),
                delay_amount: follow_up.delay_hours(),
                delay_unit: DELAY_UNIT_HOURS,
                step_order: index as u32 + 1,
            })
            .collect(),
    }
}

/// Bulk-add entries for `recipients`, in list order.
pub fn recipient_items(campaign_id: &str, recipients: &[Recipient]) -> Vec<RecipientItem> {
    recipients
        .iter()
        .map(|r| RecipientItem {
            campaign_id: campaign_id.to_string(),
            phone: r.phone.clone(),
            name: r.display_name(),
            company: r.company.clone().unwrap_or_default(),
        })
        .collect()
}

/// Fill `draft` from a stored campaign. Fields the backend left out keep
/// their current values; unparseable values are skipped with a warning.
pub fn restore_draft(draft: &mut CampaignDraft, campaign: &Campaign) {
    draft.campaign_id = Some(campaign.id.clone());
    draft.name = campaign.name.clone();
    draft.message = campaign.message.clone();
    draft.sender_number = campaign.sender().map(str::to_string);
    draft.ab_test_id = campaign.ab_test_id.clone();

    let settings = &mut draft.settings;
    if let Some(tz) = campaign.timezone.as_deref().filter(|tz| !tz.is_empty()) {
        settings.timezone = tz.to_string();
    }
    if let Some(raw) = campaign.scheduled_at.as_deref().filter(|s| !s.is_empty()) {
        match local_minutes::parse(raw) {
            Some(at) => {
                settings.scheduled_at = Some(at);
                settings.use_custom_scheduling = true;
            }
            None => tracing::warn!(value = raw, "Ignoring unparseable scheduled_at"),
        }
    }
    if let Some(respect) = campaign.respect_sending_window {
        settings.respect_sending_window = respect;
    }
    if let Some(start) = campaign.sending_window_start.as_deref().and_then(parse_time) {
        settings.sending_window_start = start;
    }
    if let Some(end) = campaign.sending_window_end.as_deref().and_then(parse_time) {
        settings.sending_window_end = end;
    }
    if let Some(days) = &campaign.sending_days {
        let parsed: Vec<SendingDay> = days.iter().filter_map(|d| d.parse().ok()).collect();
        if parsed.len() != days.len() {
            tracing::warn!(?days, "Ignoring unknown sending days");
        }
        settings.sending_days = parsed.into_iter().collect();
    }
    if let Some(delay) = campaign.sms_delay {
        settings.sms_delay_secs = delay;
    }
    if let Some(size) = campaign.batch_size {
        settings.batch_size = size;
    }
    if let Some(attempts) = campaign.retry_attempts {
        settings.retry_attempts = attempts;
    }
    if let Some(priority) = campaign.priority.as_deref() {
        match priority.parse::<Priority>() {
            Ok(p) => settings.priority = p,
            Err(e) => tracing::warn!(error = %e, "Ignoring unknown priority"),
        }
    }
    if let Some(text) = &campaign.unsubscribe_plain_text {
        settings.unsubscribe_text = text.clone();
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use reach_core::defaults::CampaignDefaults;
    use reach_core::recipients::{ManualRecipientInput, RecipientList};
    use serde_json::json;

    fn draft() -> CampaignDraft {
        let mut d = CampaignDraft::new(&CampaignDefaults::default());
        d.name = "  Q1 Launch ".into();
        d.message = "Hello {{firstName}}".into();
        d
    }

    #[test]
    fn campaign_payload_carries_settings() {
        let mut d = draft();
        d.settings.scheduled_at = local_minutes::parse("2026-11-02T09:30");
        let payload = campaign_payload(&d, 2);
        assert_eq!(payload.name, "Q1 Launch");
        assert_eq!(payload.total_recipients, 2);
        assert_eq!(payload.scheduled_at, None);
        assert_eq!(payload.sending_window_start, "09:00");
        assert_eq!(payload.sending_days.len(), 5);

        d.settings.use_custom_scheduling = true;
        assert_eq!(
            campaign_payload(&d, 2).scheduled_at.as_deref(),
            Some("2026-11-02T09:30")
        );
    }

    #[test]
    fn sequence_steps_use_hours_and_list_position() {
        let mut d = draft();
        d.add_follow_up(3);
        d.add_follow_up(7);
        d.add_follow_up(2);
        d.remove_follow_up(1).unwrap();
        d.set_follow_up_content(0, "Reminder").unwrap();

        let seq = sequence_payload(&d);
        assert_eq!(seq.name, "Q1 Launch Follow-ups");
        assert_eq!(
            seq.description,
            "Auto-generated follow-up sequence for campaign: Q1 Launch"
        );
        let steps: Vec<_> = seq
            .steps
            .iter()
            .map(|s| (s.delay_hours, s.delay_amount, s.step_order))
            .collect();
        assert_eq!(steps, [(72, 72, 1), (48, 48, 2)]);
        assert_eq!(seq.steps[0].delay_unit, "hours");
    }

    #[test]
    fn recipient_items_join_names() {
        let mut list = RecipientList::new();
        list.add_manual(ManualRecipientInput {
            phone: "+15550001111".into(),
            first_name: Some("Ana".into()),
            last_name: Some("Lopez".into()),
            company: Some("Acme".into()),
        })
        .unwrap();
        list.add_manual(ManualRecipientInput::phone("+15550002222")).unwrap();

        let items = recipient_items("9", list.as_slice());
        assert_eq!(items[0].name, "Ana Lopez");
        assert_eq!(items[0].company, "Acme");
        assert_eq!(items[1].name, "");
        assert!(items.iter().all(|i| i.campaign_id == "9"));
    }

    #[test]
    fn restore_fills_present_fields() {
        let campaign: Campaign = serde_json::from_value(json!({
            "id": 41,
            "name": "Spring",
            "message": "Hi {{firstName}}",
            "sender_id": "+15551230000",
            "ab_test_id": 3,
            "scheduled_at": "2026-03-01T10:00:00",
            "sendingDays": ["saturday", "sunday", "someday"],
            "priority": "high",
            "batchSize": 20
        }))
        .unwrap();

        let mut d = CampaignDraft::new(&CampaignDefaults::default());
        restore_draft(&mut d, &campaign);

        assert_eq!(d.campaign_id.as_deref(), Some("41"));
        assert_eq!(d.sender_number.as_deref(), Some("+15551230000"));
        assert_eq!(d.ab_test_id.as_deref(), Some("3"));
        assert!(d.settings.use_custom_scheduling);
        assert_eq!(d.settings.sending_days.len(), 2);
        assert_eq!(d.settings.priority, Priority::High);
        assert_eq!(d.settings.batch_size, 20);
        assert_eq!(d.settings.retry_attempts, 3);
    }
}
