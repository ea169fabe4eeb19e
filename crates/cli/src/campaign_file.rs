//! The JSON campaign description `reach-launch` fills the wizard from.
//!
//! ```json
//! {
//!   "name": "Q1 Launch",
//!   "message": "Hi {{firstName}}",
//!   "sender_number": "+15551230000",
//!   "follow_ups": [{ "content": "Reminder", "delay_days": 3 }],
//!   "settings": { "priority": "high", "sending_days": ["monday"] },
//!   "test_phone": "+15550009999"
//! }
//! ```

use std::str::FromStr;

use chrono::NaiveTime;
use serde::Deserialize;

use reach_core::draft::{local_minutes, DraftSettings, Priority, SendingDay};
use reach_core::error::CoreError;
use reach_core::types::RecordId;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CampaignFile {
    pub name: String,
    /// Overrides the template body when both are given.
    pub message: String,
    /// When absent the first discovered sender number is used.
    pub sender_number: Option<String>,
    pub template_id: Option<RecordId>,
    pub ab_test_id: Option<RecordId>,
    pub follow_ups: Vec<FollowUpEntry>,
    pub settings: SettingsFile,
    pub test_phone: Option<String>,
    pub existing_recipient_ids: Vec<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FollowUpEntry {
    pub content: String,
    /// Falls back to the wizard's default delay for the position.
    #[serde(default)]
    pub delay_days: Option<u32>,
}

impl CampaignFile {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Settings step overrides. Unset fields keep the draft's value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    pub use_custom_scheduling: Option<bool>,
    /// `YYYY-MM-DDTHH:MM` in the campaign timezone.
    pub scheduled_at: Option<String>,
    pub timezone: Option<String>,
    pub respect_sending_window: Option<bool>,
    pub sending_window_start: Option<String>,
    pub sending_window_end: Option<String>,
    pub sending_days: Option<Vec<String>>,
    pub sms_delay_secs: Option<u32>,
    pub batch_size: Option<u32>,
    pub retry_attempts: Option<u32>,
    pub priority: Option<String>,
    pub unsubscribe_text: Option<String>,
}

impl SettingsFile {
    /// Return `base` with every set field applied. Nothing is changed when
    /// any field fails to parse.
    pub fn apply_to(&self, base: &DraftSettings) -> Result<DraftSettings, CoreError> {
        let mut s = base.clone();

        if let Some(v) = self.use_custom_scheduling {
            s.use_custom_scheduling = v;
        }
        if let Some(raw) = &self.scheduled_at {
            s.scheduled_at = Some(local_minutes::parse(raw.trim()).ok_or_else(|| {
                CoreError::InvalidInput(format!("Invalid scheduled_at '{raw}'"))
            })?);
        }
        if let Some(v) = &self.timezone {
            s.timezone = v.clone();
        }
        if let Some(v) = self.respect_sending_window {
            s.respect_sending_window = v;
        }
        if let Some(raw) = &self.sending_window_start {
            s.sending_window_start = parse_time("sending_window_start", raw)?;
        }
        if let Some(raw) = &self.sending_window_end {
            s.sending_window_end = parse_time("sending_window_end", raw)?;
        }
        if let Some(days) = &self.sending_days {
            s.sending_days = days
                .iter()
                .map(|d| SendingDay::from_str(d))
                .collect::<Result<_, _>>()?;
        }
        if let Some(v) = self.sms_delay_secs {
            s.sms_delay_secs = v;
        }
        if let Some(v) = self.batch_size {
            s.batch_size = v;
        }
        if let Some(v) = self.retry_attempts {
            s.retry_attempts = v;
        }
        if let Some(raw) = &self.priority {
            s.priority = Priority::from_str(raw)?;
        }
        if let Some(v) = &self.unsubscribe_text {
            s.unsubscribe_text = v.clone();
        }
        Ok(s)
    }
}

fn parse_time(field: &str, raw: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| CoreError::InvalidInput(format!("Invalid {field} '{raw}', expected HH:MM")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use reach_core::defaults::CampaignDefaults;

    fn base() -> DraftSettings {
        DraftSettings::from_defaults(&CampaignDefaults::default())
    }

    #[test]
    fn minimal_file() {
        let file = CampaignFile::from_json(r#"{"name": "Q1", "message": "Hi"}"#).unwrap();
        assert_eq!(file.name, "Q1");
        assert!(file.follow_ups.is_empty());
        assert_eq!(file.settings, SettingsFile::default());
        assert_eq!(file.settings.apply_to(&base()).unwrap(), base());
    }

    #[test]
    fn full_file() {
        let file = CampaignFile::from_json(
            r#"{
                "name": "Q1",
                "message": "Hi {{firstName}}",
                "sender_number": "+15551230000",
                "template_id": "t1",
                "ab_test_id": "ab1",
                "follow_ups": [{"content": "Reminder"}, {"content": "Last", "delay_days": 10}],
                "settings": {"priority": "high"},
                "test_phone": "+15550009999",
                "existing_recipient_ids": ["501"]
            }"#,
        )
        .unwrap();
        assert_eq!(file.follow_ups[0].delay_days, None);
        assert_eq!(file.follow_ups[1].delay_days, Some(10));
        assert_eq!(file.existing_recipient_ids, ["501"]);
        assert_eq!(file.test_phone.as_deref(), Some("+15550009999"));
    }

    #[test]
    fn settings_overrides_apply() {
        let file = SettingsFile {
            use_custom_scheduling: Some(true),
            scheduled_at: Some("2026-03-01T09:30".into()),
            sending_window_start: Some("08:00".into()),
            sending_days: Some(vec!["Saturday".into(), "sunday".into()]),
            batch_size: Some(10),
            priority: Some("LOW".into()),
            ..SettingsFile::default()
        };
        let s = file.apply_to(&base()).unwrap();
        assert!(s.use_custom_scheduling);
        assert_eq!(
            s.scheduled_at.unwrap().format("%Y-%m-%d %H:%M").to_string(),
            "2026-03-01 09:30"
        );
        assert_eq!(s.sending_window_start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(
            s.sending_days.into_iter().collect::<Vec<_>>(),
            [SendingDay::Saturday, SendingDay::Sunday]
        );
        assert_eq!(s.batch_size, 10);
        assert_eq!(s.priority, Priority::Low);
        assert_eq!(s.retry_attempts, base().retry_attempts);
    }

    #[test]
    fn bad_values_are_rejected() {
        let bad_time = SettingsFile {
            sending_window_end: Some("5pm".into()),
            ..SettingsFile::default()
        };
        assert_matches!(bad_time.apply_to(&base()), Err(CoreError::InvalidInput(_)));

        let bad_day = SettingsFile {
            sending_days: Some(vec!["funday".into()]),
            ..SettingsFile::default()
        };
        assert_matches!(bad_day.apply_to(&base()), Err(CoreError::InvalidInput(_)));

        let bad_date = SettingsFile {
            scheduled_at: Some("tomorrow".into()),
            ..SettingsFile::default()
        };
        assert_matches!(bad_date.apply_to(&base()), Err(CoreError::InvalidInput(_)));
    }
}
