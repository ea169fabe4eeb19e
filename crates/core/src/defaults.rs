//! Campaign defaults.
//!
//! A plain configuration value handed to the wizard at construction time.
//! Tests substitute their own fixture instead of mutating shared state.

use std::collections::BTreeSet;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::draft::{hhmm, Priority, SendingDay};

/// Route the user is sent to after a launch.
pub const DEFAULT_CAMPAIGN_LIST_ROUTE: &str = "/reach/outbound/sms/campaigns";

/// Default opt-out footer appended by the sending pipeline.
pub const DEFAULT_UNSUBSCRIBE_TEXT: &str = "Reply STOP to unsubscribe: {{unsubscribeUrl}}";

/// Defaults for every draft setting plus a few wizard-level constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignDefaults {
    pub timezone: String,
    #[serde(with = "hhmm")]
    pub quiet_hours_start: NaiveTime,
    #[serde(with = "hhmm")]
    pub quiet_hours_end: NaiveTime,
    #[serde(with = "hhmm")]
    pub sending_window_start: NaiveTime,
    #[serde(with = "hhmm")]
    pub sending_window_end: NaiveTime,
    pub sending_days: BTreeSet<SendingDay>,
    /// Seconds between individual messages.
    pub sms_delay_secs: u32,
    pub batch_size: u32,
    pub retry_attempts: u32,
    pub priority: Priority,
    pub unsubscribe_text: String,
    /// Delay for the first follow-up added to an empty sequence.
    pub first_follow_up_delay_days: u32,
    /// Delay for every follow-up after the first.
    pub later_follow_up_delay_days: u32,
    /// Advisory message length; exceeding it is reported, never rejected.
    pub message_soft_cap: usize,
    /// How many test sends are remembered.
    pub test_history_capacity: usize,
    pub campaign_list_route: String,
}

impl Default for CampaignDefaults {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            quiet_hours_start: time(22, 0),
            quiet_hours_end: time(8, 0),
            sending_window_start: time(9, 0),
            sending_window_end: time(17, 0),
            sending_days: SendingDay::WEEKDAYS.into_iter().collect(),
            sms_delay_secs: 5,
            batch_size: 50,
            retry_attempts: 3,
            priority: Priority::Normal,
            unsubscribe_text: DEFAULT_UNSUBSCRIBE_TEXT.to_string(),
            first_follow_up_delay_days: 3,
            later_follow_up_delay_days: 7,
            message_soft_cap: 160,
            test_history_capacity: 5,
            campaign_list_route: DEFAULT_CAMPAIGN_LIST_ROUTE.to_string(),
        }
    }
}

impl CampaignDefaults {
    /// Delay for a new follow-up given how many already exist.
    pub fn follow_up_delay_days(&self, existing: usize) -> u32 {
        if existing == 0 {
            self.first_follow_up_delay_days
        } else {
            self.later_follow_up_delay_days
        }
    }
}

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekdays_by_default() {
        let d = CampaignDefaults::default();
        assert_eq!(d.sending_days.len(), 5);
        assert!(!d.sending_days.contains(&SendingDay::Saturday));
    }

    #[test]
    fn follow_up_delay_first_then_later() {
        let d = CampaignDefaults::default();
        assert_eq!(d.follow_up_delay_days(0), 3);
        assert_eq!(d.follow_up_delay_days(1), 7);
        assert_eq!(d.follow_up_delay_days(4), 7);
    }

    #[test]
    fn partial_json_fills_remaining_fields() {
        let d: CampaignDefaults =
            serde_json::from_str(r#"{"timezone":"America/Chicago","batch_size":10}"#).unwrap();
        assert_eq!(d.timezone, "America/Chicago");
        assert_eq!(d.batch_size, 10);
        assert_eq!(d.retry_attempts, 3);
        assert_eq!(d.sending_window_start, time(9, 0));
    }

    #[test]
    fn times_serialize_as_hh_mm() {
        let json = serde_json::to_value(CampaignDefaults::default()).unwrap();
        assert_eq!(json["quiet_hours_start"], "22:00");
        assert_eq!(json["sending_window_end"], "17:00");
    }
}
