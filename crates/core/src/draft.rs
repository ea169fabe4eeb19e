//! The in-memory campaign draft edited by the wizard.
//!
//! A draft has no identity until the first successful save assigns it a
//! server id. Follow-ups are owned by the draft and only become a
//! backend sequence at launch time.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::defaults::CampaignDefaults;
use crate::error::CoreError;
use crate::types::RecordId;

/// Hours in one follow-up delay day.
pub const HOURS_PER_DAY: u32 = 24;

/// Minimum follow-up delay in days.
pub const MIN_FOLLOW_UP_DELAY_DAYS: u32 = 1;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Days of the week a campaign may send on.
///
/// Ordered Monday first so a `BTreeSet` iterates in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendingDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl SendingDay {
    pub const WEEKDAYS: [SendingDay; 5] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    /// Three-letter label used by the day picker.
    pub fn short_label(self) -> &'static str {
        &self.as_str()[..3]
    }
}

impl FromStr for SendingDay {
    type Err = CoreError;

    /// Accepts full day names in any case, e.g. `"Monday"` or `"monday"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        [
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
            Self::Sunday,
        ]
        .into_iter()
        .find(|d| d.as_str() == lower)
        .ok_or_else(|| CoreError::InvalidInput(format!("Unknown sending day '{s}'")))
    }
}

/// Sending priority for the campaign's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            _ => Err(CoreError::InvalidInput(format!("Unknown priority '{s}'"))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Scheduling and throttling options from the settings step.
///
/// Every field has a default, so the settings step never blocks navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSettings {
    pub use_custom_scheduling: bool,
    /// Wall-clock send time in [`DraftSettings::timezone`]. Ignored unless
    /// custom scheduling is on.
    #[serde(default, with = "local_minutes")]
    pub scheduled_at: Option<NaiveDateTime>,
    pub timezone: String,
    pub respect_sending_window: bool,
    #[serde(with = "hhmm")]
    pub sending_window_start: NaiveTime,
    #[serde(with = "hhmm")]
    pub sending_window_end: NaiveTime,
    pub sending_days: BTreeSet<SendingDay>,
    pub sms_delay_secs: u32,
    pub batch_size: u32,
    pub retry_attempts: u32,
    pub priority: Priority,
    pub unsubscribe_text: String,
}

impl DraftSettings {
    pub fn from_defaults(defaults: &CampaignDefaults) -> Self {
        Self {
            use_custom_scheduling: false,
            scheduled_at: None,
            timezone: defaults.timezone.clone(),
            respect_sending_window: false,
            sending_window_start: defaults.sending_window_start,
            sending_window_end: defaults.sending_window_end,
            sending_days: defaults.sending_days.clone(),
            sms_delay_secs: defaults.sms_delay_secs,
            batch_size: defaults.batch_size,
            retry_attempts: defaults.retry_attempts,
            priority: defaults.priority,
            unsubscribe_text: defaults.unsubscribe_text.clone(),
        }
    }

    /// Toggle one day in the sending-day set.
    pub fn set_sending_day(&mut self, day: SendingDay, enabled: bool) {
        if enabled {
            self.sending_days.insert(day);
        } else {
            self.sending_days.remove(&day);
        }
    }

    /// The send time that applies, if custom scheduling is on.
    pub fn effective_scheduled_at(&self) -> Option<NaiveDateTime> {
        if self.use_custom_scheduling {
            self.scheduled_at
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Follow-ups
// ---------------------------------------------------------------------------

/// One follow-up message sent `delay_days` after the previous message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub content: String,
    pub delay_days: u32,
    /// 1-based order assigned when the follow-up was appended. Removals
    /// leave gaps; the launch payload uses list position instead.
    pub order: u32,
}

impl FollowUp {
    /// The delay in the hour granularity the sequence API expects.
    pub fn delay_hours(&self) -> u32 {
        self.delay_days.saturating_mul(HOURS_PER_DAY)
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// The campaign being authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignDraft {
    /// Server id, assigned by the first successful save.
    pub campaign_id: Option<RecordId>,
    pub name: String,
    pub sender_number: Option<String>,
    pub message: String,
    pub template_id: Option<RecordId>,
    pub ab_test_id: Option<RecordId>,
    pub settings: DraftSettings,
    pub follow_ups: Vec<FollowUp>,
}

impl CampaignDraft {
    pub fn new(defaults: &CampaignDefaults) -> Self {
        Self {
            campaign_id: None,
            name: String::new(),
            sender_number: None,
            message: String::new(),
            template_id: None,
            ab_test_id: None,
            settings: DraftSettings::from_defaults(defaults),
            follow_ups: Vec::new(),
        }
    }

    /// Length of the message in characters (not bytes).
    pub fn message_len(&self) -> usize {
        self.message.chars().count()
    }

    /// Whether the message exceeds the advisory length. Never an error.
    pub fn over_soft_cap(&self, cap: usize) -> bool {
        self.message_len() > cap
    }

    /// Set the sender; blank input clears it.
    pub fn set_sender_number(&mut self, number: &str) {
        let number = number.trim();
        self.sender_number = if number.is_empty() {
            None
        } else {
            Some(number.to_string())
        };
    }

    /// Append an empty follow-up and return its index.
    pub fn add_follow_up(&mut self, delay_days: u32) -> usize {
        let order = self.follow_ups.len() as u32 + 1;
        self.follow_ups.push(FollowUp {
            content: String::new(),
            delay_days: delay_days.max(MIN_FOLLOW_UP_DELAY_DAYS),
            order,
        });
        self.follow_ups.len() - 1
    }

    pub fn remove_follow_up(&mut self, index: usize) -> Result<FollowUp, CoreError> {
        if index >= self.follow_ups.len() {
            return Err(follow_up_not_found(index));
        }
        Ok(self.follow_ups.remove(index))
    }

    pub fn set_follow_up_content(&mut self, index: usize, content: &str) -> Result<(), CoreError> {
        let follow_up = self
            .follow_ups
            .get_mut(index)
            .ok_or_else(|| follow_up_not_found(index))?;
        follow_up.content = content.to_string();
        Ok(())
    }

    /// Set a follow-up delay. Values below one day are raised to one.
    pub fn set_follow_up_delay(&mut self, index: usize, days: u32) -> Result<(), CoreError> {
        let follow_up = self
            .follow_ups
            .get_mut(index)
            .ok_or_else(|| follow_up_not_found(index))?;
        follow_up.delay_days = days.max(MIN_FOLLOW_UP_DELAY_DAYS);
        Ok(())
    }
}

fn follow_up_not_found(index: usize) -> CoreError {
    CoreError::NotFound {
        entity: "follow-up",
        id: index.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

/// `HH:MM` wall-clock times, as the time inputs produce them.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

/// Optional `YYYY-MM-DDTHH:MM` local date-times (seconds accepted).
pub mod local_minutes {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M";

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
            .ok()
    }

    pub fn serialize<S: Serializer>(value: &Option<NaiveDateTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => s.serialize_str(&dt.format(FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date-time '{s}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
