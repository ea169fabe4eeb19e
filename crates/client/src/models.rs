//! Request and response types for the campaign backend.
//!
//! One explicit type per endpoint shape. Field names follow the wire
//! format, which mixes `snake_case` and `camelCase`.

use serde::{Deserialize, Deserializer, Serialize};

use reach_core::types::RecordId;

// ---------------------------------------------------------------------------
// Id normalisation
// ---------------------------------------------------------------------------

/// Accept an id sent either as a JSON string or a JSON number.
pub(crate) fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<RecordId, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Optional variant of [`id_string`]; `null` and `""` become `None`.
pub(crate) fn opt_id_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<RecordId>, D::Error> {
    match Option::<serde_json::Value>::deserialize(d)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Optional count that may arrive as a number or a numeric string.
pub(crate) fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    match Option::<serde_json::Value>::deserialize(d)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a count, got \"{s}\""))),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected a count, got {n}"))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a count, got {other}"
        ))),
    }
}

/// Optional flag stored as a boolean, `0`/`1`, or their string forms.
pub(crate) fn opt_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    match Option::<serde_json::Value>::deserialize(d)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Bool(b)) => Ok(Some(b)),
        Some(serde_json::Value::Number(n)) => match n.as_u64() {
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            _ => Err(serde::de::Error::custom(format!("expected a flag, got {n}"))),
        },
        Some(serde_json::Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "0" | "false" => Ok(Some(false)),
            "1" | "true" => Ok(Some(true)),
            _ => Err(serde::de::Error::custom(format!("expected a flag, got \"{s}\""))),
        },
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a flag, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Connections and sender numbers
// ---------------------------------------------------------------------------

/// Provider name of connections that can supply SMS sender numbers.
pub const SIGNALWIRE_PROVIDER: &str = "signalwire";

/// Connection status that marks a usable provider connection.
pub const CONNECTION_STATUS_ACTIVE: &str = "active";

/// A telephony provider connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(deserialize_with = "id_string")]
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    pub provider: String,
    pub status: String,
    #[serde(default)]
    pub config: ConnectionConfig,
}

impl Connection {
    /// Whether this connection should be asked for sender numbers.
    pub fn supplies_sms_numbers(&self) -> bool {
        self.provider == SIGNALWIRE_PROVIDER && self.status == CONNECTION_STATUS_ACTIVE
    }

    /// Sender configured on the connection itself, used when its number
    /// list is empty or unavailable.
    pub fn fallback_number(&self) -> Option<SenderNumber> {
        self.config
            .default_sender_number
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(|n| SenderNumber {
                phone_number: n.to_string(),
                friendly_name: self.display_name(),
            })
    }

    /// Connection name, or a generic label when it has none.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            "SignalWire Number".to_string()
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(rename = "defaultSenderNumber", default)]
    pub default_sender_number: Option<String>,
}

/// `GET /calls/connections` returns either a bare array or an envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ConnectionsResponse {
    List(Vec<Connection>),
    Envelope {
        #[serde(default)]
        connections: Vec<Connection>,
    },
}

impl ConnectionsResponse {
    pub(crate) fn into_vec(self) -> Vec<Connection> {
        match self {
            Self::List(list) => list,
            Self::Envelope { connections } => connections,
        }
    }
}

/// A phone number messages can be sent from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderNumber {
    #[serde(alias = "phoneNumber")]
    pub phone_number: String,
    #[serde(alias = "friendlyName", default)]
    pub friendly_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhoneNumbersResponse {
    #[serde(rename = "phoneNumbers", default)]
    pub phone_numbers: Vec<SenderNumber>,
}

/// The subset of `GET /sms-settings` the wizard reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SmsSettings {
    #[serde(rename = "defaultSenderNumber", default)]
    pub default_sender_number: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

// ---------------------------------------------------------------------------
// Templates, A/B tests, stored recipients
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsTemplate {
    #[serde(deserialize_with = "id_string")]
    pub id: RecordId,
    pub name: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TemplatesResponse {
    #[serde(default)]
    pub templates: Vec<SmsTemplate>,
}

/// A/B test type the SMS wizard offers.
pub const AB_TEST_TYPE_SMS_CONTENT: &str = "sms_content";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbTest {
    #[serde(deserialize_with = "id_string")]
    pub id: RecordId,
    pub name: String,
    pub test_type: String,
}

impl AbTest {
    pub fn is_sms_content(&self) -> bool {
        self.test_type == AB_TEST_TYPE_SMS_CONTENT
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AbTestsResponse {
    #[serde(default)]
    pub items: Vec<AbTest>,
}

/// A recipient already stored in the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingRecipient {
    #[serde(deserialize_with = "id_string")]
    pub id: RecordId,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<&ExistingRecipient> for reach_core::recipients::Recipient {
    fn from(r: &ExistingRecipient) -> Self {
        Self::existing(
            r.id.clone(),
            r.phone_number.clone(),
            r.first_name.clone(),
            r.last_name.clone(),
            r.company.clone(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecipientsResponse {
    #[serde(default)]
    pub recipients: Vec<ExistingRecipient>,
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

/// Status sent when a campaign is launched from the wizard.
pub const CAMPAIGN_STATUS_SCHEDULED: &str = "scheduled";

/// A stored SMS campaign. Only the fields the wizard restores are typed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Campaign {
    #[serde(deserialize_with = "id_string")]
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub sender_number: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub ab_test_id: Option<RecordId>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub sequence_id: Option<RecordId>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default, alias = "scheduledAt")]
    pub scheduled_at: Option<String>,
    #[serde(rename = "respectSendingWindow", default, deserialize_with = "opt_flag")]
    pub respect_sending_window: Option<bool>,
    #[serde(rename = "sendingWindowStart", default)]
    pub sending_window_start: Option<String>,
    #[serde(rename = "sendingWindowEnd", default)]
    pub sending_window_end: Option<String>,
    #[serde(rename = "sendingDays", default)]
    pub sending_days: Option<Vec<String>>,
    #[serde(rename = "smsDelay", default, deserialize_with = "opt_u32")]
    pub sms_delay: Option<u32>,
    #[serde(rename = "batchSize", default, deserialize_with = "opt_u32")]
    pub batch_size: Option<u32>,
    #[serde(default, deserialize_with = "opt_u32")]
    pub retry_attempts: Option<u32>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(rename = "unsubscribePlainText", default)]
    pub unsubscribe_plain_text: Option<String>,
}

impl Campaign {
    /// The sender the campaign was saved with, whichever field carried it.
    pub fn sender(&self) -> Option<&str> {
        self.sender_number
            .as_deref()
            .or(self.sender_id.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// Body of the create and update campaign calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignPayload {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_number: Option<String>,
    #[serde(rename = "totalRecipients")]
    pub total_recipients: usize,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ab_test_id: Option<RecordId>,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    #[serde(rename = "respectSendingWindow")]
    pub respect_sending_window: bool,
    #[serde(rename = "sendingWindowStart")]
    pub sending_window_start: String,
    #[serde(rename = "sendingWindowEnd")]
    pub sending_window_end: String,
    #[serde(rename = "sendingDays")]
    pub sending_days: Vec<&'static str>,
    #[serde(rename = "smsDelay")]
    pub sms_delay: u32,
    #[serde(rename = "batchSize")]
    pub batch_size: u32,
    pub retry_attempts: u32,
    pub priority: &'static str,
    #[serde(rename = "unsubscribePlainText")]
    pub unsubscribe_plain_text: String,
}

/// Body of the update call that attaches a follow-up sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceLink {
    pub sequence_id: RecordId,
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

/// Unit of [`SequenceStepPayload::delay_amount`].
pub const DELAY_UNIT_HOURS: &str = "hours";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequencePayload {
    pub name: String,
    pub description: String,
    pub steps: Vec<SequenceStepPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceStepPayload {
    pub message: String,
    pub delay_hours: u32,
    pub delay_amount: u32,
    pub delay_unit: &'static str,
    pub step_order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Sequence {
    #[serde(deserialize_with = "id_string")]
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SequenceResponse {
    pub sequence: Sequence,
}

// ---------------------------------------------------------------------------
// Bulk recipients and test sends
// ---------------------------------------------------------------------------

/// One entry of the bulk-add recipients call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientItem {
    #[serde(rename = "campaignId")]
    pub campaign_id: RecordId,
    pub phone: String,
    pub name: String,
    pub company: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecipientItemsRequest<'a> {
    pub items: &'a [RecipientItem],
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecipientItemsResponse {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSmsRequest {
    pub phone_number: String,
    pub message: String,
    pub sender_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestSmsResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
