#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use reach_client::models::{
    AbTest, Campaign, CampaignPayload, Connection, ConnectionConfig, ExistingRecipient,
    RecipientItem, SenderNumber, Sequence, SequencePayload, SmsSettings, SmsTemplate,
    TestSmsRequest, TestSmsResponse,
};
use reach_client::{ClientError, SmsBackend};
use reach_core::defaults::CampaignDefaults;
use reach_wizard::WizardSession;

// ---------------------------------------------------------------------------
// Recorded calls
// ---------------------------------------------------------------------------

/// Backend operations that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListConnections,
    ListConnectionNumbers,
    GetSmsSettings,
    ListTemplates,
    ListAbTests,
    ListRecipients,
    GetCampaign,
    CreateCampaign,
    UpdateCampaign,
    LinkSequence,
    CreateSequence,
    AddRecipients,
    SendTestSms,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListConnections,
    ListConnectionNumbers(String),
    GetSmsSettings,
    ListTemplates,
    ListAbTests,
    ListRecipients,
    GetCampaign(String),
    CreateCampaign(CampaignPayload),
    UpdateCampaign(String, CampaignPayload),
    LinkSequence(String, String),
    CreateSequence(SequencePayload),
    AddRecipients(Vec<RecipientItem>),
    SendTestSms(TestSmsRequest),
}

impl Call {
    /// Whether the call belongs to a background section load.
    pub fn is_load(&self) -> bool {
        matches!(
            self,
            Self::ListConnections
                | Self::ListConnectionNumbers(_)
                | Self::GetSmsSettings
                | Self::ListTemplates
                | Self::ListAbTests
                | Self::ListRecipients
                | Self::GetCampaign(_)
        )
    }
}

// ---------------------------------------------------------------------------
// RecordingBackend
// ---------------------------------------------------------------------------

/// In-memory [`SmsBackend`] that records every call and fails the
/// operations it is told to.
pub struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<Op>>,
    pub connections: Vec<Connection>,
    pub connection_numbers: HashMap<String, Vec<SenderNumber>>,
    pub settings: SmsSettings,
    pub templates: Vec<SmsTemplate>,
    pub ab_tests: Vec<AbTest>,
    pub recipients: Vec<ExistingRecipient>,
    pub campaign: Option<Campaign>,
    /// When set, `list_templates` waits for a permit before answering.
    pub templates_gate: Option<Arc<Notify>>,
    pub created_id: String,
    pub sequence_id: String,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        let connection = connection("7", "Main line", None);
        let mut connection_numbers = HashMap::new();
        connection_numbers.insert(
            "7".to_string(),
            vec![SenderNumber {
                phone_number: "+15551230000".into(),
                friendly_name: "Main".into(),
            }],
        );
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            connections: vec![connection],
            connection_numbers,
            settings: SmsSettings::default(),
            templates: vec![SmsTemplate {
                id: "t1".into(),
                name: "Welcome".into(),
                message: "Welcome {{firstName}}!".into(),
            }],
            ab_tests: vec![
                AbTest {
                    id: "ab1".into(),
                    name: "Greeting test".into(),
                    test_type: "sms_content".into(),
                },
                AbTest {
                    id: "ab2".into(),
                    name: "Subject test".into(),
                    test_type: "email_subject".into(),
                },
            ],
            recipients: vec![ExistingRecipient {
                id: "501".into(),
                phone_number: "+15550005555".into(),
                first_name: Some("Eve".into()),
                last_name: None,
                company: Some("Initech".into()),
                tags: Vec::new(),
            }],
            campaign: None,
            templates_gate: None,
            created_id: "c-100".into(),
            sequence_id: "s-200".into(),
        }
    }
}

pub fn connection(id: &str, name: &str, default_sender: Option<&str>) -> Connection {
    Connection {
        id: id.into(),
        name: name.into(),
        provider: "signalwire".into(),
        status: "active".into(),
        config: ConnectionConfig {
            default_sender_number: default_sender.map(str::to_string),
        },
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(self, op: Op) -> Self {
        self.fail(op);
        self
    }

    pub fn fail(&self, op: Op) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.failing.lock().unwrap().remove(&op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls made after the background loads (launch and test sends).
    pub fn action_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| !c.is_load()).collect()
    }

    fn record(&self, call: Call, op: Op) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(&op) {
            return Err(ClientError::Api {
                status: 500,
                message: format!("{op:?} failed"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SmsBackend for RecordingBackend {
    async fn list_connections(&self) -> Result<Vec<Connection>, ClientError> {
        self.record(Call::ListConnections, Op::ListConnections)?;
        Ok(self.connections.clone())
    }

    async fn list_connection_numbers(
        &self,
        connection_id: &str,
    ) -> Result<Vec<SenderNumber>, ClientError> {
        self.record(
            Call::ListConnectionNumbers(connection_id.into()),
            Op::ListConnectionNumbers,
        )?;
        Ok(self
            .connection_numbers
            .get(connection_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_sms_settings(&self) -> Result<SmsSettings, ClientError> {
        self.record(Call::GetSmsSettings, Op::GetSmsSettings)?;
        Ok(self.settings.clone())
    }

    async fn list_templates(&self) -> Result<Vec<SmsTemplate>, ClientError> {
        if let Some(gate) = &self.templates_gate {
            gate.notified().await;
        }
        self.record(Call::ListTemplates, Op::ListTemplates)?;
        Ok(self.templates.clone())
    }

    async fn list_ab_tests(&self) -> Result<Vec<AbTest>, ClientError> {
        self.record(Call::ListAbTests, Op::ListAbTests)?;
        Ok(self.ab_tests.clone())
    }

    async fn list_recipients(&self) -> Result<Vec<ExistingRecipient>, ClientError> {
        self.record(Call::ListRecipients, Op::ListRecipients)?;
        Ok(self.recipients.clone())
    }

    async fn get_campaign(&self, id: &str) -> Result<Campaign, ClientError> {
        self.record(Call::GetCampaign(id.into()), Op::GetCampaign)?;
        self.campaign.clone().ok_or(ClientError::Api {
            status: 404,
            message: "Campaign not found".into(),
        })
    }

    async fn create_campaign(&self, payload: &CampaignPayload) -> Result<Campaign, ClientError> {
        self.record(Call::CreateCampaign(payload.clone()), Op::CreateCampaign)?;
        Ok(stored_campaign(&self.created_id, &payload.name))
    }

    async fn update_campaign(
        &self,
        id: &str,
        payload: &CampaignPayload,
    ) -> Result<(), ClientError> {
        self.record(
            Call::UpdateCampaign(id.into(), payload.clone()),
            Op::UpdateCampaign,
        )
    }

    async fn link_sequence(
        &self,
        campaign_id: &str,
        sequence_id: &str,
    ) -> Result<(), ClientError> {
        self.record(
            Call::LinkSequence(campaign_id.into(), sequence_id.into()),
            Op::LinkSequence,
        )
    }

    async fn create_sequence(&self, payload: &SequencePayload) -> Result<Sequence, ClientError> {
        self.record(Call::CreateSequence(payload.clone()), Op::CreateSequence)?;
        Ok(Sequence {
            id: self.sequence_id.clone(),
            name: payload.name.clone(),
        })
    }

    async fn add_recipients(&self, items: &[RecipientItem]) -> Result<usize, ClientError> {
        self.record(Call::AddRecipients(items.to_vec()), Op::AddRecipients)?;
        Ok(items.len())
    }

    async fn send_test_sms(
        &self,
        request: &TestSmsRequest,
    ) -> Result<TestSmsResponse, ClientError> {
        self.record(Call::SendTestSms(request.clone()), Op::SendTestSms)?;
        Ok(TestSmsResponse {
            status: "sent".into(),
            message: None,
            external_id: Some("SM-test".into()),
        })
    }
}

/// A stored campaign with only an id and a name.
pub fn stored_campaign(id: &str, name: &str) -> Campaign {
    serde_json::from_value(serde_json::json!({ "id": id, "name": name }))
        .expect("valid campaign json")
}

// ---------------------------------------------------------------------------
// Session helpers
// ---------------------------------------------------------------------------

/// A new-campaign session with every background load applied.
pub async fn loaded_session(backend: &Arc<RecordingBackend>) -> WizardSession {
    let mut session = WizardSession::new(backend.clone(), CampaignDefaults::default());
    session.wait_for_loads().await;
    session
}

/// Fill the required fields and walk forward to the review step.
pub fn walk_to_review(session: &mut WizardSession, phones: &[&str]) {
    session.set_name("Q1 Launch").unwrap();
    session.next().unwrap();
    session.set_message("Hello {{firstName}}").unwrap();
    session.next().unwrap();
    session.next().unwrap();
    for phone in phones {
        session
            .add_manual_recipient(reach_core::recipients::ManualRecipientInput::phone(*phone))
            .unwrap();
    }
    session.next().unwrap();
    session.next().unwrap();
}

/// Poll until `done` holds, failing the test after one second.
pub async fn eventually(session: &mut WizardSession, done: impl Fn(&WizardSession) -> bool) {
    for _ in 0..100 {
        session.poll_loads();
        if done(session) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}
