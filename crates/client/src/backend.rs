//! Backend abstraction consumed by the wizard.
//!
//! [`SmsBackend`] is the seam between the wizard and the network. The
//! HTTP implementation forwards to [`SmsApi`]; tests substitute an
//! in-memory fake.

use async_trait::async_trait;

use crate::api::SmsApi;
use crate::error::ClientError;
use crate::models::{
    AbTest, Campaign, CampaignPayload, Connection, ExistingRecipient, RecipientItem,
    SenderNumber, Sequence, SequencePayload, SmsSettings, SmsTemplate, TestSmsRequest,
    TestSmsResponse,
};

/// Every backend call the campaign wizard makes.
#[async_trait]
pub trait SmsBackend: Send + Sync {
    async fn list_connections(&self) -> Result<Vec<Connection>, ClientError>;

    async fn list_connection_numbers(
        &self,
        connection_id: &str,
    ) -> Result<Vec<SenderNumber>, ClientError>;

    async fn get_sms_settings(&self) -> Result<SmsSettings, ClientError>;

    async fn list_templates(&self) -> Result<Vec<SmsTemplate>, ClientError>;

    async fn list_ab_tests(&self) -> Result<Vec<AbTest>, ClientError>;

    async fn list_recipients(&self) -> Result<Vec<ExistingRecipient>, ClientError>;

    async fn get_campaign(&self, id: &str) -> Result<Campaign, ClientError>;

    /// Create a campaign; the returned record carries the new id.
    async fn create_campaign(&self, payload: &CampaignPayload) -> Result<Campaign, ClientError>;

    async fn update_campaign(&self, id: &str, payload: &CampaignPayload)
        -> Result<(), ClientError>;

    /// Attach a follow-up sequence to a campaign.
    async fn link_sequence(&self, campaign_id: &str, sequence_id: &str)
        -> Result<(), ClientError>;

    async fn create_sequence(&self, payload: &SequencePayload) -> Result<Sequence, ClientError>;

    /// Bulk-add recipients. Returns the number the backend accepted.
    async fn add_recipients(&self, items: &[RecipientItem]) -> Result<usize, ClientError>;

    async fn send_test_sms(&self, request: &TestSmsRequest)
        -> Result<TestSmsResponse, ClientError>;
}

#[async_trait]
impl SmsBackend for SmsApi {
    async fn list_connections(&self) -> Result<Vec<Connection>, ClientError> {
        SmsApi::list_connections(self).await
    }

    async fn list_connection_numbers(
        &self,
        connection_id: &str,
    ) -> Result<Vec<SenderNumber>, ClientError> {
        SmsApi::list_connection_numbers(self, connection_id).await
    }

    async fn get_sms_settings(&self) -> Result<SmsSettings, ClientError> {
        SmsApi::get_sms_settings(self).await
    }

    async fn list_templates(&self) -> Result<Vec<SmsTemplate>, ClientError> {
        SmsApi::list_templates(self).await
    }

    async fn list_ab_tests(&self) -> Result<Vec<AbTest>, ClientError> {
        SmsApi::list_ab_tests(self).await
    }

    async fn list_recipients(&self) -> Result<Vec<ExistingRecipient>, ClientError> {
        SmsApi::list_recipients(self).await
    }

    async fn get_campaign(&self, id: &str) -> Result<Campaign, ClientError> {
        SmsApi::get_campaign(self, id).await
    }

    async fn create_campaign(&self, payload: &CampaignPayload) -> Result<Campaign, ClientError> {
        SmsApi::create_campaign(self, payload).await
    }

    async fn update_campaign(
        &self,
        id: &str,
        payload: &CampaignPayload,
    ) -> Result<(), ClientError> {
        SmsApi::update_campaign(self, id, payload).await
    }

    async fn link_sequence(
        &self,
        campaign_id: &str,
        sequence_id: &str,
    ) -> Result<(), ClientError> {
        SmsApi::link_sequence(self, campaign_id, sequence_id).await
    }

    async fn create_sequence(&self, payload: &SequencePayload) -> Result<Sequence, ClientError> {
        SmsApi::create_sequence(self, payload).await
    }

    async fn add_recipients(&self, items: &[RecipientItem]) -> Result<usize, ClientError> {
        SmsApi::add_recipients(self, items).await
    }

    async fn send_test_sms(
        &self,
        request: &TestSmsRequest,
    ) -> Result<TestSmsResponse, ClientError> {
        SmsApi::send_test_sms(self, request).await
    }
}
