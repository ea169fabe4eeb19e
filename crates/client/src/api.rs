//! REST API client for the SMS campaign endpoints.
//!
//! Wraps the backend's HTTP API (sender numbers, templates, A/B tests,
//! recipients, campaigns, sequences, test sends) using [`reqwest`].

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{api_error, body_snippet, ClientError};
use crate::models::{
    AbTest, AbTestsResponse, Campaign, CampaignPayload, Connection, ConnectionsResponse,
    ExistingRecipient, PhoneNumbersResponse, RecipientItem, RecipientItemsRequest,
    RecipientItemsResponse, RecipientsResponse, SenderNumber, Sequence, SequenceLink,
    SequencePayload, SequenceResponse, SmsSettings, SmsTemplate, TemplatesResponse,
    TestSmsRequest, TestSmsResponse,
};

/// HTTP client for one backend workspace.
#[derive(Debug, Clone)]
pub struct SmsApi {
    client: reqwest::Client,
    api_url: String,
}

impl SmsApi {
    /// Create a client with the auth and tenant headers from `config`
    /// applied to every request.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(default_headers(config)?)
            .build()?;
        Ok(Self::with_client(client, config.api_url.clone()))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- connections and sender numbers ----

    /// `GET /calls/connections`
    pub async fn list_connections(&self) -> Result<Vec<Connection>, ClientError> {
        let response: ConnectionsResponse = self.get("/calls/connections").await?;
        Ok(response.into_vec())
    }

    /// `GET /connections/{id}/phone-numbers`
    pub async fn list_connection_numbers(
        &self,
        connection_id: &str,
    ) -> Result<Vec<SenderNumber>, ClientError> {
        let response: PhoneNumbersResponse = self
            .get(&format!("/connections/{connection_id}/phone-numbers"))
            .await?;
        Ok(response.phone_numbers)
    }

    /// `GET /sms-settings`
    pub async fn get_sms_settings(&self) -> Result<SmsSettings, ClientError> {
        self.get("/sms-settings").await
    }

    // ---- catalogue ----

    /// `GET /sms-templates`
    pub async fn list_templates(&self) -> Result<Vec<SmsTemplate>, ClientError> {
        let response: TemplatesResponse = self.get("/sms-templates").await?;
        Ok(response.templates)
    }

    /// `GET /ab-tests`
    pub async fn list_ab_tests(&self) -> Result<Vec<AbTest>, ClientError> {
        let response: AbTestsResponse = self.get("/ab-tests").await?;
        Ok(response.items)
    }

    /// `GET /sms-recipients`
    pub async fn list_recipients(&self) -> Result<Vec<ExistingRecipient>, ClientError> {
        let response: RecipientsResponse = self.get("/sms-recipients").await?;
        Ok(response.recipients)
    }

    // ---- campaigns ----

    /// `GET /sms-campaigns/{id}`
    pub async fn get_campaign(&self, id: &str) -> Result<Campaign, ClientError> {
        self.get(&format!("/sms-campaigns/{id}")).await
    }

    /// `POST /sms-campaigns`
    pub async fn create_campaign(&self, payload: &CampaignPayload) -> Result<Campaign, ClientError> {
        let response = self
            .client
            .post(self.url("/sms-campaigns"))
            .json(payload)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// `PUT /sms-campaigns/{id}`
    pub async fn update_campaign(
        &self,
        id: &str,
        payload: &CampaignPayload,
    ) -> Result<(), ClientError> {
        self.put(&format!("/sms-campaigns/{id}"), payload).await
    }

    /// `PUT /sms-campaigns/{id}` with only the sequence id.
    pub async fn link_sequence(&self, id: &str, sequence_id: &str) -> Result<(), ClientError> {
        let body = SequenceLink {
            sequence_id: sequence_id.to_string(),
        };
        self.put(&format!("/sms-campaigns/{id}"), &body).await
    }

    // ---- sequences, recipients, test sends ----

    /// `POST /sms-sequences`
    pub async fn create_sequence(&self, payload: &SequencePayload) -> Result<Sequence, ClientError> {
        let response = self
            .client
            .post(self.url("/sms-sequences"))
            .json(payload)
            .send()
            .await?;
        let body: SequenceResponse = Self::parse_response(response).await?;
        Ok(body.sequence)
    }

    /// `POST /sms-recipients`. Returns how many items the backend echoed.
    pub async fn add_recipients(&self, items: &[RecipientItem]) -> Result<usize, ClientError> {
        let response = self
            .client
            .post(self.url("/sms-recipients"))
            .json(&RecipientItemsRequest { items })
            .send()
            .await?;
        let body: RecipientItemsResponse = Self::parse_response(response).await?;
        Ok(body.items.len())
    }

    /// `POST /sms-campaigns/test`
    pub async fn send_test_sms(
        &self,
        request: &TestSmsRequest,
    ) -> Result<TestSmsResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/sms-campaigns/test"))
            .json(request)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::parse_response(response).await
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        let response = self.client.put(self.url(path)).json(body).send().await?;
        Self::check_status(response).await
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or the mapped [`ClientError`] built
    /// from the status and body on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "Backend returned an error status");
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let snippet = body_snippet(&body);
            if snippet.is_empty() {
                ClientError::InvalidResponse(e.to_string())
            } else {
                ClientError::InvalidResponse(format!("{e}: {snippet}"))
            }
        })
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ClientError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();

    if let Some(token) = &config.api_token {
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
        headers.insert(HeaderName::from_static("x-auth-token"), header_value(token)?);
    }
    if let Some(workspace) = &config.workspace_id {
        headers.insert(HeaderName::from_static("x-workspace-id"), header_value(workspace)?);
    }
    if let Some(client_id) = &config.client_id {
        let value = header_value(client_id)?;
        headers.insert(HeaderName::from_static("x-client-id"), value.clone());
        headers.insert(HeaderName::from_static("x-company-id"), value);
    }

    Ok(headers)
}

fn header_value(raw: &str) -> Result<HeaderValue, ClientError> {
    let mut value = HeaderValue::from_str(raw)
        .map_err(|_| ClientError::Config("header value contains invalid characters".into()))?;
    value.set_sensitive(true);
    Ok(value)
}
