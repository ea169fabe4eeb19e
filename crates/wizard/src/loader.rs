//! Background loads that populate the wizard's pick lists.
//!
//! Each section (sender numbers, templates, A/B tests, stored recipients,
//! and the campaign being edited) is fetched by its own spawned task.
//! Tasks race the session's [`CancellationToken`] and report back over a
//! channel, so sections fill in independently and in any order.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use reach_client::models::{
    AbTest, Campaign, Connection, ExistingRecipient, SenderNumber, SmsTemplate,
};
use reach_client::{ClientError, SmsBackend};

/// Friendly name used when neither the number nor its connection has one.
pub const GENERIC_SENDER_NAME: &str = "SignalWire Number";

// ---------------------------------------------------------------------------
// LoadState
// ---------------------------------------------------------------------------

/// Progress of one independently loaded section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState<T> {
    Loading,
    Ready(T),
    /// The load failed; the section renders its empty state.
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl<T> LoadState<Vec<T>> {
    /// Loaded items, or an empty slice while loading or after a failure.
    pub fn items(&self) -> &[T] {
        self.ready().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl<T> From<Result<T, ClientError>> for LoadState<T> {
    fn from(result: Result<T, ClientError>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Sender number discovery
// ---------------------------------------------------------------------------

/// Where the discovered sender numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderSource {
    /// Active SignalWire connections (their number lists or configured
    /// default senders).
    Connections,
    /// Listing connections failed; the workspace SMS settings were used.
    Settings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderDiscovery {
    pub numbers: Vec<SenderNumber>,
    pub source: SenderSource,
}

/// Collect every sender number the workspace can send from.
///
/// Never fails: each connection whose number list is empty or cannot be
/// fetched contributes its configured default sender instead, and when
/// connections cannot be listed at all the SMS settings' default sender is
/// used. The result may be empty.
pub async fn discover_sender_numbers(backend: &dyn SmsBackend) -> SenderDiscovery {
    let connections = match backend.list_connections().await {
        Ok(connections) => connections,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load numbers from connections");
            return SenderDiscovery {
                numbers: settings_sender(backend).await,
                source: SenderSource::Settings,
            };
        }
    };

    let active: Vec<&Connection> = connections
        .iter()
        .filter(|c| c.supplies_sms_numbers())
        .collect();
    let fetched = join_all(
        active
            .iter()
            .map(|c| backend.list_connection_numbers(&c.id)),
    )
    .await;

    let mut numbers = Vec::new();
    for (connection, result) in active.into_iter().zip(fetched) {
        match result {
            Ok(list) if !list.is_empty() => {
                numbers.extend(list.into_iter().map(|n| label_number(n, connection)));
            }
            Ok(_) => numbers.extend(connection.fallback_number()),
            Err(e) => {
                tracing::warn!(
                    connection_id = %connection.id,
                    error = %e,
                    "Failed to fetch connection numbers, using configured sender",
                );
                numbers.extend(connection.fallback_number());
            }
        }
    }

    SenderDiscovery {
        numbers,
        source: SenderSource::Connections,
    }
}

fn label_number(mut number: SenderNumber, connection: &Connection) -> SenderNumber {
    if number.friendly_name.trim().is_empty() {
        number.friendly_name = connection.display_name();
    }
    number
}

async fn settings_sender(backend: &dyn SmsBackend) -> Vec<SenderNumber> {
    match backend.get_sms_settings().await {
        Ok(settings) => settings
            .default_sender_number
            .filter(|n| !n.trim().is_empty())
            .map(|phone_number| SenderNumber {
                phone_number,
                friendly_name: GENERIC_SENDER_NAME.to_string(),
            })
            .into_iter()
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load SMS settings");
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Result of one finished section load.
#[derive(Debug)]
pub enum LoadEvent {
    SenderNumbers {
        /// Matches the request that produced it; stale reloads are ignored.
        generation: u64,
        discovery: SenderDiscovery,
    },
    Templates(Result<Vec<SmsTemplate>, ClientError>),
    AbTests(Result<Vec<AbTest>, ClientError>),
    ExistingRecipients(Result<Vec<ExistingRecipient>, ClientError>),
    Campaign(Result<Campaign, ClientError>),
}

/// Spawns section loads and hands their results back in completion order.
pub(crate) struct Loader {
    backend: Arc<dyn SmsBackend>,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<LoadEvent>,
    rx: mpsc::UnboundedReceiver<LoadEvent>,
    pending: usize,
}

impl Loader {
    pub(crate) fn new(backend: Arc<dyn SmsBackend>, cancel: CancellationToken) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend,
            cancel,
            tx,
            rx,
            pending: 0,
        }
    }

    /// Number of spawned loads whose results have not been taken yet.
    pub(crate) fn pending(&self) -> usize {
        self.pending
    }

    /// Spawn one load. Must be called from within a Tokio runtime.
    pub(crate) fn spawn<F, Fut>(&mut self, load: F)
    where
        F: FnOnce(Arc<dyn SmsBackend>) -> Fut,
        Fut: Future<Output = LoadEvent> + Send + 'static,
    {
        let fut = load(Arc::clone(&self.backend));
        let tx = self.tx.clone();
        let cancel = self.cancel.clone();
        self.pending += 1;

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Section load cancelled");
                }
                event = fut => {
                    // The receiver only goes away with the session.
                    let _ = tx.send(event);
                }
            }
        });
    }

    /// Take one finished result without waiting.
    pub(crate) fn try_next(&mut self) -> Option<LoadEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        match self.rx.try_recv() {
            Ok(event) => {
                self.pending = self.pending.saturating_sub(1);
                Some(event)
            }
            Err(_) => None,
        }
    }

    /// Wait for the next finished result. Returns `None` once nothing is
    /// pending or the session was cancelled.
    pub(crate) async fn next(&mut self) -> Option<LoadEvent> {
        if self.pending == 0 {
            return None;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            event = self.rx.recv() => {
                self.pending = self.pending.saturating_sub(1);
                event
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_are_empty_unless_ready() {
        let loading: LoadState<Vec<u8>> = LoadState::Loading;
        assert!(loading.items().is_empty());
        assert!(loading.is_loading());

        let failed: LoadState<Vec<u8>> = LoadState::Failed("boom".into());
        assert!(failed.items().is_empty());
        assert_eq!(failed.error(), Some("boom"));

        assert_eq!(LoadState::Ready(vec![1, 2]).items(), &[1, 2]);
    }

    #[test]
    fn from_client_result() {
        let state: LoadState<u8> = Err(ClientError::Unauthorized).into();
        assert_eq!(state.error(), Some("Authentication required"));
        let state: LoadState<u8> = Ok(3).into();
        assert_eq!(state.ready(), Some(&3));
    }
}
