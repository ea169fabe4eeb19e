//! Test sends from the content step.
//!
//! A test send goes to one phone number, never touches the draft, and is
//! remembered in a short most-recent-first history.

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Prefix marking test messages so recipients can tell them apart.
pub const TEST_MESSAGE_PREFIX: &str = "[TEST] ";

/// One completed test send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSendRecord {
    pub phone: String,
    pub sent_at: Timestamp,
}

/// Bounded, most-recent-first list of test sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSendHistory {
    capacity: usize,
    entries: VecDeque<TestSendRecord>,
}

impl TestSendHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a send, dropping the oldest entry when full.
    pub fn record(&mut self, phone: impl Into<String>) -> &TestSendRecord {
        self.push(TestSendRecord {
            phone: phone.into(),
            sent_at: Utc::now(),
        })
    }

    pub fn push(&mut self, record: TestSendRecord) -> &TestSendRecord {
        self.entries.push_front(record);
        self.entries.truncate(self.capacity.max(1));
        &self.entries[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestSendRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Check that a test send has everything it needs.
///
/// Returns the trimmed phone number and the sender to use.
pub fn validate_test_send<'a>(
    phone: &'a str,
    message: &str,
    sender_number: Option<&'a str>,
) -> Result<(&'a str, &'a str), CoreError> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(CoreError::Validation(
            "Please enter a phone number to send the test to.".to_string(),
        ));
    }
    if message.trim().is_empty() {
        return Err(CoreError::Validation(
            "Please add SMS content before sending a test.".to_string(),
        ));
    }
    let sender = sender_number
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            CoreError::Validation("Please select a sender number in the first step.".to_string())
        })?;
    Ok((phone, sender))
}

/// Message body actually sent for a test.
pub fn test_message(message: &str) -> String {
    format!("{TEST_MESSAGE_PREFIX}{message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_keeps_five_most_recent() {
        let mut history = TestSendHistory::new(5);
        for i in 0..7 {
            history.record(format!("+1{i}"));
        }
        let phones: Vec<_> = history.iter().map(|r| r.phone.as_str()).collect();
        assert_eq!(phones, ["+16", "+15", "+14", "+13", "+12"]);
    }

    #[test]
    fn validate_requires_all_inputs() {
        assert!(validate_test_send(" ", "hi", Some("+1")).is_err());
        assert!(validate_test_send("+1", "  ", Some("+1")).is_err());
        assert!(validate_test_send("+1", "hi", None).is_err());
        assert!(validate_test_send("+1", "hi", Some(" ")).is_err());
        assert_eq!(
            validate_test_send(" +1555 ", "hi", Some("+1666")).unwrap(),
            ("+1555", "+1666")
        );
    }

    #[test]
    fn test_message_is_prefixed() {
        assert_eq!(test_message("Hello"), "[TEST] Hello");
    }
}
