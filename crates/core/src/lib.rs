//! Domain model for the SMS campaign wizard.
//!
//! Pure logic only (no I/O, no async): wizard steps and gating, the
//! campaign draft and its follow-ups, recipient aggregation and CSV
//! mapping, message personalization, and test-send history.

pub mod csv;
pub mod defaults;
pub mod draft;
pub mod error;
pub mod personalize;
pub mod recipients;
pub mod test_send;
pub mod types;
pub mod wizard;
