//! Headless SMS campaign wizard.
//!
//! A [`WizardSession`] walks a campaign draft through the six wizard steps,
//! loads its pick lists in the background, sends test messages and finally
//! launches the campaign against an [`reach_client::SmsBackend`].

pub mod error;
pub mod launch;
pub mod loader;
pub mod notice;
pub mod payload;
pub mod session;
pub mod view;

pub use error::WizardError;
pub use launch::{LaunchError, LaunchReport, PartialLaunchError, StepOutcome};
pub use loader::LoadState;
pub use notice::{Notice, NoticeLevel};
pub use session::WizardSession;
pub use view::{ReviewSummary, StepView};
