use reach_client::ClientError;
use reach_core::error::CoreError;

/// Errors returned by [`crate::session::WizardSession`] operations.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// Local validation or lookup failure. The session state is unchanged.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A backend call failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The session was launched or closed and no longer accepts edits.
    #[error("Wizard session is closed")]
    SessionClosed,
}

impl WizardError {
    /// Whether this is a local validation failure (as opposed to a
    /// transport or lifecycle error).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Core(CoreError::Validation(_)))
    }
}
