/// Domain errors raised synchronously by the campaign wizard model.
///
/// None of these involve the network; they describe local input that cannot
/// be accepted as-is. The wizard turns them into inline notices and leaves
/// the draft untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
