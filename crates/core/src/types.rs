/// Identifiers issued by the backend. The API is inconsistent about
/// returning them as JSON strings or numbers, so they are normalised to
/// strings at the client boundary.
pub type RecordId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
