/// Errors surfaced by user store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row matched the username (and, for completion updates, the
    /// addressed day/workout slot).
    #[error("{0}")]
    NotFound(String),

    #[error("user '{0}' already exists")]
    AlreadyExists(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
