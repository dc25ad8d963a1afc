use thiserror::Error;

/// Failure taxonomy for core operations.
///
/// `NotFound` is reserved for lookups the caller named explicitly (a food or
/// recipe title that does not exist). A missing progress row is *not* an
/// error; readers treat it as "start from zero".
#[derive(Debug, Error)]
pub enum SproutError {
    /// No acting user could be resolved. The caller should prompt for
    /// `sprout user set <name>` rather than retry.
    #[error("no user selected; run `sprout user set <name>` first")]
    Unauthenticated,

    /// The action needs state that does not exist yet (e.g. introducing a
    /// food before any baby profile has been created). Nothing was written.
    #[error("{0}")]
    PreconditionMissing(String),

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// Caller-supplied input failed validation.
    #[error("{0}")]
    Invalid(String),

    /// The datastore call itself failed. Transient from the caller's point
    /// of view; the triggering action may simply be re-run.
    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A stored JSON column (profile lists, achievements) failed to decode.
    #[error("corrupt stored data: {0}")]
    Data(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SproutError>;

impl SproutError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        SproutError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        SproutError::Invalid(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        SproutError::PreconditionMissing(msg.into())
    }
}
