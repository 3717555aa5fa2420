//! Registry errors

/// Errors from the status chain registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Kind registered twice through the strict entry point
    #[error("status kind '{0}' is already registered")]
    AlreadyRegistered(String),

    /// Lookup of a kind that was never registered
    #[error("status kind '{0}' is not registered")]
    UnknownKind(String),

    /// Global id outside every registered block
    #[error("status id {id} is outside the registered range 0..{end}")]
    IdOutOfRange { id: u32, end: u32 },

    /// Vocabulary ranks are not contiguous and unique
    #[error("status kind '{0}' has duplicate or non-contiguous ranks")]
    InvalidRanks(String),

    /// Vocabulary without values
    #[error("status kind '{0}' has no values")]
    EmptyVocabulary(String),
}
