use thiserror::Error;

/// Error surface shared by inspectors and the layers that convert into it.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The attribute or message cannot be processed as given.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A backend or lookup failed while processing valid input.
    #[error("engine error: {0}")]
    EngineError(String),
}
