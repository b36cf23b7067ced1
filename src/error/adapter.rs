use thiserror::Error as ThisError;

/// The value a module exported cannot serve requests.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ConfigurationError {
    #[error("application export is null")]
    Null,

    #[error("application export is a {0}, expected a request handler")]
    NotInvocable(String),

    #[error("application export is an object without a request handler")]
    MissingHandler,

    #[error("application export nests more than one default wrapper")]
    NestedTooDeep,
}

#[derive(Debug, ThisError)]
pub enum AdapterError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("failed to load application module: {0}")]
    Load(String),

    #[error("response stream failed: {0}")]
    Transport(#[from] axum::Error),
}
