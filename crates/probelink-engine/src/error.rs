use thiserror::Error;

/// Errors produced while loading catalogs, probing proxies, or emitting output.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to parse catalog from {source}: {error}")]
    CatalogParse {
        source: String,
        #[source]
        error: serde_yaml::Error,
    },

    #[error("duplicate proxy name {name:?} in {source}")]
    DuplicateProxy { name: String, source: String },

    #[error("provider {name:?} uses a reserved name")]
    ReservedProviderName { name: String },

    #[error("invalid server url {input:?}: {reason}")]
    InvalidServerUrl { input: String, reason: String },

    #[error("output path error: {0}")]
    Output(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
