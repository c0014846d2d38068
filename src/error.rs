use thiserror::Error;

/// Fatal catalog errors. Anything here means no snapshot could be built.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog source '{location}' could not be read: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog source '{location}' could not be fetched: {source}")]
    Http {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("catalog source '{location}' returned HTTP {status}")]
    HttpStatus { location: String, status: u16 },

    #[error("catalog is not a valid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog must be a JSON array of programs, found {found}")]
    NotAnArray { found: &'static str },
}

/// Per-request outcomes that are not successes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("No matching funding options found.")]
    NoMatchFound,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, CatalogError>;
