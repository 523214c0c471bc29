use thiserror::Error;

/// Upstream error bodies are cut to this many characters before they reach a client.
pub const MAX_ERROR_BODY_CHARS: usize = 200;

/// Startup and model-table errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set; refusing to start without an upstream API key")]
    MissingApiKey(&'static str),

    #[error("Invalid port {0:?}: expected an integer between 1 and 65535")]
    InvalidPort(String),

    #[error("Invalid timeout_secs {0}: upstream calls need a timeout of at least 1 second")]
    InvalidTimeout(u64),

    #[error("Could not read config file {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Model list is empty; configure at least one [[models]] entry")]
    EmptyModelList,

    #[error("Model index {index} is out of range ({len} models configured)")]
    ModelIndexOutOfRange { index: i64, len: usize },
}

/// Request-time failure taxonomy. Every variant becomes `{success:false, error}`.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// 404/400 from the upstream on the last configured model.
    #[error("API error {status}: {body}")]
    UpstreamUnavailable { status: u16, body: String },

    #[error("API error {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Upstream request failed: {0}")]
    UpstreamTransport(String),

    #[error("Empty AI response")]
    EmptyResponse,

    #[error("Response is not valid JSON")]
    MalformedJson,
}

impl RelayError {
    /// Validation failures are the caller's fault; everything else is ours or upstream's.
    pub fn is_validation(&self) -> bool {
        matches!(self, RelayError::Validation(_))
    }
}

/// Cut an upstream diagnostic body to [`MAX_ERROR_BODY_CHARS`] characters.
pub fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

pub type Result<T> = std::result::Result<T, RelayError>;
