use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidbookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Video decode error: {0}")]
    Decode(String),

    #[error("Media encoding error: {0}")]
    Encoding(String),

    #[error("Generation service error: {0}")]
    Generation(String),

    #[error("Response did not match the expected schema: {0}")]
    SchemaViolation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Library error: {0}")]
    Library(String),
}

impl VidbookError {
    /// True when the service answered but the payload was unusable.
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, Self::SchemaViolation(_))
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Toml(_) => "toml",
            Self::Decode(_) => "decode",
            Self::Encoding(_) => "encoding",
            Self::Generation(_) => "generation",
            Self::SchemaViolation(_) => "schema_violation",
            Self::Config(_) => "config",
            Self::Library(_) => "library",
        }
    }
}

pub type Result<T> = std::result::Result<T, VidbookError>;
