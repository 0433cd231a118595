use crate::db::error::DbError;
use thiserror::Error;

pub type AppResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Game does not exist or has already been decided
    #[error("Game not found or already ended")]
    GameNotFound,

    /// Player is not one of the two participants of the game
    #[error("You do not have access to this game")]
    NotParticipant,

    /// Player already holds a live connection
    #[error("You already accessed to game")]
    AlreadyConnected,

    /// Missing, expired or otherwise invalid credentials
    #[error("Could not validate credentials")]
    Unauthorized,

    #[error("Incorrect username or password")]
    BadCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("validation failed: {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error(transparent)]
    Password(#[from] password_hash::Error),

    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Error)]
pub enum ConfigErrorKind {
    #[error("failed to read file: {0}")]
    Read(std::io::Error),

    #[error("failed to parse file: {0}")]
    Parse(toml::de::Error),

    #[error("missing environment variable: {0}")]
    MissingEnv(String),

    #[error("invalid environment variable {0}: {1}")]
    InvalidEnv(String, String),
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: std::path::PathBuf,
        #[source]
        source: ConfigErrorKind,
    },

    #[error("invalid configuration: {0}")]
    Env(#[source] ConfigErrorKind),

    #[error("network issue: {0}")]
    Net(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
