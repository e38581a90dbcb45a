use thiserror::Error;

/// Failures of the registration handler. The `Display` text of the first two
/// variants is what the user sees.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Anything that keeps a completion request from producing reply text.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion service returned HTTP {0}")]
    Status(u16),
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credential was provided by the identity provider")]
    MissingCredential,
    #[error("malformed identity token: {0}")]
    MalformedToken(String),
    #[error("could not open the authorization page: {0}")]
    Launch(String),
    #[error("invalid authorization url: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration directory available")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}
