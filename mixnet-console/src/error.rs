use reqwest::StatusCode;

/// Errors raised while talking to the admin service or loading console resources
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Transport failure or undecodable JSON body
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("admin service answered {status} on {endpoint}")]
    Status { endpoint: String, status: StatusCode },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Command not found: {0}")]
    UnknownCommand(String),
    #[error("Command {command} takes {expected} values, got {given}")]
    TooManyValues { command: String, expected: usize, given: usize },
    #[error("No resource bundle for locale: {0}")]
    UnknownLocale(String),
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
