use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecretsError {
    #[error("Secret already exists: {name}")]
    AlreadyExists { name: String },

    #[error("Invalid secret name: {name}")]
    InvalidName { name: String },

    #[error("Orchestrator error: {0}")]
    Orchestrator(String),
}

pub type Result<T> = std::result::Result<T, SecretsError>;
