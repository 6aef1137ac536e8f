use thiserror::Error;

use crate::state_variables::StateVariableError;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Aucune implémentation enregistrée pour ce `classPrefix`
    #[error("Unknown service class '{0}'")]
    UnknownClass(String),

    #[error("Service '{route}' failed to initialize: {message}")]
    Initialization { route: String, message: String },

    #[error("State variable error: {0}")]
    State(#[from] StateVariableError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
