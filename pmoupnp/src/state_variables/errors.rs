use thiserror::Error;

use crate::events::EventBusError;

#[derive(Error, Debug)]
pub enum StateVariableError {
    /// La valeur fournie ne correspond pas au type UPnP de la variable
    #[error("Type mismatch for '{name}': expected {expected}, got {got}")]
    TypeMismatch {
        name: String,
        expected: String,
        got: String,
    },

    #[error("Unknown UPnP data type: {0}")]
    UnknownType(String),

    /// Le puits d'agrégation du service a refusé la notification
    #[error("Notification failed: {0}")]
    Notify(#[from] EventBusError),
}
