use thiserror::Error;

use crate::services::ServiceError;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Service route '{0}' already exists in device")]
    ServiceAlreadyExists(String),

    #[error("Device route '{0}' already exists in device")]
    DeviceAlreadyExists(String),

    /// Un service exigé par le type de device est absent de la configuration
    #[error("Required service '{0}' is missing from device configuration")]
    MissingService(String),

    #[error("Invalid device version {0}")]
    InvalidVersion(u32),

    #[error("Invalid route '{0}'")]
    InvalidRoute(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}
