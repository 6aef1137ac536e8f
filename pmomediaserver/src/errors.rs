use pmocontent::ContentError;
use pmoupnp::EventBusError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Unknown object '{0}'")]
    UnknownObject(String),

    #[error("Object '{0}' is not a container")]
    NotAContainer(String),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("Update notification failed: {0}")]
    Event(#[from] EventBusError),
}
