use thiserror::Error;

/// Erreurs remontées par [`AsyncEventBus::emit`](super::AsyncEventBus::emit).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventBusError {
    /// Un handler a signalé une erreur ; la chaîne a été interrompue
    #[error("Handler for event '{event}' failed: {message}")]
    Handler { event: String, message: String },
}
