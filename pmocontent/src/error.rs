//! Erreurs des fournisseurs de contenu

use thiserror::Error;

/// Type Result personnalisé pour pmocontent
pub type Result<T> = std::result::Result<T, ContentError>;

#[derive(Error, Debug)]
pub enum ContentError {
    /// Identifiants refusés par le backend
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Ressource ou dossier parent introuvable
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Réponse HTTP inattendue
    #[error("Unexpected status {code} for {address}")]
    Status { code: u16, address: String },

    /// Réponse de listing illisible ; `body` conserve la réponse brute
    #[error("Failed to parse listing: {message}")]
    Parse { message: String, body: String },

    #[error("Transport error on {address}: {message}")]
    Transport { address: String, message: String },

    #[error("Too many redirects ({hops}) while reading {address}")]
    TooManyRedirects { address: String, hops: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Invalid content address '{0}'")]
    InvalidAddress(String),

    #[error("No provider registered under '{0}'")]
    UnknownProvider(String),

    #[error("Invalid provider configuration: {0}")]
    Configuration(String),
}

impl ContentError {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ContentError::Authentication(_))
    }
}
