use thiserror::Error;

#[derive(Error, Debug)]
pub enum SsdpError {
    /// Datagramme illisible (ligne de requête inconnue, en-tête obligatoire absent...)
    #[error("Malformed SSDP message: {0}")]
    Malformed(String),

    #[error("SSDP socket error: {0}")]
    Io(#[from] std::io::Error),
}
