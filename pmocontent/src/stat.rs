use chrono::{DateTime, Utc};

use crate::address::ContentAddress;

pub const DIRECTORY_MIME_TYPE: &str = "inode/directory";

/// Métadonnées d'une ressource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentStat {
    pub name: String,
    pub mod_time: Option<DateTime<Utc>>,
    pub size: u64,
    pub is_directory: bool,
    /// Toujours renseigné ; `inode/directory` pour un dossier
    pub mime_type: String,
    /// Adresse canonique de la ressource
    pub address: ContentAddress,
}

impl ContentStat {
    pub fn directory(name: impl Into<String>, address: ContentAddress) -> Self {
        Self {
            name: name.into(),
            mod_time: None,
            size: 0,
            is_directory: true,
            mime_type: DIRECTORY_MIME_TYPE.to_string(),
            address,
        }
    }

    /// Fichier dont le type MIME est déduit du nom.
    pub fn file(name: impl Into<String>, size: u64, address: ContentAddress) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .to_string();
        Self {
            name,
            mod_time: None,
            size,
            is_directory: false,
            mime_type,
            address,
        }
    }

    pub fn with_mod_time(mut self, mod_time: DateTime<Utc>) -> Self {
        self.mod_time = Some(mod_time);
        self
    }
}
