//! Chemins opaques du stockage distant
//!
//! Le chemin d'une adresse `cloud:…` encode le dossier parent et
//! l'identifiant attribué par le backend :
//!
//! ```text
//! ""                      dossier racine
//! "<parent>/<id>"         dossier
//! "<parent>?file=<id>"    fichier
//! ```
//!
//! Connaître le parent permet de retrouver les métadonnées d'une ressource
//! absente du cache en relistant ce dossier.

use std::fmt;

/// Identifiant du dossier racine côté backend
pub const ROOT_FOLDER_ID: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudPath {
    Root,
    Folder { parent: String, id: String },
    File { parent: String, id: String },
}

impl CloudPath {
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Some(CloudPath::Root);
        }

        if let Some((parent, query)) = path.split_once('?') {
            let id = query.split('&').find_map(|pair| pair.strip_prefix("file="))?;
            if parent.is_empty() || id.is_empty() {
                return None;
            }
            return Some(CloudPath::File {
                parent: parent.to_string(),
                id: id.to_string(),
            });
        }

        let (parent, id) = path.split_once('/')?;
        if parent.is_empty() || id.is_empty() || id.contains('/') {
            return None;
        }
        Some(CloudPath::Folder {
            parent: parent.to_string(),
            id: id.to_string(),
        })
    }

    /// Identifiant à lister, `None` pour un fichier.
    pub fn folder_id(&self) -> Option<&str> {
        match self {
            CloudPath::Root => Some(ROOT_FOLDER_ID),
            CloudPath::Folder { id, .. } => Some(id),
            CloudPath::File { .. } => None,
        }
    }

    pub fn parent(&self) -> Option<&str> {
        match self {
            CloudPath::Root => None,
            CloudPath::Folder { parent, .. } | CloudPath::File { parent, .. } => Some(parent),
        }
    }
}

impl fmt::Display for CloudPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudPath::Root => Ok(()),
            CloudPath::Folder { parent, id } => write!(f, "{}/{}", parent, id),
            CloudPath::File { parent, id } => write!(f, "{}?file={}", parent, id),
        }
    }
}
