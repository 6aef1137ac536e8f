use indexmap::IndexMap;

use super::ROOT_DEVICE;

/// Identité annoncée par SSDP : un device et ses couples NT → USN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsdpEntry {
    /// UUID du device, toujours préfixé par `uuid:`
    pub uuid: String,
    /// Chemin HTTP de la description (ex: `/description.xml`)
    pub location: String,
    /// Type de notification → nom unique de service
    pub bindings: IndexMap<String, String>,
}

impl SsdpEntry {
    /// Entrée d'un device embarqué : `uuid` et `uuid::usn`.
    pub fn device(uuid: &str, usn: &str, location: &str) -> Self {
        let uuid = normalize_uuid(uuid);
        let mut bindings = IndexMap::new();
        bindings.insert(uuid.clone(), uuid.clone());
        bindings.insert(usn.to_string(), format!("{}::{}", uuid, usn));
        Self {
            uuid,
            location: location.to_string(),
            bindings,
        }
    }

    /// Entrée d'un device racine : ajoute `upnp:rootdevice` en tête.
    pub fn root(uuid: &str, usn: &str, location: &str) -> Self {
        let mut entry = Self::device(uuid, usn, location);
        let root_usn = format!("{}::{}", entry.uuid, ROOT_DEVICE);
        entry.bindings.shift_insert(0, ROOT_DEVICE.to_string(), root_usn);
        entry
    }

    pub fn bind(&mut self, nt: &str) {
        self.bindings
            .insert(nt.to_string(), format!("{}::{}", self.uuid, nt));
    }
}

/// Ajoute le préfixe `uuid:` s'il est absent.
pub(crate) fn normalize_uuid(uuid: &str) -> String {
    if uuid.starts_with("uuid:") {
        uuid.to_string()
    } else {
        format!("uuid:{}", uuid)
    }
}
