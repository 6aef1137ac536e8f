//! Extension de `pmoconfig::Config` pour la pile UPnP
//!
//! Regroupe la lecture de la section `upnp` du fichier de configuration et
//! la construction des paramètres SSDP et device qui en découlent.

use std::path::PathBuf;

use anyhow::Result;
use pmoconfig::Config;
use pmoutils::{LocalInterface, list_interfaces};
use serde_yaml::Value;

use crate::devices::{DeviceConfig, server_string};
use crate::ssdp::{DEFAULT_MAX_AGE, SSDP_PORT, SsdpOptions};

const DEFAULT_FRIENDLY_NAME: &str = "PMOMedia";
const DEFAULT_MANUFACTURER: &str = "PMOMedia";
const DEFAULT_MODEL_NAME: &str = "PMOMedia Server";

/// Trait d'extension pour la configuration UPnP
///
/// # Exemple
///
/// ```rust,ignore
/// use pmoconfig::get_config;
/// use pmoupnp::UpnpConfigExt;
///
/// let config = get_config();
/// let options = config.ssdp_options();
/// let interfaces = config.ssdp_interfaces();
/// ```
pub trait UpnpConfigExt {
    fn get_upnp_friendly_name(&self) -> String;

    fn set_upnp_friendly_name(&self, name: String) -> Result<()>;

    fn get_upnp_manufacturer(&self) -> String;

    fn set_upnp_manufacturer(&self, manufacturer: String) -> Result<()>;

    fn get_upnp_model_name(&self) -> String;

    /// Langue de la description (`Content-Language`), absente si vide
    fn get_upnp_language(&self) -> Option<String>;

    fn get_upnp_dlna(&self) -> bool;

    /// Version mineure UPnP (0 ou 1)
    fn get_upnp_version(&self) -> u32;

    fn get_upnp_config_id(&self) -> u32;

    fn get_upnp_search_port(&self) -> u16;

    fn get_ssdp_max_age(&self) -> u32;

    /// Noms des interfaces réseau retenues ; vide = toutes
    fn get_ssdp_interface_names(&self) -> Vec<String>;

    /// Répertoire des icônes des devices
    fn get_upnp_icons_dir(&self) -> PathBuf;

    /// Interfaces IPv4 sur lesquelles SSDP écoute et annonce
    fn ssdp_interfaces(&self) -> Vec<LocalInterface>;

    /// Paramètres SSDP dérivés de la configuration
    fn ssdp_options(&self) -> SsdpOptions;

    /// Configuration de base d'un device : identité, langue, DLNA, icônes et
    /// UDN persistant.
    fn device_config(&self, device_type: &str, name: &str) -> Result<DeviceConfig>;
}

impl UpnpConfigExt for Config {
    fn get_upnp_friendly_name(&self) -> String {
        self.get_string(&["upnp", "friendly_name"], DEFAULT_FRIENDLY_NAME)
    }

    fn set_upnp_friendly_name(&self, name: String) -> Result<()> {
        self.set_value(&["upnp", "friendly_name"], Value::String(name))
    }

    fn get_upnp_manufacturer(&self) -> String {
        self.get_string(&["upnp", "manufacturer"], DEFAULT_MANUFACTURER)
    }

    fn set_upnp_manufacturer(&self, manufacturer: String) -> Result<()> {
        self.set_value(&["upnp", "manufacturer"], Value::String(manufacturer))
    }

    fn get_upnp_model_name(&self) -> String {
        self.get_string(&["upnp", "model_name"], DEFAULT_MODEL_NAME)
    }

    fn get_upnp_language(&self) -> Option<String> {
        let language = self.get_string(&["upnp", "language"], "");
        (!language.is_empty()).then_some(language)
    }

    fn get_upnp_dlna(&self) -> bool {
        self.get_bool(&["upnp", "dlna"], true)
    }

    fn get_upnp_version(&self) -> u32 {
        self.get_u64(&["upnp", "version"], 1).min(1) as u32
    }

    fn get_upnp_config_id(&self) -> u32 {
        self.get_u64(&["upnp", "config_id"], 1) as u32
    }

    fn get_upnp_search_port(&self) -> u16 {
        u16::try_from(self.get_u64(&["upnp", "search_port"], SSDP_PORT as u64)).unwrap_or(SSDP_PORT)
    }

    fn get_ssdp_max_age(&self) -> u32 {
        self.get_u64(&["upnp", "ssdp", "max_age"], DEFAULT_MAX_AGE as u64) as u32
    }

    fn get_ssdp_interface_names(&self) -> Vec<String> {
        self.get_string_list(&["upnp", "ssdp", "interfaces"])
    }

    fn get_upnp_icons_dir(&self) -> PathBuf {
        self.get_managed_dir(&["upnp", "icons_directory"], "icons")
    }

    fn ssdp_interfaces(&self) -> Vec<LocalInterface> {
        list_interfaces(&self.get_ssdp_interface_names())
    }

    fn ssdp_options(&self) -> SsdpOptions {
        let version = self.get_upnp_version();
        SsdpOptions {
            http_port: self.get_http_port(),
            server_name: server_string(version, self.get_upnp_dlna()),
            version,
            config_id: self.get_upnp_config_id(),
            search_port: self.get_upnp_search_port(),
            max_age: self.get_ssdp_max_age(),
            ..SsdpOptions::default()
        }
    }

    fn device_config(&self, device_type: &str, name: &str) -> Result<DeviceConfig> {
        let mut config = DeviceConfig::new(device_type, 1)
            .with_udn(self.get_device_udn(device_type, name)?)
            .with_friendly_name(self.get_upnp_friendly_name());
        config.manufacturer = self.get_upnp_manufacturer();
        config.model_name = self.get_upnp_model_name();
        config.language = self.get_upnp_language();
        config.dlna = self.get_upnp_dlna();
        config.upnp_version = self.get_upnp_version();
        config.icons_dir = Some(self.get_upnp_icons_dir());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upnp_section_defaults() {
        let config = Config::in_memory("").unwrap();
        assert_eq!(config.get_upnp_friendly_name(), "PMOMedia");
        assert_eq!(config.get_upnp_language(), None);
        assert!(config.get_upnp_dlna());
        assert_eq!(config.get_ssdp_max_age(), 1800);

        let options = config.ssdp_options();
        assert_eq!(options.version, 1);
        assert_eq!(options.search_port, 1900);
        assert_eq!(options.http_port, 8080);
    }

    #[test]
    fn test_device_config_from_overrides() {
        let config = Config::in_memory(
            "upnp:\n  friendly_name: Salon\n  language: fr\n  dlna: false\n  version: 0\n",
        )
        .unwrap();

        let device = config.device_config("MediaServer", "main").unwrap();
        assert_eq!(device.friendly_name, "Salon");
        assert_eq!(device.language.as_deref(), Some("fr"));
        assert!(!device.dlna);
        assert_eq!(device.upnp_version, 0);
        assert!(device.udn.is_some());

        // L'UDN est stable pour un même couple (type, nom)
        let again = config.device_config("MediaServer", "main").unwrap();
        assert_eq!(device.udn, again.udn);
    }
}
