use std::path::PathBuf;

use indexmap::IndexMap;

use crate::services::ServiceConfig;

/// Icône déclarée dans la description et servie sous `icons/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconConfig {
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    /// Nom du fichier dans le répertoire d'icônes
    pub file: String,
}

impl IconConfig {
    pub fn new(file: impl Into<String>, width: u32, height: u32) -> Self {
        let file = file.into();
        let mime_type = mime_guess::from_path(&file)
            .first_or_octet_stream()
            .to_string();
        Self {
            mime_type,
            width,
            height,
            depth: 24,
            file,
        }
    }
}

/// Configuration d'un device UPnP.
///
/// Pour un device embarqué, `language`, `dlna`, `upnp_version` et `icons_dir`
/// sont hérités du device parent.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Type UPnP court (`MediaServer`) ou URN complète
    pub device_type: String,
    pub version: u32,
    /// Segment de chemin HTTP ; vide pour un device racine monté à `/`
    pub route: String,
    /// UDN fixe ; généré si absent
    pub udn: Option<String>,
    pub friendly_name: String,
    pub manufacturer: String,
    pub manufacturer_url: Option<String>,
    pub model_name: String,
    pub model_description: Option<String>,
    pub model_number: Option<String>,
    pub serial_number: Option<String>,
    /// Services par `classPrefix`
    pub services: IndexMap<String, ServiceConfig>,
    /// `classPrefix` que la configuration doit obligatoirement fournir
    pub required_services: Vec<String>,
    /// Valeur de `Content-Language` pour la description
    pub language: Option<String>,
    pub dlna: bool,
    /// Version mineure UPnP annoncée (1.0 ou 1.1)
    pub upnp_version: u32,
    pub icons_dir: Option<PathBuf>,
    pub icons: Vec<IconConfig>,
}

impl DeviceConfig {
    pub fn new(device_type: impl Into<String>, version: u32) -> Self {
        let device_type = device_type.into();
        Self {
            route: String::new(),
            udn: None,
            friendly_name: device_type.clone(),
            manufacturer: "PMOMedia".to_string(),
            manufacturer_url: None,
            model_name: device_type.clone(),
            model_description: None,
            model_number: None,
            serial_number: None,
            services: IndexMap::new(),
            required_services: Vec::new(),
            language: None,
            dlna: false,
            upnp_version: 0,
            icons_dir: None,
            icons: Vec::new(),
            device_type,
            version,
        }
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    pub fn with_udn(mut self, udn: impl Into<String>) -> Self {
        self.udn = Some(udn.into());
        self
    }

    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = name.into();
        self
    }

    /// Ajoute (ou remplace) un service, indexé par son `classPrefix`.
    pub fn with_service(mut self, service: ServiceConfig) -> Self {
        self.services.insert(service.class_prefix.clone(), service);
        self
    }

    pub fn require_service(mut self, class_prefix: impl Into<String>) -> Self {
        self.required_services.push(class_prefix.into());
        self
    }

    pub fn with_icon(mut self, icon: IconConfig) -> Self {
        self.icons.push(icon);
        self
    }

    /// URN du type de device.
    pub fn urn(&self) -> String {
        if self.device_type.starts_with("urn:") {
            self.device_type.clone()
        } else {
            format!(
                "urn:schemas-upnp-org:device:{}:{}",
                self.device_type, self.version
            )
        }
    }

    /// Premier service exigé absent de `services`.
    pub(crate) fn missing_service(&self) -> Option<&str> {
        self.required_services
            .iter()
            .find(|class| !self.services.contains_key(class.as_str()))
            .map(String::as_str)
    }
}
