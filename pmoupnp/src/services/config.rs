use indexmap::IndexMap;

/// Configuration d'un service au sein d'un device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Clé de l'implémentation dans le [`ServiceRegistry`](super::ServiceRegistry)
    pub class_prefix: String,
    /// Segment de chemin HTTP sous le device, unique dans le device
    pub route: String,
    /// Type UPnP (ex: `ContentDirectory`)
    pub service_type: String,
    pub version: u32,
    /// Numéro d'instance pour un service cloné dynamiquement
    pub instance_id: Option<u32>,
    /// Enregistrer le type de service auprès de SSDP
    pub advertise: bool,
    /// Paramètres libres propres à l'implémentation
    pub params: IndexMap<String, String>,
}

impl ServiceConfig {
    /// Configuration par défaut : route = `class_prefix` en minuscules, annoncé.
    pub fn new(class_prefix: impl Into<String>, service_type: impl Into<String>, version: u32) -> Self {
        let class_prefix = class_prefix.into();
        Self {
            route: class_prefix.to_lowercase(),
            class_prefix,
            service_type: service_type.into(),
            version,
            instance_id: None,
            advertise: true,
            params: IndexMap::new(),
        }
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Ne pas annoncer ce service par SSDP.
    pub fn unadvertised(mut self) -> Self {
        self.advertise = false;
        self
    }

    /// URN du type de service, ex: `urn:schemas-upnp-org:service:ContentDirectory:1`
    pub fn urn(&self) -> String {
        format!(
            "urn:schemas-upnp-org:service:{}:{}",
            self.service_type, self.version
        )
    }

    pub fn service_id(&self) -> String {
        format!("urn:upnp-org:serviceId:{}", self.service_type)
    }

    pub fn is_instance(&self) -> bool {
        self.instance_id.is_some()
    }

    /// Copie pour l'instance `n` : route `route_id_n`, jamais annoncée.
    pub fn instance(&self, n: u32) -> Self {
        let mut config = self.clone();
        config.route = instance_route(&self.route, n);
        config.instance_id = Some(n);
        config.advertise = false;
        config
    }
}

pub(crate) fn instance_route(base: &str, n: u32) -> String {
    format!("{}_id_{}", base, n)
}
