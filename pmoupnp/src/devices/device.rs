use std::sync::Arc;

use futures::{StreamExt, stream};
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::{DeviceConfig, DeviceError, server_string};
use crate::services::{ServiceConfig, ServiceRegistry, UpnpService, instance_route};
use crate::ssdp::SsdpServer;

/// Nombre de services initialisés simultanément par [`Device::add_services`].
pub const SERVICE_INIT_CONCURRENCY: usize = 4;

pub const DESCRIPTION_PATH: &str = "description.xml";

/// Nœud de l'arbre de composition : un device, ses services et ses devices
/// embarqués.
///
/// Le device racine possède le moteur SSDP et la configuration globale
/// (langue, DLNA) ; les devices embarqués en héritent.
pub struct Device {
    pub(super) config: DeviceConfig,
    device_type: String,
    udn: String,
    /// Chemin HTTP du device (vide pour une racine montée à `/`)
    base_path: String,
    /// Chemin de la description du device racine
    location: String,
    server: String,
    pub(super) services: RwLock<IndexMap<String, Arc<dyn UpnpService>>>,
    pub(super) devices: RwLock<IndexMap<String, Arc<Device>>>,
    ssdp: Arc<SsdpServer>,
    registry: Arc<ServiceRegistry>,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("device_type", &self.device_type)
            .field("udn", &self.udn)
            .field("base_path", &self.base_path)
            .field("services", &self.services.read().keys().collect::<Vec<_>>())
            .field("devices", &self.devices.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

fn normalize_udn(udn: Option<&str>) -> String {
    match udn {
        Some(udn) if udn.starts_with("uuid:") => udn.to_string(),
        Some(udn) => format!("uuid:{}", udn),
        None => format!("uuid:{}", uuid::Uuid::new_v4()),
    }
}

fn validate(config: &DeviceConfig) -> Result<(), DeviceError> {
    if config.version == 0 {
        return Err(DeviceError::InvalidVersion(config.version));
    }
    if let Some(class) = config.missing_service() {
        return Err(DeviceError::MissingService(class.to_string()));
    }
    Ok(())
}

impl Device {
    /// Crée le device racine et l'enregistre auprès de SSDP.
    ///
    /// Les services de la configuration ne sont pas encore instanciés : voir
    /// [`Device::add_configured_services`].
    ///
    /// # Errors
    ///
    /// - [`DeviceError::InvalidVersion`] si la version est nulle
    /// - [`DeviceError::MissingService`] si un service exigé est absent
    pub fn new_root(
        config: DeviceConfig,
        ssdp: Arc<SsdpServer>,
        registry: Arc<ServiceRegistry>,
    ) -> Result<Arc<Self>, DeviceError> {
        validate(&config)?;

        let route = config.route.trim_matches('/');
        let base_path = if route.is_empty() {
            String::new()
        } else {
            format!("/{}", route)
        };
        let location = format!("{}/{}", base_path, DESCRIPTION_PATH);

        let device = Self {
            device_type: config.urn(),
            udn: normalize_udn(config.udn.as_deref()),
            server: server_string(config.upnp_version, config.dlna),
            base_path,
            location,
            services: RwLock::new(IndexMap::new()),
            devices: RwLock::new(IndexMap::new()),
            ssdp,
            registry,
            config,
        };

        device
            .ssdp
            .add_root(&device.udn, &device.device_type, &device.location);
        info!(
            "✅ Root device {} ({}) created at {}",
            device.config.friendly_name, device.udn, device.location
        );
        Ok(Arc::new(device))
    }

    /// Ajoute un device embarqué sous la route `config.route`.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::InvalidRoute`] si la route est vide
    /// - [`DeviceError::DeviceAlreadyExists`] si la route est déjà prise
    pub fn add_embedded(&self, mut config: DeviceConfig) -> Result<Arc<Device>, DeviceError> {
        validate(&config)?;

        let route = config.route.trim_matches('/').to_string();
        if route.is_empty() || route.contains('/') {
            return Err(DeviceError::InvalidRoute(config.route));
        }

        config.route = route.clone();
        config.language = self.config.language.clone();
        config.dlna = self.config.dlna;
        config.upnp_version = self.config.upnp_version;
        config.icons_dir = self.config.icons_dir.clone();

        let services = self.services.read();
        let mut devices = self.devices.write();
        if devices.contains_key(&route) || services.contains_key(&route) {
            return Err(DeviceError::DeviceAlreadyExists(route));
        }

        let device = Arc::new(Self {
            device_type: config.urn(),
            udn: normalize_udn(config.udn.as_deref()),
            server: self.server.clone(),
            base_path: format!("{}/{}", self.base_path, route),
            location: self.location.clone(),
            services: RwLock::new(IndexMap::new()),
            devices: RwLock::new(IndexMap::new()),
            ssdp: self.ssdp.clone(),
            registry: self.registry.clone(),
            config,
        });

        self.ssdp
            .add_device(&device.udn, &device.device_type, &device.location);
        devices.insert(route, device.clone());
        info!(
            "✅ Embedded device {} added under {}",
            device.udn, device.base_path
        );
        Ok(device)
    }

    /// Instancie et initialise les services de la configuration du device.
    pub async fn add_configured_services(&self) -> Result<(), DeviceError> {
        self.add_services(self.config.services.clone()).await
    }

    /// Instancie et initialise des services, au plus
    /// [`SERVICE_INIT_CONCURRENCY`] à la fois.
    ///
    /// Les services sont enregistrés dans l'ordre de la configuration, ce qui
    /// fixe l'ordre de `serviceList`. La première erreur interrompt
    /// l'opération ; les services déjà enregistrés le restent.
    pub async fn add_services(
        &self,
        services: IndexMap<String, ServiceConfig>,
    ) -> Result<(), DeviceError> {
        let pending = services.into_iter().map(|(class_prefix, mut config)| {
            config.class_prefix = class_prefix;
            self.instantiate(config)
        });

        let mut initialized = stream::iter(pending).buffered(SERVICE_INIT_CONCURRENCY);
        while let Some(result) = initialized.next().await {
            self.register_service(result?)?;
        }
        Ok(())
    }

    async fn instantiate(&self, config: ServiceConfig) -> Result<Arc<dyn UpnpService>, DeviceError> {
        let route = config.route.clone();
        let service = self.registry.create(config)?;
        if let Err(e) = service.initialize().await {
            warn!("❌ Service {} failed to initialize: {}", route, e);
            return Err(e.into());
        }
        Ok(service)
    }

    fn register_service(&self, service: Arc<dyn UpnpService>) -> Result<(), DeviceError> {
        let config = service.config();
        let route = config.route.clone();
        {
            let mut services = self.services.write();
            if services.contains_key(&route) || self.devices.read().contains_key(&route) {
                return Err(DeviceError::ServiceAlreadyExists(route));
            }
            services.insert(route.clone(), service.clone());
        }

        if config.advertise && !config.is_instance() {
            self.ssdp.add_service(&self.udn, &config.urn());
        }
        debug!("Service {} mounted under {}/{}", config.urn(), self.base_path, route);
        Ok(())
    }

    /// Crée une nouvelle instance du service `base` sous la route
    /// `{route}_id_{n}`, `n` étant le plus petit entier libre à partir de 1.
    ///
    /// L'instance n'est jamais annoncée par SSDP ni listée dans la
    /// description. Elle est retirée si son initialisation échoue.
    pub async fn add_service_instance(
        &self,
        base: &Arc<dyn UpnpService>,
    ) -> Result<Arc<dyn UpnpService>, DeviceError> {
        let base_config = base.config();
        let service = {
            let mut services = self.services.write();
            let mut n = 1;
            while services.contains_key(&instance_route(&base_config.route, n)) {
                n += 1;
            }
            let config = base_config.instance(n);
            let route = config.route.clone();
            let service = self.registry.create(config)?;
            services.insert(route, service.clone());
            service
        };

        let route = service.config().route.clone();
        if let Err(e) = service.initialize().await {
            warn!("❌ Service instance {} failed to initialize: {}", route, e);
            self.services.write().shift_remove(&route);
            service.release();
            return Err(e.into());
        }

        info!("✅ Service instance {}/{} created", self.base_path, route);
        Ok(service)
    }

    /// Retire une instance créée par [`Device::add_service_instance`].
    ///
    /// Le service est libéré par [`UpnpService::release`].
    ///
    /// Retourne `false` si le service n'est pas une instance ou n'est plus monté.
    pub fn remove_service_instance(&self, instance: &Arc<dyn UpnpService>) -> bool {
        let config = instance.config();
        if !config.is_instance() {
            return false;
        }
        let removed = self.services.write().shift_remove(&config.route).is_some();
        if removed {
            instance.release();
            info!("👋 Service instance {}/{} removed", self.base_path, config.route);
        }
        removed
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// URN du type de device.
    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    /// UDN, toujours préfixé par `uuid:`.
    pub fn udn(&self) -> &str {
        &self.udn
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Chemin HTTP de la description racine annoncée par SSDP.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Valeur de l'en-tête `SERVER`.
    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn ssdp(&self) -> &Arc<SsdpServer> {
        &self.ssdp
    }

    pub fn service(&self, route: &str) -> Option<Arc<dyn UpnpService>> {
        self.services.read().get(route).cloned()
    }

    /// Premier service dont le `classPrefix` correspond.
    pub fn service_by_class(&self, class_prefix: &str) -> Option<Arc<dyn UpnpService>> {
        self.services
            .read()
            .values()
            .find(|s| s.config().class_prefix == class_prefix && !s.config().is_instance())
            .cloned()
    }

    pub fn services(&self) -> Vec<Arc<dyn UpnpService>> {
        self.services.read().values().cloned().collect()
    }

    pub fn device(&self, route: &str) -> Option<Arc<Device>> {
        self.devices.read().get(route).cloned()
    }

    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.devices.read().values().cloned().collect()
    }
}
