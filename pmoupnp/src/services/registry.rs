use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{ServiceConfig, ServiceError, UpnpService};

/// Fabrique d'une implémentation de service à partir de sa configuration.
pub type ServiceFactory =
    Arc<dyn Fn(ServiceConfig) -> Result<Arc<dyn UpnpService>, ServiceError> + Send + Sync>;

/// Implémentations de services indexées par `classPrefix`.
#[derive(Default)]
pub struct ServiceRegistry {
    factories: RwLock<HashMap<String, ServiceFactory>>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let factories = self.factories.read();
        let mut classes: Vec<&String> = factories.keys().collect();
        classes.sort();
        f.debug_struct("ServiceRegistry")
            .field("classes", &classes)
            .finish()
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre (ou remplace) la fabrique associée à `class_prefix`.
    pub fn register<F>(&self, class_prefix: impl Into<String>, factory: F)
    where
        F: Fn(ServiceConfig) -> Result<Arc<dyn UpnpService>, ServiceError> + Send + Sync + 'static,
    {
        let class_prefix = class_prefix.into();
        debug!("Service class '{}' registered", class_prefix);
        self.factories
            .write()
            .insert(class_prefix, Arc::new(factory));
    }

    pub fn contains(&self, class_prefix: &str) -> bool {
        self.factories.read().contains_key(class_prefix)
    }

    /// Instancie le service décrit par `config` (non initialisé).
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnknownClass`] si aucune fabrique ne correspond.
    pub fn create(&self, config: ServiceConfig) -> Result<Arc<dyn UpnpService>, ServiceError> {
        let factory = self
            .factories
            .read()
            .get(&config.class_prefix)
            .cloned()
            .ok_or_else(|| ServiceError::UnknownClass(config.class_prefix.clone()))?;
        factory(config)
    }
}
