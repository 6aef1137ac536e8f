use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::address::ContentAddress;
use crate::error::{ContentError, Result};
use crate::provider::ContentProvider;

/// Fournisseurs indexés par nom, pour résoudre une [`ContentAddress`].
#[derive(Default, Clone)]
pub struct ContentProviders {
    providers: Arc<RwLock<HashMap<String, Arc<dyn ContentProvider>>>>,
}

impl ContentProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre (ou remplace) un fournisseur sous son nom.
    pub fn register(&self, provider: Arc<dyn ContentProvider>) {
        let name = provider.name().to_string();
        info!("✅ Content provider '{}' registered", name);
        self.providers.write().insert(name, provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ContentProvider>> {
        self.providers.read().get(name).cloned()
    }

    /// Fournisseur responsable de `address`.
    pub fn resolve(&self, address: &ContentAddress) -> Result<Arc<dyn ContentProvider>> {
        self.get(address.provider())
            .ok_or_else(|| ContentError::UnknownProvider(address.provider().to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

impl std::fmt::Debug for ContentProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentProviders")
            .field("providers", &self.names())
            .finish()
    }
}
