//! Extension de `pmoconfig::Config` pour le stockage distant

use std::time::Duration;

use anyhow::{Result, anyhow};
use pmoconfig::Config;

use crate::config::{
    CloudConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_CONCURRENCY, DEFAULT_MAX_REDIRECTS,
    DEFAULT_PROVIDER_NAME,
};
use crate::provider::CloudProvider;

/// Trait d'extension pour la section `cloud`
///
/// ```yaml
/// cloud:
///   enabled: true
///   base_url: https://storage.example.com/api
///   token: "..."
///   concurrency: 2
///   cache: { capacity: 10000, ttl_secs: 600 }
///   max_redirects: 8
/// ```
pub trait CloudConfigExt {
    fn get_cloud_enabled(&self) -> bool;

    /// Paramètres du fournisseur, `None` s'il est désactivé
    ///
    /// # Errors
    ///
    /// Retourne une erreur si le fournisseur est activé sans URL ni jeton
    fn get_cloud_config(&self) -> Result<Option<CloudConfig>>;

    /// Construit le fournisseur configuré
    fn cloud_provider(&self) -> Result<Option<CloudProvider>>;
}

impl CloudConfigExt for Config {
    fn get_cloud_enabled(&self) -> bool {
        self.get_bool(&["cloud", "enabled"], false)
    }

    fn get_cloud_config(&self) -> Result<Option<CloudConfig>> {
        if !self.get_cloud_enabled() {
            return Ok(None);
        }

        let base_url = self.get_string(&["cloud", "base_url"], "");
        let token = self.get_string(&["cloud", "token"], "");
        if base_url.is_empty() || token.is_empty() {
            return Err(anyhow!(
                "cloud provider enabled but cloud.base_url or cloud.token is missing"
            ));
        }

        let mut config = CloudConfig::new(base_url, token)
            .with_name(self.get_string(&["cloud", "name"], DEFAULT_PROVIDER_NAME))
            .with_concurrency(
                self.get_u64(&["cloud", "concurrency"], DEFAULT_CONCURRENCY as u64) as usize,
            )
            .with_max_redirects(
                self.get_u64(&["cloud", "max_redirects"], DEFAULT_MAX_REDIRECTS as u64) as usize,
            );
        config.cache_capacity = self.get_u64(&["cloud", "cache", "capacity"], DEFAULT_CACHE_CAPACITY);
        config.cache_ttl = Duration::from_secs(
            self.get_u64(&["cloud", "cache", "ttl_secs"], config.cache_ttl.as_secs()),
        );
        Ok(Some(config))
    }

    fn cloud_provider(&self) -> Result<Option<CloudProvider>> {
        match self.get_cloud_config()? {
            Some(config) => Ok(Some(CloudProvider::new(config)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_by_default() {
        let config = Config::in_memory("").unwrap();
        assert!(!config.get_cloud_enabled());
        assert!(config.get_cloud_config().unwrap().is_none());
    }

    #[test]
    fn test_enabled_without_token_fails() {
        let config =
            Config::in_memory("cloud:\n  enabled: true\n  base_url: http://localhost\n").unwrap();
        assert!(config.get_cloud_config().is_err());
    }

    #[test]
    fn test_enabled_config() {
        let config = Config::in_memory(
            "cloud:\n  enabled: true\n  name: drive\n  base_url: http://localhost/\n  token: secret\n  concurrency: 4\n  cache:\n    ttl_secs: 60\n",
        )
        .unwrap();

        let cloud = config.get_cloud_config().unwrap().unwrap();
        assert_eq!(cloud.name, "drive");
        assert_eq!(cloud.base_url, "http://localhost");
        assert_eq!(cloud.concurrency, 4);
        assert_eq!(cloud.cache_capacity, 10_000);
        assert_eq!(cloud.cache_ttl, Duration::from_secs(60));
        assert_eq!(cloud.max_redirects, 8);
    }
}
