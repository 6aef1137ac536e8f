//! Définition du device MediaServer.

use std::sync::Arc;

use anyhow::Result;
use pmoconfig::Config;
use pmoupnp::devices::DeviceConfig;
use pmoupnp::{ServiceConfig, ServiceRegistry, UpnpConfigExt, UpnpService};

use crate::connectionmanager::{CONNECTION_MANAGER, ConnectionManager, connection_manager_config};
use crate::contentdirectory::{CONTENT_DIRECTORY, ContentDirectory, content_directory_config};
use crate::library::MediaLibrary;

pub const MEDIA_SERVER_TYPE: &str = "MediaServer";

/// Configuration du device MediaServer:1
///
/// Identité et UDN proviennent de la configuration ; ContentDirectory et
/// ConnectionManager sont exigés.
pub fn media_server_config(config: &Config, name: &str) -> Result<DeviceConfig> {
    let mut device = config
        .device_config(MEDIA_SERVER_TYPE, name)?
        .with_service(content_directory_config())
        .with_service(connection_manager_config())
        .require_service(CONTENT_DIRECTORY)
        .require_service(CONNECTION_MANAGER);
    device.model_description = Some("UPnP AV MediaServer".to_string());
    device.model_number = Some(env!("CARGO_PKG_VERSION").to_string());
    Ok(device)
}

/// Enregistre les implémentations ContentDirectory et ConnectionManager.
pub fn register_media_services(registry: &ServiceRegistry, library: Arc<MediaLibrary>) {
    registry.register(CONTENT_DIRECTORY, move |config: ServiceConfig| {
        Ok(Arc::new(ContentDirectory::new(config, library.clone())) as Arc<dyn UpnpService>)
    });
    registry.register(CONNECTION_MANAGER, |config: ServiceConfig| {
        Ok(Arc::new(ConnectionManager::new(config)?) as Arc<dyn UpnpService>)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_server_config() {
        let config = Config::in_memory("upnp:\n  friendly_name: Salon\n").unwrap();
        let device = media_server_config(&config, "test").unwrap();

        assert_eq!(device.urn(), "urn:schemas-upnp-org:device:MediaServer:1");
        assert_eq!(device.friendly_name, "Salon");
        assert!(device.services.contains_key(CONTENT_DIRECTORY));
        assert!(device.services.contains_key(CONNECTION_MANAGER));
        assert_eq!(device.required_services.len(), 2);
    }
}
