//! Module MediaServer UPnP.
//!
//! Un MediaServer expose une bibliothèque de contenu à des clients UPnP.
//!
//! # Architecture
//!
//! - [`MediaLibrary`] : fournisseurs de contenu (partages locaux, stockage
//!   distant) et registre des objets publiés
//! - **ContentDirectory** : variables de mise à jour et diffusion des objets
//! - **ConnectionManager** : protocoles supportés
//!
//! # Device UPnP
//!
//! - Type : `urn:schemas-upnp-org:device:MediaServer:1`
//! - Services : ContentDirectory:1, ConnectionManager:1
//!
//! # Utilisation
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pmoconfig::get_config;
//! use pmomediaserver::{MediaLibrary, media_server_config, register_media_services};
//! use pmoupnp::devices::Device;
//! use pmoupnp::ssdp::SsdpServer;
//! use pmoupnp::{ServiceRegistry, UpnpConfigExt};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = get_config();
//! let library = Arc::new(MediaLibrary::from_config(&config)?);
//!
//! let registry = Arc::new(ServiceRegistry::new());
//! register_media_services(&registry, library);
//!
//! let ssdp = Arc::new(SsdpServer::with_udp(config.ssdp_interfaces(), config.ssdp_options()));
//! let device = Device::new_root(media_server_config(&config, "main")?, ssdp, registry)?;
//! device.add_configured_services().await?;
//! # Ok(())
//! # }
//! ```

pub mod connectionmanager;
pub mod contentdirectory;
pub mod device;
pub mod errors;
pub mod library;

pub use connectionmanager::ConnectionManager;
pub use contentdirectory::ContentDirectory;
pub use device::{MEDIA_SERVER_TYPE, media_server_config, register_media_services};
pub use errors::LibraryError;
pub use library::{CONTAINER_UPDATED, DEFAULT_PUBLISH_DEPTH, MediaLibrary, ROOT_OBJECT_ID};
