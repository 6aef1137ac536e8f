//! # Module SSDP - Simple Service Discovery Protocol
//!
//! Ce module implémente la partie « device » de SSDP pour UPnP : annonces
//! NOTIFY multicast et réponses unicast aux M-SEARCH, sur une machine pouvant
//! avoir plusieurs interfaces réseau.
//!
//! ## Fonctionnalités
//!
//! - ✅ Registre des identités annoncées (uuid → bindings NT/USN)
//! - ✅ NOTIFY alive/byebye émis sur chaque interface, avec un `LOCATION`
//!   construit à partir de l'adresse de l'interface
//! - ✅ En-têtes UPnP 1.1 (`BOOTID.UPNP.ORG`, `CONFIGID.UPNP.ORG`,
//!   `SEARCHPORT.UPNP.ORG`, `OPT`/`01-NLS`) selon la version configurée
//! - ✅ Réponse aux M-SEARCH depuis l'interface la plus proche du demandeur
//! - ✅ Annonces périodiques (max-age / 2) et byebye à l'arrêt
//!
//! ## Architecture
//!
//! - [`SsdpServer`] : registre, annonces, réponses, tâches d'écoute
//! - [`SsdpTransport`] : envoi d'un datagramme depuis une interface donnée
//!   ([`UdpTransport`] en production, [`MemoryTransport`] pour les tests)
//!
//! ## Constantes SSDP
//!
//! - **Multicast Address**: 239.255.255.250:1900
//! - **Max-Age**: 1800 secondes par défaut

mod errors;
mod messages;
mod registry;
mod server;
mod transport;

use std::net::Ipv4Addr;

pub use errors::SsdpError;
pub use messages::{SearchRequest, parse_search};
pub use registry::SsdpEntry;
pub use server::{SsdpOptions, SsdpServer};
pub use transport::{MemoryTransport, SentDatagram, SsdpTransport, UdpTransport};

/// Adresse multicast SSDP
pub const SSDP_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// Port SSDP
pub const SSDP_PORT: u16 = 1900;

/// Durée de validité des annonces (en secondes)
pub const DEFAULT_MAX_AGE: u32 = 1800;

/// Cible de recherche désignant toutes les identités
pub const SSDP_ALL: &str = "ssdp:all";

/// Type de notification du device racine
pub const ROOT_DEVICE: &str = "upnp:rootdevice";
