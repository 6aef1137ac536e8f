//! # pmoupnp - Pile UPnP pour PMOMedia
//!
//! Cette crate regroupe les briques protocolaires d'un serveur média UPnP/DLNA :
//!
//! - [`events`] : bus d'événements asynchrone, ordonné par priorité
//! - [`state_variables`] : variables d'état observables avec modération des notifications
//! - [`ssdp`] : moteur SSDP multi-interfaces (annonces, réponses aux M-SEARCH)
//! - [`services`] : contrat des implémentations de services et registre par `classPrefix`
//! - [`devices`] : arbre de composition device → services / devices embarqués,
//!   routage HTTP et description XML
//!
//! ## Flux
//!
//! ```text
//! Device (racine) ──► SsdpServer (add_root / add_service)
//!     │
//!     ├── services[route] ──► ServiceState ──► StateVar::set ──► AsyncEventBus("propertyChange")
//!     └── devices[route]  (embarqués)
//! ```

pub mod config_ext;
pub mod devices;
pub mod events;
pub mod services;
pub mod ssdp;
pub mod state_variables;
pub mod upnp_server;

mod xml;

pub use crate::config_ext::UpnpConfigExt;
pub use crate::devices::{Device, DeviceConfig, DeviceError, IconConfig, server_string};
pub use crate::events::{AsyncEventBus, EventBusError, ListenerEvent, ListenerId};
pub use crate::services::{ServiceConfig, ServiceError, ServiceRegistry, UpnpService};
pub use crate::ssdp::{SsdpOptions, SsdpServer};
pub use crate::state_variables::{
    NotifyPolicy, PropertySet, ServiceState, StateValue, StateVar, StateVarType,
    StateVariableError,
};
pub use crate::upnp_server::UpnpServerExt;
