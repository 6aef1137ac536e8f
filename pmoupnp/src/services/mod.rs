//! # Services UPnP
//!
//! Un service est une implémentation de [`UpnpService`], instanciée par le
//! [`ServiceRegistry`] à partir d'une [`ServiceConfig`]. Le device parent se
//! charge de l'initialiser, de le monter sous sa route et, sauf indication
//! contraire, de l'annoncer par SSDP.
//!
//! ## Contrat
//!
//! - `initialize` : appelée une fois avant que le service ne reçoive des requêtes
//! - `process_request` : reçoit la requête et le reste du chemin sous la
//!   route du service ; `Ok(None)` signifie « non trouvé »
//! - `describe` : fragment `<service>` de la description du device

mod config;
mod errors;
mod registry;
mod scpd;

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use xmltree::Element;

pub use config::ServiceConfig;
pub(crate) use config::instance_route;
pub use errors::ServiceError;
pub use registry::{ServiceFactory, ServiceRegistry};
pub use scpd::{SCPD_PATH, scpd_element, serve_scpd, xml_response};

use crate::state_variables::ServiceState;
use crate::xml::push_text;

#[async_trait]
pub trait UpnpService: Send + Sync {
    fn config(&self) -> &ServiceConfig;

    fn state(&self) -> &Arc<ServiceState>;

    async fn initialize(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Libère ce que le service a acquis dans `initialize`, lorsqu'il est
    /// démonté du device.
    fn release(&self) {}

    /// Traite une requête HTTP adressée au service.
    ///
    /// Par défaut, seul `scpd.xml` est servi.
    async fn process_request(
        &self,
        _request: Request,
        path: &str,
    ) -> Result<Option<Response>, ServiceError> {
        Ok(serve_scpd(self.state(), path))
    }

    /// Fragment `<service>` de la description du device.
    ///
    /// `route_prefix` est le chemin HTTP du device (vide pour la racine).
    fn describe(&self, route_prefix: &str) -> Element {
        describe_service(self.config(), route_prefix)
    }
}

/// Description standard : `SCPDURL`, `controlURL` et `eventSubURL` sous la
/// route du service.
pub fn describe_service(config: &ServiceConfig, route_prefix: &str) -> Element {
    let base = format!("{}/{}", route_prefix.trim_end_matches('/'), config.route);

    let mut elem = Element::new("service");
    push_text(&mut elem, "serviceType", config.urn());
    push_text(&mut elem, "serviceId", config.service_id());
    push_text(&mut elem, "SCPDURL", format!("{}/{}", base, SCPD_PATH));
    push_text(&mut elem, "controlURL", format!("{}/control", base));
    push_text(&mut elem, "eventSubURL", format!("{}/event", base));
    elem
}
