//! # Devices UPnP
//!
//! Un [`Device`] est un nœud de l'arbre de composition : il possède des
//! services (indexés par route) et des devices embarqués. Le device racine
//! s'enregistre auprès du [`SsdpServer`](crate::ssdp::SsdpServer) à sa
//! création ; chaque service annoncé y ajoute son type.
//!
//! ## Routes HTTP
//!
//! ```text
//! {base}/                       page HTML
//! {base}/description.xml        description (racine + embarqués)
//! {base}/icons/{fichier}        icônes
//! {base}/{route service}/…      délégué au service
//! {base}/{route device}/…       délégué au device embarqué
//! ```

mod config;
mod device;
mod errors;
mod http;

pub use config::{DeviceConfig, IconConfig};
pub use device::{DESCRIPTION_PATH, Device, SERVICE_INIT_CONCURRENCY};
pub use errors::DeviceError;

/// Valeur de l'en-tête `SERVER` :
/// `<os>/<version> UPnP/1.<v> PMOMedia/<version> [DLNADOC/1.50]`.
pub fn server_string(upnp_version: u32, dlna: bool) -> String {
    let mut server = format!(
        "{} UPnP/1.{} PMOMedia/{}",
        pmoutils::get_os_string(),
        upnp_version,
        env!("CARGO_PKG_VERSION")
    );
    if dlna {
        server.push_str(" DLNADOC/1.50");
    }
    server
}
