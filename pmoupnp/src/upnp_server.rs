//! Extension UPnP pour pmoserver.
//!
//! `pmoserver::Server` reste agnostique d'UPnP ; le trait [`UpnpServerExt`]
//! y monte l'arbre d'un device racine.

use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::routing::any;
use pmoserver::Server;
use tracing::info;

use crate::devices::Device;

/// Router qui délègue toute requête sous le chemin du device à
/// [`Device::handle_http`].
pub fn device_router(device: Arc<Device>) -> Router {
    let base = device_base(&device);
    let base_root = if base.is_empty() { "/".to_string() } else { base.clone() };

    let handler = move |request: Request| {
        let device = device.clone();
        async move { device.handle_http(request).await }
    };

    Router::new()
        .route(&base_root, any(handler.clone()))
        .route(&format!("{}/{{*path}}", base), any(handler))
}

fn device_base(device: &Device) -> String {
    device.base_path().trim_end_matches('/').to_string()
}

pub trait UpnpServerExt {
    /// Monte un device racine et tout son arbre sur le serveur HTTP.
    async fn register_device(&mut self, device: Arc<Device>);
}

impl UpnpServerExt for Server {
    async fn register_device(&mut self, device: Arc<Device>) {
        info!(
            "📡 Device {} mounted at {}/",
            device.udn(),
            device.base_path()
        );
        self.add_router("/", device_router(device)).await;
    }
}
