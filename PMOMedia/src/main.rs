use std::sync::Arc;

use pmoconfig::get_config;
use pmomediaserver::{MediaLibrary, media_server_config, register_media_services};
use pmoserver::{LoggingOptions, ServerBuilder};
use pmoupnp::devices::Device;
use pmoupnp::ssdp::SsdpServer;
use pmoupnp::{ServiceRegistry, UpnpConfigExt, UpnpServerExt};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut server = ServerBuilder::new_configured().build();
    server.init_logging(LoggingOptions::from_config());
    let config = get_config();

    // ========== PHASE 1 : Contenu ==========

    info!("📁 Loading content providers...");
    let library = Arc::new(MediaLibrary::from_config(&config)?);
    let providers = library.providers().names();
    if providers.is_empty() {
        warn!("⚠️ No content shared, add entries to content.shares");
    }
    for name in &providers {
        info!("  - {}", name);
    }

    // ========== PHASE 2 : Device UPnP ==========

    let registry = Arc::new(ServiceRegistry::new());
    register_media_services(&registry, library);

    let interfaces = config.ssdp_interfaces();
    info!("📡 SSDP on {} interface(s)", interfaces.len());
    let ssdp = Arc::new(SsdpServer::with_udp(interfaces, config.ssdp_options()));

    let device = Device::new_root(media_server_config(&config, "main")?, ssdp.clone(), registry)?;
    device.add_configured_services().await?;

    server
        .add_route("/info", || async {
            serde_json::json!({
                "name": "PMOMedia",
                "version": env!("CARGO_PKG_VERSION"),
            })
        })
        .await;
    server.register_device(device.clone()).await;

    // ========== PHASE 3 : Démarrage ==========

    info!("🌐 Starting HTTP server...");
    server.start().await?;
    ssdp.start().await?;

    info!(
        "✅ PMOMedia is ready: {} at http://{}:{}{}",
        device.config().friendly_name,
        server.info().base_url,
        server.info().http_port,
        device.location()
    );
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    ssdp.stop().await;
    info!("👋 PMOMedia stopped");
    Ok(())
}
