//! # ContentDirectory Service
//!
//! Service ContentDirectory:1 du MediaServer.
//!
//! ## Variables d'état
//!
//! - `SystemUpdateID` : compteur global des modifications, modéré (2 s)
//! - `ContainerUpdateIDs` : `id,updateId` du dernier conteneur modifié,
//!   modéré (2 s), notifié avec `SystemUpdateID`
//! - `TransferIDs` : transferts en cours
//!
//! ## Routes
//!
//! ```text
//! scpd.xml              description du service
//! content/<objectId>    flux de l'objet (Range accepté)
//! ```
//!
//! ## Paramètres
//!
//! - `publish_depth` : profondeur de l'arborescence publiée à l'initialisation
//!   (défaut [`DEFAULT_PUBLISH_DEPTH`])
//!
//! Le contrôle SOAP (`Browse`, `Search`...) n'est pas servi ici.

mod streaming;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use parking_lot::Mutex;
use pmoupnp::services::serve_scpd;
use pmoupnp::state_variables::{ServiceState, StateVar, StateVarType};
use pmoupnp::{ListenerId, ServiceConfig, ServiceError, UpnpService};
use tracing::{debug, info};

use crate::library::{CONTAINER_UPDATED, DEFAULT_PUBLISH_DEPTH, MediaLibrary};

pub use streaming::stream_object;

pub const CONTENT_DIRECTORY: &str = "ContentDirectory";

/// Préfixe des URLs de diffusion sous la route du service
pub const CONTENT_PATH: &str = "content";

/// Fenêtre de modération des variables de mise à jour
pub const UPDATE_MODERATION: Duration = Duration::from_secs(2);

pub struct ContentDirectory {
    config: ServiceConfig,
    state: Arc<ServiceState>,
    library: Arc<MediaLibrary>,
    system_update_id: Arc<StateVar>,
    container_update_ids: Arc<StateVar>,
    update_counter: Arc<AtomicU32>,
    listener: Mutex<Option<ListenerId>>,
}

/// Configuration par défaut du service dans un device.
pub fn content_directory_config() -> ServiceConfig {
    ServiceConfig::new(CONTENT_DIRECTORY, CONTENT_DIRECTORY, 1)
}

impl ContentDirectory {
    pub fn new(config: ServiceConfig, library: Arc<MediaLibrary>) -> Self {
        let state = ServiceState::new();

        let system_update_id = state.add_variable(
            StateVar::new("SystemUpdateID", StateVarType::UI4).moderated(UPDATE_MODERATION),
        );
        let container_update_ids = state.add_variable(
            StateVar::new("ContainerUpdateIDs", StateVarType::String)
                .moderated(UPDATE_MODERATION)
                .with_additional_property("SystemUpdateID"),
        );
        state.add_variable(StateVar::new("TransferIDs", StateVarType::String).evented());

        for name in [
            "A_ARG_TYPE_ObjectID",
            "A_ARG_TYPE_Result",
            "A_ARG_TYPE_BrowseFlag",
            "A_ARG_TYPE_Filter",
            "A_ARG_TYPE_SortCriteria",
            "SearchCapabilities",
            "SortCapabilities",
        ] {
            state.add_variable(StateVar::new(name, StateVarType::String));
        }
        for name in ["A_ARG_TYPE_Index", "A_ARG_TYPE_Count", "A_ARG_TYPE_UpdateID"] {
            state.add_variable(StateVar::new(name, StateVarType::UI4));
        }

        Self {
            config,
            state,
            library,
            system_update_id,
            container_update_ids,
            update_counter: Arc::new(AtomicU32::new(0)),
            listener: Mutex::new(None),
        }
    }

    pub fn library(&self) -> &Arc<MediaLibrary> {
        &self.library
    }

    pub fn system_update_id(&self) -> u32 {
        self.update_counter.load(Ordering::SeqCst)
    }

    fn publish_depth(&self) -> usize {
        self.config
            .params
            .get("publish_depth")
            .and_then(|depth| depth.parse().ok())
            .unwrap_or(DEFAULT_PUBLISH_DEPTH)
    }

    /// Incrémente `SystemUpdateID` et signale `container_id` comme modifié.
    pub async fn content_changed(&self, container_id: &str) -> Result<u32, ServiceError> {
        content_changed(
            &self.update_counter,
            &self.system_update_id,
            &self.container_update_ids,
            container_id,
        )
        .await
    }
}

async fn content_changed(
    counter: &AtomicU32,
    system_update_id: &StateVar,
    container_update_ids: &StateVar,
    container_id: &str,
) -> Result<u32, ServiceError> {
    let update_id = counter.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
    system_update_id.set(update_id).await?;
    container_update_ids
        .set(format!("{},{}", container_id, update_id))
        .await?;
    debug!("Container {} updated (SystemUpdateID {})", container_id, update_id);
    Ok(update_id)
}

#[async_trait]
impl UpnpService for ContentDirectory {
    fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn state(&self) -> &Arc<ServiceState> {
        &self.state
    }

    /// S'abonne aux modifications de la bibliothèque puis s'assure qu'elle
    /// est publiée. Une instance réutilise la publication existante.
    async fn initialize(&self) -> Result<(), ServiceError> {
        let counter = self.update_counter.clone();
        let system_update_id = self.system_update_id.clone();
        let container_update_ids = self.container_update_ids.clone();
        let listener = self
            .library
            .events()
            .on(CONTAINER_UPDATED, move |container_id: String| {
                let counter = counter.clone();
                let system_update_id = system_update_id.clone();
                let container_update_ids = container_update_ids.clone();
                async move {
                    content_changed(
                        &counter,
                        &system_update_id,
                        &container_update_ids,
                        &container_id,
                    )
                    .await?;
                    Ok(())
                }
            });
        if let Some(previous) = self.listener.lock().replace(listener) {
            self.library.events().remove_listener(CONTAINER_UPDATED, previous);
        }

        let published = self
            .library
            .ensure_published(self.publish_depth())
            .await
            .map_err(|e| ServiceError::Initialization {
                route: self.config.route.clone(),
                message: e.to_string(),
            })?;
        info!(
            "✅ ContentDirectory {} ready ({} objects)",
            self.config.route, published
        );
        Ok(())
    }

    fn release(&self) {
        if let Some(listener) = self.listener.lock().take() {
            self.library.events().remove_listener(CONTAINER_UPDATED, listener);
            debug!("ContentDirectory {} unsubscribed", self.config.route);
        }
    }

    async fn process_request(
        &self,
        request: Request,
        path: &str,
    ) -> Result<Option<Response>, ServiceError> {
        if let Some(object_id) = path
            .strip_prefix(CONTENT_PATH)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            return stream_object(&self.library, request, object_id).await;
        }
        Ok(serve_scpd(&self.state, path))
    }
}
