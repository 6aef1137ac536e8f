//! Bibliothèque publiée par le MediaServer
//!
//! La bibliothèque associe les fournisseurs de contenu au registre de nœuds :
//! l'objet `0` est la racine, chaque fournisseur y publie son dossier racine,
//! et `publish_children` matérialise le contenu d'un dossier à la demande.
//!
//! [`MediaLibrary::ensure_published`] publie une seule fois l'arborescence
//! complète des fournisseurs, quel que soit le nombre de services qui
//! l'exploitent.
//!
//! Chaque publication émet [`CONTAINER_UPDATED`] avec l'identifiant du
//! conteneur modifié ; le ContentDirectory s'y abonne pour faire évoluer
//! `SystemUpdateID` et `ContainerUpdateIDs`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use pmocloud::CloudConfigExt;
use pmoconfig::Config;
use pmocontent::{
    ContentAddress, ContentConfigExt, ContentNode, ContentProviders, FileContentProvider,
    MemoryNodeRegistry, NodeRegistry,
};
use pmoupnp::AsyncEventBus;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::errors::LibraryError;

/// Identifiant de l'objet racine
pub const ROOT_OBJECT_ID: &str = "0";

/// Événement émis après la modification d'un conteneur
pub const CONTAINER_UPDATED: &str = "containerUpdated";

/// Profondeur de publication par défaut
pub const DEFAULT_PUBLISH_DEPTH: usize = 16;

const ROOT_PROVIDER: &str = "library";

pub struct MediaLibrary {
    providers: ContentProviders,
    nodes: Arc<dyn NodeRegistry>,
    events: AsyncEventBus<String>,
    next_id: AtomicU64,
    published: OnceCell<usize>,
}

impl std::fmt::Debug for MediaLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaLibrary")
            .field("providers", &self.providers.names())
            .finish()
    }
}

impl MediaLibrary {
    pub fn new(providers: ContentProviders, nodes: Arc<dyn NodeRegistry>) -> Self {
        Self {
            providers,
            nodes,
            events: AsyncEventBus::new(),
            next_id: AtomicU64::new(1),
            published: OnceCell::new(),
        }
    }

    /// Bibliothèque construite depuis la configuration : un fournisseur
    /// `file` par partage, plus le stockage distant s'il est activé.
    ///
    /// # Errors
    ///
    /// Retourne une erreur si le stockage distant est activé sans
    /// identifiants.
    pub fn from_config(config: &Config) -> Result<Self> {
        let providers = ContentProviders::new();

        for share in config.get_content_shares() {
            info!("📁 Sharing {} as '{}'", share.path.display(), share.name);
            providers.register(Arc::new(FileContentProvider::with_name(
                share.name, share.path,
            )));
        }

        if let Some(cloud) = config.cloud_provider()? {
            providers.register(Arc::new(cloud));
        }

        Ok(Self::new(providers, Arc::new(MemoryNodeRegistry::new())))
    }

    pub fn providers(&self) -> &ContentProviders {
        &self.providers
    }

    pub fn nodes(&self) -> &Arc<dyn NodeRegistry> {
        &self.nodes
    }

    pub fn events(&self) -> &AsyncEventBus<String> {
        &self.events
    }

    fn next_object_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    /// Publie la racine `0` et le dossier racine de chaque fournisseur.
    pub async fn publish_providers(&self) -> Result<Vec<ContentNode>, LibraryError> {
        let root = ContentNode::new(
            ROOT_OBJECT_ID,
            None,
            "Root",
            ContentAddress::new(ROOT_PROVIDER, ""),
            true,
        );
        self.nodes.register_node(root).await?;
        self.clear_children(ROOT_OBJECT_ID).await?;

        let mut published = Vec::new();
        for name in self.providers.names() {
            let Some(provider) = self.providers.get(&name) else {
                continue;
            };
            let node = ContentNode::new(
                self.next_object_id(),
                Some(ROOT_OBJECT_ID.to_string()),
                name,
                provider.root(),
                true,
            );
            self.nodes.register_node(node.clone()).await?;
            published.push(node);
        }

        info!("✅ {} content providers published", published.len());
        self.events
            .emit(CONTAINER_UPDATED, ROOT_OBJECT_ID.to_string())
            .await?;
        Ok(published)
    }

    /// Relit le dossier du conteneur `container_id` et publie ses enfants,
    /// en remplaçant ceux déjà publiés.
    pub async fn publish_children(
        &self,
        container_id: &str,
    ) -> Result<Vec<ContentNode>, LibraryError> {
        let node = self
            .nodes
            .get_node_by_id(container_id)
            .await?
            .ok_or_else(|| LibraryError::UnknownObject(container_id.to_string()))?;
        if !node.is_container || container_id == ROOT_OBJECT_ID {
            return Err(LibraryError::NotAContainer(container_id.to_string()));
        }

        let provider = self.providers.resolve(&node.address)?;
        let addresses = provider.readdir(&node.address).await?;

        self.clear_children(container_id).await?;
        let mut published = Vec::with_capacity(addresses.len());
        for address in addresses {
            let stat = provider.stat(&address).await?;
            let child = ContentNode::new(
                self.next_object_id(),
                Some(container_id.to_string()),
                stat.name,
                address,
                stat.is_directory,
            );
            self.nodes.register_node(child.clone()).await?;
            published.push(child);
        }

        debug!("📁 {} objects published under {}", published.len(), container_id);
        self.events
            .emit(CONTAINER_UPDATED, container_id.to_string())
            .await?;
        Ok(published)
    }

    /// Publie récursivement le contenu de `container_id` sur au plus
    /// `max_depth` niveaux. Un dossier illisible est ignoré.
    ///
    /// Retourne le nombre d'objets publiés.
    pub async fn publish_tree(
        &self,
        container_id: &str,
        max_depth: usize,
    ) -> Result<usize, LibraryError> {
        let mut pending = vec![(container_id.to_string(), 0)];
        let mut count = 0;
        while let Some((id, depth)) = pending.pop() {
            if depth >= max_depth {
                continue;
            }
            match self.publish_children(&id).await {
                Ok(children) => {
                    count += children.len();
                    pending.extend(
                        children
                            .into_iter()
                            .filter(|child| child.is_container)
                            .map(|child| (child.id, depth + 1)),
                    );
                }
                Err(LibraryError::Content(e)) => {
                    warn!("⚠️ Skipping container {}: {}", id, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(count)
    }

    /// Publie les fournisseurs puis leur arborescence.
    pub async fn publish_library(&self, max_depth: usize) -> Result<usize, LibraryError> {
        let roots = self.publish_providers().await?;
        let mut count = roots.len();
        for root in roots {
            count += self.publish_tree(&root.id, max_depth).await?;
        }
        info!("✅ {} objects published", count);
        Ok(count)
    }

    /// Publie la bibliothèque au premier appel ; les appels suivants
    /// conservent les identifiants déjà attribués.
    pub async fn ensure_published(&self, max_depth: usize) -> Result<usize, LibraryError> {
        self.published
            .get_or_try_init(|| self.publish_library(max_depth))
            .await
            .copied()
    }

    /// Retire tous les descendants publiés de `container_id`.
    async fn clear_children(&self, container_id: &str) -> Result<(), LibraryError> {
        let mut pending = vec![container_id.to_string()];
        while let Some(parent) = pending.pop() {
            for child in self.nodes.children(&parent).await? {
                self.nodes.remove_node_by_id(&child.id).await?;
                pending.push(child.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_providers() {
        let library = MediaLibrary::new(ContentProviders::new(), Arc::new(MemoryNodeRegistry::new()));
        assert!(library.publish_providers().await.unwrap().is_empty());

        let root = library.nodes().get_node_by_id(ROOT_OBJECT_ID).await.unwrap();
        assert!(root.is_some_and(|node| node.is_container));

        assert!(matches!(
            library.publish_children("42").await,
            Err(LibraryError::UnknownObject(_))
        ));
        assert!(matches!(
            library.publish_children(ROOT_OBJECT_ID).await,
            Err(LibraryError::NotAContainer(_))
        ));
    }

    #[tokio::test]
    async fn test_library_is_published_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("album")).unwrap();
        std::fs::write(dir.path().join("album/track.flac"), b"abc").unwrap();
        std::fs::write(dir.path().join("cover.jpg"), b"img").unwrap();

        let providers = ContentProviders::new();
        providers.register(Arc::new(FileContentProvider::with_name("music", dir.path())));
        let library = MediaLibrary::new(providers, Arc::new(MemoryNodeRegistry::new()));

        // racine du partage, album, cover.jpg, track.flac
        assert_eq!(library.ensure_published(DEFAULT_PUBLISH_DEPTH).await.unwrap(), 4);
        let roots = library.nodes().children(ROOT_OBJECT_ID).await.unwrap();
        let album = library
            .nodes()
            .children(&roots[0].id)
            .await
            .unwrap()
            .into_iter()
            .find(|node| node.title == "album")
            .unwrap();
        let tracks = library.nodes().children(&album.id).await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title, "track.flac");

        library.ensure_published(DEFAULT_PUBLISH_DEPTH).await.unwrap();
        let again = library.nodes().children(ROOT_OBJECT_ID).await.unwrap();
        assert_eq!(again[0].id, roots[0].id);
        assert!(library.nodes().get_node_by_id(&tracks[0].id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_publish_depth_limit() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("album")).unwrap();
        std::fs::write(dir.path().join("album/track.flac"), b"abc").unwrap();

        let providers = ContentProviders::new();
        providers.register(Arc::new(FileContentProvider::with_name("music", dir.path())));
        let library = MediaLibrary::new(providers, Arc::new(MemoryNodeRegistry::new()));

        // racine du partage et album, sans descendre dans l'album
        assert_eq!(library.publish_library(1).await.unwrap(), 2);
    }
}
