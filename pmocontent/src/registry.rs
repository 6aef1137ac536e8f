//! Registre des nœuds publiés
//!
//! Un nœud associe un identifiant d'objet (celui que voient les clients UPnP)
//! à une [`ContentAddress`]. Le registre est un collaborateur interchangeable :
//! [`MemoryNodeRegistry`] en mémoire, ou tout stockage externe implémentant
//! [`NodeRegistry`].

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::address::ContentAddress;
use crate::error::Result;

/// Objet publié dans l'arborescence de contenu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub title: String,
    pub address: ContentAddress,
    pub is_container: bool,
}

impl ContentNode {
    pub fn new(
        id: impl Into<String>,
        parent_id: Option<String>,
        title: impl Into<String>,
        address: ContentAddress,
        is_container: bool,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id,
            title: title.into(),
            address,
            is_container,
        }
    }
}

#[async_trait]
pub trait NodeRegistry: Send + Sync {
    /// Enregistre ou remplace le nœud `node.id`.
    async fn register_node(&self, node: ContentNode) -> Result<()>;

    async fn get_node_by_id(&self, id: &str) -> Result<Option<ContentNode>>;

    /// Retourne `true` si le nœud existait.
    async fn remove_node_by_id(&self, id: &str) -> Result<bool>;

    async fn children(&self, parent_id: &str) -> Result<Vec<ContentNode>>;
}

/// Registre en mémoire, ordre d'insertion conservé.
#[derive(Debug, Default)]
pub struct MemoryNodeRegistry {
    nodes: RwLock<IndexMap<String, ContentNode>>,
}

impl MemoryNodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}

#[async_trait]
impl NodeRegistry for MemoryNodeRegistry {
    async fn register_node(&self, node: ContentNode) -> Result<()> {
        self.nodes.write().insert(node.id.clone(), node);
        Ok(())
    }

    async fn get_node_by_id(&self, id: &str) -> Result<Option<ContentNode>> {
        Ok(self.nodes.read().get(id).cloned())
    }

    async fn remove_node_by_id(&self, id: &str) -> Result<bool> {
        Ok(self.nodes.write().shift_remove(id).is_some())
    }

    async fn children(&self, parent_id: &str) -> Result<Vec<ContentNode>> {
        Ok(self
            .nodes
            .read()
            .values()
            .filter(|n| n.parent_id.as_deref() == Some(parent_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_registry() {
        let registry = MemoryNodeRegistry::new();
        let root = ContentAddress::new("file", "/");
        registry
            .register_node(ContentNode::new("1", Some("0".into()), "Music", root.clone(), true))
            .await
            .unwrap();
        registry
            .register_node(ContentNode::new(
                "2",
                Some("1".into()),
                "a.flac",
                root.with_path("/a.flac"),
                false,
            ))
            .await
            .unwrap();

        assert_eq!(registry.children("1").await.unwrap().len(), 1);
        assert_eq!(
            registry.get_node_by_id("2").await.unwrap().unwrap().title,
            "a.flac"
        );
        assert!(registry.remove_node_by_id("2").await.unwrap());
        assert!(!registry.remove_node_by_id("2").await.unwrap());
        assert!(registry.get_node_by_id("2").await.unwrap().is_none());
    }
}
