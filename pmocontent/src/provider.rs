//! Contrat commun des fournisseurs de contenu

use std::pin::Pin;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::io::AsyncWrite;

use crate::address::ContentAddress;
use crate::error::{ContentError, Result};
use crate::hash::{HASH_PREFIX_LIMIT, hash_stream};
use crate::range::{ReadRange, ReadSession};
use crate::stat::ContentStat;

/// Flux d'octets d'une lecture
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Destination d'une écriture
pub type ByteSink = Pin<Box<dyn AsyncWrite + Send>>;

/// Options d'écriture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Ajouter à la fin au lieu de tronquer
    pub append: bool,
    /// Créer les dossiers parents manquants
    pub create_parents: bool,
}

/// Backend de stockage adressé par [`ContentAddress`].
///
/// `read_content`, `read_content_to_string` et `compute_hash` ont une
/// implémentation par défaut construite sur `create_read_stream`.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Nom du fournisseur, premier composant de ses adresses
    fn name(&self) -> &str;

    /// Adresse de la racine du fournisseur
    fn root(&self) -> ContentAddress;

    async fn readdir(&self, address: &ContentAddress) -> Result<Vec<ContentAddress>>;

    async fn stat(&self, address: &ContentAddress) -> Result<ContentStat>;

    async fn create_read_stream(
        &self,
        session: &ReadSession,
        address: &ContentAddress,
        range: Option<ReadRange>,
    ) -> Result<ByteStream>;

    async fn create_write_stream(
        &self,
        address: &ContentAddress,
        options: WriteOptions,
    ) -> Result<ByteSink>;

    /// Lit toute la ressource en mémoire.
    async fn read_content(&self, address: &ContentAddress) -> Result<Bytes> {
        let mut stream = self
            .create_read_stream(&ReadSession::default(), address, None)
            .await?;
        let mut buffer = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer.freeze())
    }

    /// Lit toute la ressource et la décode en UTF-8.
    async fn read_content_to_string(&self, address: &ContentAddress) -> Result<String> {
        let bytes = self.read_content(address).await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            ContentError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    /// Empreinte du contenu (voir [`crate::hash`]).
    async fn compute_hash(&self, address: &ContentAddress, stat: &ContentStat) -> Result<String> {
        if stat.is_directory {
            return Err(ContentError::Unsupported(format!(
                "cannot hash directory {}",
                address
            )));
        }

        let range = (stat.size > 0)
            .then(|| ReadRange::new(0, Some(stat.size.min(HASH_PREFIX_LIMIT) - 1)));
        let stream = self
            .create_read_stream(&ReadSession::default(), address, range)
            .await?;
        hash_stream(stream, stat.size).await
    }
}
