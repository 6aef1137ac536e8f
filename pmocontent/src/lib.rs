//! # pmocontent - Adressage et fournisseurs de contenu
//!
//! Toute ressource servie par PMOMedia est désignée par une
//! [`ContentAddress`] `fournisseur:chemin` et lue à travers un
//! [`ContentProvider`].
//!
//! - [`ContentProvider`] : `readdir`, `stat`, lecture par flux (avec
//!   intervalle), écriture, lecture complète et empreinte
//! - [`FileContentProvider`] : dossiers locaux
//! - [`ContentProviders`] : résolution d'une adresse vers son fournisseur
//! - [`NodeRegistry`] : identifiants d'objets publiés → adresses
//!
//! ## Exemple
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pmocontent::{ContentProvider, ContentProviders, FileContentProvider};
//!
//! # async fn example() -> pmocontent::Result<()> {
//! let providers = ContentProviders::new();
//! providers.register(Arc::new(FileContentProvider::new("/srv/music")));
//!
//! let address = "file:/album/01.flac".parse()?;
//! let provider = providers.resolve(&address)?;
//! let stat = provider.stat(&address).await?;
//! let hash = provider.compute_hash(&address, &stat).await?;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod config_ext;
pub mod error;
pub mod file;
pub mod hash;
pub mod provider;
pub mod providers;
pub mod range;
pub mod registry;
pub mod stat;

pub use address::ContentAddress;
pub use config_ext::{ContentConfigExt, ShareConfig};
pub use error::{ContentError, Result};
pub use file::{FILE_PROVIDER, FileContentProvider};
pub use hash::{HASH_PREFIX_LIMIT, hash_stream};
pub use provider::{ByteSink, ByteStream, ContentProvider, WriteOptions};
pub use providers::ContentProviders;
pub use range::{ReadRange, ReadSession};
pub use registry::{ContentNode, MemoryNodeRegistry, NodeRegistry};
pub use stat::{ContentStat, DIRECTORY_MIME_TYPE};
