//! # pmocloud - Fournisseur de contenu distant
//!
//! [`CloudProvider`] expose une API de stockage HTTP à travers le trait
//! [`pmocontent::ContentProvider`].
//!
//! ## API consommée
//!
//! ```text
//! GET {base}/folders/{id}/children   listing JSON d'un dossier
//! GET {base}/files/{id}/content      contenu (Range accepté, 302 possibles)
//! ```
//!
//! ## Exemple
//!
//! ```rust,no_run
//! use pmocloud::{CloudConfig, CloudProvider};
//! use pmocontent::ContentProvider;
//!
//! # async fn example() -> pmocontent::Result<()> {
//! let provider = CloudProvider::new(CloudConfig::new("https://storage.example.com/api", "token"))?;
//! for address in provider.readdir(&provider.root()).await? {
//!     let stat = provider.stat(&address).await?;
//!     println!("{} {}", stat.name, stat.size);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod config_ext;
pub mod listing;
pub mod path;
pub mod provider;

pub use config::CloudConfig;
pub use config_ext::CloudConfigExt;
pub use path::{CloudPath, ROOT_FOLDER_ID};
pub use provider::CloudProvider;
