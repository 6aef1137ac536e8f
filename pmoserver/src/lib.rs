//! # pmoserver - Serveur web haut niveau basé sur Axum
//!
//! Hôte HTTP de PMOMedia : un router Axum partagé auquel les autres crates
//! ajoutent leurs routes, puis démarré une seule fois.
//!
//! - [`server`] : serveur principal et builder
//! - [`logs`] : initialisation de `tracing-subscriber` avec niveau rechargeable
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use pmoserver::{ServerBuilder, logs::LoggingOptions};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let mut server = ServerBuilder::new("MyServer", "localhost", 8080).build();
//!     server.init_logging(LoggingOptions::default());
//!
//!     server.add_route("/api/status", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{LogState, LoggingOptions, init_logging};
pub use server::{Server, ServerBuilder, ServerInfo};
