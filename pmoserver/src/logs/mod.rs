//! Initialisation du système de logs.
//!
//! Un `Registry` porte un filtre de niveau rechargeable et, si demandé, une
//! couche console. Le [`LogState`] retourné permet de changer le niveau à
//! chaud.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::Level;
use tracing_subscriber::{
    Registry, filter::LevelFilter, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

/// Options d'initialisation du système de logging
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Niveau minimal affiché
    pub min_level: Level,
    /// Activer la sortie console
    pub enable_console: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            min_level: Level::INFO,
            enable_console: true,
        }
    }
}

impl LoggingOptions {
    /// Options lues dans `host.logger` de la configuration globale.
    pub fn from_config() -> Self {
        let config = pmoconfig::get_config();
        Self {
            min_level: string_to_level(&config.get_log_min_level()).unwrap_or(Level::INFO),
            enable_console: config.get_log_enable_console(),
        }
    }
}

/// Niveau courant et poignée de rechargement du filtre
#[derive(Clone)]
pub struct LogState {
    max_level: Arc<RwLock<Level>>,
    reload_handle: reload::Handle<LevelFilter, Registry>,
}

impl LogState {
    pub fn set_max_level(&self, level: Level) {
        *self.max_level.write() = level;
        match self.reload_handle.reload(LevelFilter::from_level(level)) {
            Ok(()) => tracing::info!("✅ Log level set to {}", level_to_string(level)),
            Err(e) => eprintln!("❌ Failed to reload log level filter: {}", e),
        }
    }

    pub fn get_max_level(&self) -> Level {
        *self.max_level.read()
    }
}

/// Installe le subscriber global.
///
/// # Exemple
/// ```rust,no_run
/// use pmoserver::logs::{LoggingOptions, init_logging};
///
/// let state = init_logging(LoggingOptions::default());
/// state.set_max_level(tracing::Level::DEBUG);
/// ```
pub fn init_logging(options: LoggingOptions) -> LogState {
    let (filter, reload_handle) = reload::Layer::new(LevelFilter::from_level(options.min_level));

    let log_state = LogState {
        max_level: Arc::new(RwLock::new(options.min_level)),
        reload_handle,
    };

    let subscriber = Registry::default().with(filter);

    let result = if options.enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .try_init()
    } else {
        subscriber.try_init()
    };

    if let Err(e) = result {
        eprintln!("⚠️ Logging already initialised: {}", e);
    }

    log_state
}

pub fn string_to_level(s: &str) -> Option<Level> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" | "WARNING" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

pub fn level_to_string(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!(string_to_level("debug"), Some(Level::DEBUG));
        assert_eq!(string_to_level(" Warning "), Some(Level::WARN));
        assert_eq!(string_to_level("verbose"), None);
        assert_eq!(level_to_string(Level::TRACE), "TRACE");
    }
}
