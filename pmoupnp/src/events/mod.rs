//! # Bus d'événements asynchrone
//!
//! [`AsyncEventBus`] distribue des événements nommés à des handlers asynchrones
//! enregistrés avec une priorité (plus petite = exécutée en premier).
//!
//! ## Garanties
//!
//! - Pour une émission donnée, les handlers s'exécutent **un par un**, dans
//!   l'ordre croissant des priorités, même s'ils suspendent leur exécution.
//! - Le premier handler en erreur interrompt la chaîne : les suivants ne sont
//!   pas appelés et l'erreur est rendue à l'émetteur.
//! - L'émission rend toujours la main à l'ordonnanceur avant de se terminer,
//!   y compris sans handler.
//! - Un handler `once` est retiré avant sa première exécution et protégé par un
//!   verrou à usage unique contre une double exécution réentrante.

mod bus;
mod errors;

pub use bus::{AsyncEventBus, DEFAULT_MAX_LISTENERS, DEFAULT_PRIORITY, ListenerEvent, ListenerId};
pub use errors::EventBusError;
