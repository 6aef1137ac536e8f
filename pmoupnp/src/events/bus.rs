use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::EventBusError;

/// Priorité utilisée par [`AsyncEventBus::on`] et [`AsyncEventBus::once`]
pub const DEFAULT_PRIORITY: i32 = 50;

/// Seuil au-delà duquel un avertissement est journalisé (sans bloquer)
pub const DEFAULT_MAX_LISTENERS: usize = 10;

const META_CHANNEL_CAPACITY: usize = 64;

/// Identifiant d'un handler enregistré, rendu par `on`/`once`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Méta-événements publiés à chaque ajout ou retrait de handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    NewListener {
        event: String,
        id: ListenerId,
        priority: i32,
    },
    RemoveListener {
        event: String,
        id: ListenerId,
    },
}

type Handler<E> = Arc<dyn Fn(E) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

struct Listener<E> {
    id: ListenerId,
    priority: i32,
    /// Présent uniquement pour les handlers `once`
    latch: Option<AtomicBool>,
    handler: Handler<E>,
}

struct Inner<E> {
    listeners: RwLock<HashMap<String, Vec<Arc<Listener<E>>>>>,
    next_id: AtomicU64,
    max_listeners: AtomicUsize,
    meta: broadcast::Sender<ListenerEvent>,
}

impl<E> Inner<E> {
    fn remove(&self, event: &str, id: ListenerId) -> bool {
        let removed = {
            let mut map = self.listeners.write();
            let Some(list) = map.get_mut(event) else {
                return false;
            };
            let removed = match list.iter().position(|l| l.id == id) {
                Some(pos) => {
                    list.remove(pos);
                    true
                }
                None => false,
            };
            if list.is_empty() {
                map.remove(event);
            }
            removed
        };

        if removed {
            let _ = self.meta.send(ListenerEvent::RemoveListener {
                event: event.to_string(),
                id,
            });
        }
        removed
    }
}

/// Bus d'événements nommés à handlers asynchrones ordonnés par priorité.
///
/// Le bus est un handle partagé : ses clones désignent le même ensemble de
/// handlers.
///
/// # Examples
///
/// ```rust
/// use pmoupnp::events::AsyncEventBus;
///
/// # #[tokio::main]
/// # async fn main() {
/// let bus: AsyncEventBus<u32> = AsyncEventBus::new();
/// bus.on("tick", |n| async move {
///     println!("tick {n}");
///     Ok(())
/// });
/// bus.emit("tick", 1).await.unwrap();
/// # }
/// ```
pub struct AsyncEventBus<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for AsyncEventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for AsyncEventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.inner.listeners.read();
        let counts: HashMap<&str, usize> = map.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("AsyncEventBus")
            .field("listeners", &counts)
            .field("max_listeners", &self.inner.max_listeners.load(Ordering::Relaxed))
            .finish()
    }
}

impl<E: Clone + Send + 'static> Default for AsyncEventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send + 'static> AsyncEventBus<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                listeners: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                max_listeners: AtomicUsize::new(DEFAULT_MAX_LISTENERS),
                meta: broadcast::channel(META_CHANNEL_CAPACITY).0,
            }),
        }
    }

    /// Enregistre un handler avec la priorité par défaut (50).
    pub fn on<F, Fut>(&self, event: &str, handler: F) -> ListenerId
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_with_priority(event, DEFAULT_PRIORITY, handler)
    }

    /// Enregistre un handler. Les priorités basses s'exécutent en premier ;
    /// à priorité égale, l'ordre d'enregistrement est conservé.
    pub fn on_with_priority<F, Fut>(&self, event: &str, priority: i32, handler: F) -> ListenerId
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(event, priority, false, Arc::new(move |e| handler(e).boxed()))
    }

    /// Comme [`on`](Self::on), mais le handler n'est exécuté qu'une seule fois.
    pub fn once<F, Fut>(&self, event: &str, handler: F) -> ListenerId
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.once_with_priority(event, DEFAULT_PRIORITY, handler)
    }

    pub fn once_with_priority<F, Fut>(&self, event: &str, priority: i32, handler: F) -> ListenerId
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(event, priority, true, Arc::new(move |e| handler(e).boxed()))
    }

    fn register(&self, event: &str, priority: i32, once: bool, handler: Handler<E>) -> ListenerId {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let listener = Arc::new(Listener {
            id,
            priority,
            latch: once.then(|| AtomicBool::new(false)),
            handler,
        });

        let count = {
            let mut map = self.inner.listeners.write();
            let list = map.entry(event.to_string()).or_default();
            list.push(listener);
            list.sort_by_key(|l| l.priority);
            list.len()
        };

        let max = self.inner.max_listeners.load(Ordering::Relaxed);
        if max > 0 && count > max {
            warn!(
                "⚠️ {} listeners registered for event '{}' (max {}), possible leak",
                count, event, max
            );
        }

        let _ = self.inner.meta.send(ListenerEvent::NewListener {
            event: event.to_string(),
            id,
            priority,
        });
        id
    }

    /// Retire un handler. Rend `false` (sans méta-événement) s'il est absent.
    pub fn remove_listener(&self, event: &str, id: ListenerId) -> bool {
        self.inner.remove(event, id)
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        self.inner.listeners.read().contains_key(event)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .listeners
            .read()
            .get(event)
            .map_or(0, |list| list.len())
    }

    /// Modifie le seuil d'avertissement. `0` désactive l'avertissement.
    pub fn set_max_listeners(&self, max: usize) {
        self.inner.max_listeners.store(max, Ordering::Relaxed);
    }

    /// Abonnement aux méta-événements `newListener` / `removeListener`.
    pub fn subscribe_meta(&self) -> broadcast::Receiver<ListenerEvent> {
        self.inner.meta.subscribe()
    }

    /// Émet `event` vers ses handlers.
    ///
    /// Les handlers pris en compte sont ceux enregistrés au moment de l'appel.
    /// Chacun est attendu avant de passer au suivant. La future rendue cède
    /// toujours la main une fois avant de se résoudre avec `Ok(())`.
    ///
    /// # Errors
    ///
    /// [`EventBusError::Handler`] dès qu'un handler échoue ; les handlers de
    /// priorité supérieure ne sont pas exécutés.
    pub fn emit(&self, event: &str, payload: E) -> BoxFuture<'static, Result<(), EventBusError>> {
        let inner = Arc::clone(&self.inner);
        let event = event.to_string();
        let snapshot: Vec<Arc<Listener<E>>> = inner
            .listeners
            .read()
            .get(&event)
            .cloned()
            .unwrap_or_default();

        async move {
            for listener in snapshot {
                if let Some(latch) = &listener.latch {
                    if latch.swap(true, Ordering::AcqRel) {
                        continue;
                    }
                    inner.remove(&event, listener.id);
                }

                if let Err(e) = (listener.handler)(payload.clone()).await {
                    debug!(
                        "❌ Handler {:?} (priority {}) failed on '{}': {}",
                        listener.id, listener.priority, event, e
                    );
                    return Err(EventBusError::Handler {
                        event,
                        message: e.to_string(),
                    });
                }
            }

            tokio::task::yield_now().await;
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn recorder() -> Arc<Mutex<Vec<i32>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[tokio::test]
    async fn test_handlers_run_in_priority_order() {
        let bus: AsyncEventBus<()> = AsyncEventBus::new();
        let order = recorder();

        for priority in [30, 10, 20] {
            let order = order.clone();
            bus.on_with_priority("evt", priority, move |_| {
                let order = order.clone();
                async move {
                    order.lock().push(priority);
                    Ok(())
                }
            });
        }

        bus.emit("evt", ()).await.unwrap();
        assert_eq!(*order.lock(), vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_error_stops_the_chain() {
        let bus: AsyncEventBus<()> = AsyncEventBus::new();
        let order = recorder();

        for priority in [30, 10, 20] {
            let order = order.clone();
            bus.on_with_priority("evt", priority, move |_| {
                let order = order.clone();
                async move {
                    order.lock().push(priority);
                    if priority == 20 {
                        anyhow::bail!("boom");
                    }
                    Ok(())
                }
            });
        }

        let err = bus.emit("evt", ()).await.unwrap_err();
        assert_eq!(
            err,
            EventBusError::Handler {
                event: "evt".to_string(),
                message: "boom".to_string()
            }
        );
        assert_eq!(*order.lock(), vec![10, 20]);
    }

    #[tokio::test]
    async fn test_equal_priorities_keep_registration_order() {
        let bus: AsyncEventBus<()> = AsyncEventBus::new();
        let order = recorder();

        for tag in [1, 2, 3] {
            let order = order.clone();
            bus.on("evt", move |_| {
                let order = order.clone();
                async move {
                    order.lock().push(tag);
                    Ok(())
                }
            });
        }

        bus.emit("evt", ()).await.unwrap();
        assert_eq!(*order.lock(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_handlers_never_overlap() {
        let bus: AsyncEventBus<()> = AsyncEventBus::new();
        let order = recorder();

        let slow = order.clone();
        bus.on_with_priority("evt", 1, move |_| {
            let slow = slow.clone();
            async move {
                slow.lock().push(1);
                for _ in 0..5 {
                    tokio::task::yield_now().await;
                }
                slow.lock().push(2);
                Ok(())
            }
        });
        let fast = order.clone();
        bus.on_with_priority("evt", 2, move |_| {
            let fast = fast.clone();
            async move {
                fast.lock().push(3);
                Ok(())
            }
        });

        bus.emit("evt", ()).await.unwrap();
        assert_eq!(*order.lock(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_once_fires_once_even_when_reentered() {
        let bus: AsyncEventBus<u32> = AsyncEventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let reentrant = bus.clone();
        let counter = calls.clone();
        bus.once("evt", move |depth| {
            let bus = reentrant.clone();
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if depth == 0 {
                    bus.emit("evt", depth + 1).await?;
                }
                Ok(())
            }
        });

        bus.emit("evt", 0).await.unwrap();
        bus.emit("evt", 0).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!bus.has_listeners("evt"));
    }

    #[tokio::test]
    async fn test_emit_without_listeners_is_deferred() {
        let bus: AsyncEventBus<()> = AsyncEventBus::new();
        let mut fut = bus.emit("nobody", ());
        // Le premier poll cède la main
        assert!((&mut fut).now_or_never().is_none());
        assert_eq!(fut.await, Ok(()));
    }

    #[tokio::test]
    async fn test_meta_events_and_removal() {
        let bus: AsyncEventBus<()> = AsyncEventBus::new();
        let mut meta = bus.subscribe_meta();

        let id = bus.on("evt", |_| async { Ok(()) });
        assert_eq!(
            meta.try_recv().unwrap(),
            ListenerEvent::NewListener {
                event: "evt".to_string(),
                id,
                priority: DEFAULT_PRIORITY
            }
        );
        assert!(bus.has_listeners("evt"));

        assert!(bus.remove_listener("evt", id));
        assert_eq!(
            meta.try_recv().unwrap(),
            ListenerEvent::RemoveListener {
                event: "evt".to_string(),
                id
            }
        );

        // Absent : aucun méta-événement
        assert!(!bus.remove_listener("evt", id));
        assert!(meta.try_recv().is_err());
        assert!(!bus.has_listeners("evt"));
    }

    #[tokio::test]
    async fn test_max_listeners_is_a_soft_limit() {
        let bus: AsyncEventBus<()> = AsyncEventBus::new();
        bus.set_max_listeners(2);
        for _ in 0..5 {
            bus.on("evt", |_| async { Ok(()) });
        }
        assert_eq!(bus.listener_count("evt"), 5);
        assert_eq!(bus.listener_count("other"), 0);
    }
}
