//! Serveur SSDP

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use pmoutils::{LocalInterface, select_interface};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, trace, warn};

use super::registry::normalize_uuid;
use super::{
    DEFAULT_MAX_AGE, SSDP_ALL, SSDP_MULTICAST_ADDR, SSDP_PORT, SearchRequest, SsdpEntry,
    SsdpError, SsdpTransport, UdpTransport, parse_search,
};

const RECV_BUFFER_SIZE: usize = 4096;

/// Paramètres des messages SSDP.
#[derive(Debug, Clone)]
pub struct SsdpOptions {
    /// Port HTTP utilisé dans `LOCATION`
    pub http_port: u16,
    /// Valeur de l'en-tête `SERVER`
    pub server_name: String,
    /// Version mineure UPnP : à partir de 1, les en-têtes UPnP 1.1 sont émis
    pub version: u32,
    pub boot_id: u32,
    pub config_id: u32,
    /// Port unicast annoncé par `SEARCHPORT.UPNP.ORG` s'il diffère de 1900
    pub search_port: u16,
    /// Ajoute `OPT` / `01-NLS`
    pub ipv6: bool,
    pub max_age: u32,
}

impl Default for SsdpOptions {
    fn default() -> Self {
        Self {
            http_port: 8080,
            server_name: crate::devices::server_string(1, false),
            version: 1,
            boot_id: chrono::Utc::now().timestamp() as u32,
            config_id: 1,
            search_port: SSDP_PORT,
            ipv6: false,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

/// Serveur SSDP gérant les annonces et découvertes
///
/// # Examples
///
/// ```rust
/// use pmoupnp::ssdp::{MemoryTransport, SsdpOptions, SsdpServer};
/// use pmoutils::LocalInterface;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let iface = LocalInterface::new("eth0", "10.0.0.5".parse().unwrap(), "255.255.255.0".parse().unwrap());
/// let transport = Arc::new(MemoryTransport::new());
/// let ssdp = SsdpServer::new(vec![iface], SsdpOptions::default(), transport.clone());
///
/// ssdp.add_root("uuid:1234", "urn:schemas-upnp-org:device:MediaServer:1", "/description.xml");
/// ssdp.advertise(true).await;
/// assert_eq!(transport.sent().len(), 3);
/// # }
/// ```
pub struct SsdpServer {
    interfaces: Vec<LocalInterface>,
    options: SsdpOptions,
    transport: Arc<dyn SsdpTransport>,
    registry: RwLock<IndexMap<String, SsdpEntry>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for SsdpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsdpServer")
            .field("interfaces", &self.interfaces)
            .field("options", &self.options)
            .field("registry", &*self.registry.read())
            .finish()
    }
}

impl SsdpServer {
    pub fn new(
        interfaces: Vec<LocalInterface>,
        options: SsdpOptions,
        transport: Arc<dyn SsdpTransport>,
    ) -> Self {
        Self {
            interfaces,
            options,
            transport,
            registry: RwLock::new(IndexMap::new()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Serveur utilisant de vraies sockets UDP. Doit être appelé depuis un runtime tokio.
    pub fn with_udp(interfaces: Vec<LocalInterface>, options: SsdpOptions) -> Self {
        let transport = Arc::new(UdpTransport::bind(&interfaces));
        Self::new(interfaces, options, transport)
    }

    pub fn options(&self) -> &SsdpOptions {
        &self.options
    }

    pub fn interfaces(&self) -> &[LocalInterface] {
        &self.interfaces
    }

    /// Enregistre un device racine (`upnp:rootdevice`, `uuid`, `uuid::usn`).
    pub fn add_root(&self, uuid: &str, usn: &str, location: &str) {
        let entry = SsdpEntry::root(uuid, usn, location);
        debug!(uuid = %entry.uuid, "SSDP: root device registered");
        self.registry.write().insert(entry.uuid.clone(), entry);
    }

    /// Enregistre un device embarqué (`uuid`, `uuid::usn`).
    pub fn add_device(&self, uuid: &str, usn: &str, location: &str) {
        let entry = SsdpEntry::device(uuid, usn, location);
        debug!(uuid = %entry.uuid, "SSDP: embedded device registered");
        self.registry.write().insert(entry.uuid.clone(), entry);
    }

    /// Ajoute un type de service à l'entrée `uuid`.
    ///
    /// Sans effet si `uuid` n'a pas été enregistré.
    pub fn add_service(&self, uuid: &str, service_type: &str) {
        let uuid = normalize_uuid(uuid);
        match self.registry.write().get_mut(&uuid) {
            Some(entry) => entry.bind(service_type),
            None => debug!(
                "SSDP: service {} ignored, device {} is not registered",
                service_type, uuid
            ),
        }
    }

    pub fn entries(&self) -> Vec<SsdpEntry> {
        self.registry.read().values().cloned().collect()
    }

    fn location_url(&self, iface: &LocalInterface, location: &str) -> String {
        format!("http://{}:{}{}", iface.addr, self.options.http_port, location)
    }

    /// Envoie un NOTIFY pour chaque binding de chaque entrée, sur chaque interface.
    ///
    /// Les envois sont concurrents ; un échec est journalisé et n'empêche pas
    /// les autres.
    ///
    /// # Returns
    ///
    /// Le nombre de datagrammes effectivement envoyés.
    pub async fn advertise(&self, alive: bool) -> usize {
        let messages: Vec<(&LocalInterface, String, String)> = {
            let registry = self.registry.read();
            let mut messages = Vec::new();
            for entry in registry.values() {
                for (nt, usn) in &entry.bindings {
                    for iface in &self.interfaces {
                        let location = self.location_url(iface, &entry.location);
                        let payload = self.options.notify_message(nt, usn, alive, &location);
                        messages.push((iface, payload, usn.clone()));
                    }
                }
            }
            messages
        };

        let dest = SocketAddr::from((SSDP_MULTICAST_ADDR, SSDP_PORT));
        let total = messages.len();
        let sends = messages.into_iter().map(|(iface, payload, usn)| async move {
            match self.transport.send_to(iface, payload.as_bytes(), dest).await {
                Ok(()) => {
                    trace!("NOTIFY {} sent on {}: {}", if alive { "alive" } else { "byebye" }, iface.addr, usn);
                    true
                }
                Err(e) => {
                    warn!("❌ Failed to send NOTIFY for {} on {}: {}", usn, iface.addr, e);
                    false
                }
            }
        });

        let sent = join_all(sends).await.into_iter().filter(|ok| *ok).count();
        if alive {
            debug!("✅ SSDP alive: {}/{} datagrams sent", sent, total);
        } else {
            info!("👋 SSDP byebye: {}/{} datagrams sent", sent, total);
        }
        sent
    }

    /// Interface de sortie pour répondre à `remote`.
    fn outbound_interface(&self, remote: IpAddr) -> Option<&LocalInterface> {
        match remote {
            IpAddr::V4(v4) => select_interface(&self.interfaces, v4),
            IpAddr::V6(_) => self.interfaces.first(),
        }
    }

    /// Répond en unicast à un M-SEARCH.
    ///
    /// Une réponse est envoyée pour chaque binding dont le type de
    /// notification vaut `ST` (ou pour tous si `ST` vaut `ssdp:all`), depuis
    /// l'interface partageant le plus long préfixe avec le demandeur.
    ///
    /// # Returns
    ///
    /// Le nombre de réponses envoyées.
    pub async fn respond_to_search(&self, request: &SearchRequest, from: SocketAddr) -> usize {
        let Some(iface) = self.outbound_interface(from.ip()) else {
            warn!("SSDP: no interface configured, M-SEARCH from {} ignored", from);
            return 0;
        };

        let responses: Vec<(String, String)> = {
            let registry = self.registry.read();
            registry
                .values()
                .flat_map(|entry| {
                    entry
                        .bindings
                        .iter()
                        .filter(|(nt, _)| request.st == SSDP_ALL || request.st == **nt)
                        .map(|(nt, usn)| {
                            let location = self.location_url(iface, &entry.location);
                            (
                                usn.clone(),
                                self.options.search_response(nt, usn, &location),
                            )
                        })
                        .collect::<Vec<_>>()
                })
                .collect()
        };

        let mut sent = 0;
        for (usn, payload) in responses {
            match self.transport.send_to(iface, payload.as_bytes(), from).await {
                Ok(()) => {
                    debug!("📡 M-SEARCH response sent to {} via {}: {}", from, iface.addr, usn);
                    sent += 1;
                }
                Err(e) => warn!("❌ Failed to send M-SEARCH response to {}: {}", from, e),
            }
        }
        sent
    }

    /// Traite un datagramme reçu. Les messages illisibles sont ignorés.
    pub async fn handle_datagram(&self, data: &[u8], from: SocketAddr) {
        let text = String::from_utf8_lossy(data);
        match parse_search(&text) {
            Ok(Some(request)) => {
                debug!("M-SEARCH from {} (ST={})", from, request.st);
                self.respond_to_search(&request, from).await;
            }
            Ok(None) => trace!("SSDP message from {} ignored", from),
            Err(e) => debug!("Ignoring datagram from {}: {}", from, e),
        }
    }

    /// Démarre le serveur SSDP
    ///
    /// Envoie une première série de `ssdp:alive`, lance les annonces
    /// périodiques (max-age / 2) puis l'écoute des M-SEARCH sur le port 1900
    /// (et sur le port de recherche s'il diffère).
    ///
    /// # Errors
    ///
    /// [`SsdpError::Io`] si une socket d'écoute ne peut pas être créée. Les
    /// annonces continuent dans ce cas.
    pub async fn start(self: &Arc<Self>) -> Result<(), SsdpError> {
        self.advertise(true).await;

        let period = Duration::from_secs(u64::from((self.options.max_age / 2).max(1)));
        let server = Arc::clone(self);
        let announcer = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                server.advertise(true).await;
            }
        });
        self.tasks.lock().push(announcer);

        let mut ports = vec![SSDP_PORT];
        if self.options.search_port != SSDP_PORT {
            ports.push(self.options.search_port);
        }

        for port in ports {
            let socket = self.bind_listener(port)?;
            let server = Arc::clone(self);
            let listener = tokio::spawn(async move { server.listen(socket).await });
            self.tasks.lock().push(listener);
            info!("✅ SSDP server listening on 0.0.0.0:{}", port);
        }

        Ok(())
    }

    fn bind_listener(&self, port: u16) -> io::Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)).into())?;

        if port == SSDP_PORT {
            for iface in &self.interfaces {
                match socket.join_multicast_v4(&SSDP_MULTICAST_ADDR, &iface.addr) {
                    Ok(()) => debug!("SSDP: joined {} on {}", SSDP_MULTICAST_ADDR, iface.addr),
                    Err(e) => warn!(
                        "❌ SSDP: failed to join {} on {}: {}",
                        SSDP_MULTICAST_ADDR, iface.addr, e
                    ),
                }
            }
        }

        socket.set_nonblocking(true)?;
        UdpSocket::from_std(socket.into())
    }

    async fn listen(&self, socket: UdpSocket) {
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        loop {
            match socket.recv_from(&mut buf).await {
                Ok((n, from)) => self.handle_datagram(&buf[..n], from).await,
                Err(e) => {
                    warn!("❌ SSDP read error: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }

    /// Arrête les tâches et envoie `ssdp:byebye` pour toutes les identités.
    pub async fn stop(&self) {
        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            task.abort();
        }
        info!("✅ Shutting down SSDP server, sending byebye for all devices");
        self.advertise(false).await;
    }
}
