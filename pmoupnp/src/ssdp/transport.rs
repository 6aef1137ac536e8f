use std::collections::{HashMap, HashSet};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};

use async_trait::async_trait;
use parking_lot::Mutex;
use pmoutils::LocalInterface;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{debug, warn};

const MULTICAST_TTL: u32 = 4;

/// Envoi d'un datagramme SSDP depuis une interface locale donnée.
#[async_trait]
pub trait SsdpTransport: Send + Sync {
    async fn send_to(&self, iface: &LocalInterface, payload: &[u8], dest: SocketAddr) -> io::Result<()>;
}

/// Transport UDP : une socket d'émission par interface.
///
/// Une interface dont la socket n'a pas pu être créée est journalisée puis
/// ignorée ; les envois qui la visent échouent sans affecter les autres.
#[derive(Debug)]
pub struct UdpTransport {
    sockets: HashMap<Ipv4Addr, UdpSocket>,
}

impl UdpTransport {
    /// Crée les sockets d'émission. Doit être appelé depuis un runtime tokio.
    pub fn bind(interfaces: &[LocalInterface]) -> Self {
        let mut sockets = HashMap::new();
        for iface in interfaces {
            match bind_interface_socket(iface) {
                Ok(socket) => {
                    debug!("SSDP: sending socket ready on {} ({})", iface.addr, iface.name);
                    sockets.insert(iface.addr, socket);
                }
                Err(e) => warn!(
                    "❌ SSDP: failed to bind sending socket on {} ({}): {}",
                    iface.addr, iface.name, e
                ),
            }
        }
        Self { sockets }
    }
}

fn bind_interface_socket(iface: &LocalInterface) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_multicast_if_v4(&iface.addr)?;
    socket.set_multicast_ttl_v4(MULTICAST_TTL)?;
    socket.set_multicast_loop_v4(true)?;
    socket.bind(&SocketAddr::from((iface.addr, 0)).into())?;
    socket.set_nonblocking(true)?;
    UdpSocket::from_std(socket.into())
}

#[async_trait]
impl SsdpTransport for UdpTransport {
    async fn send_to(&self, iface: &LocalInterface, payload: &[u8], dest: SocketAddr) -> io::Result<()> {
        let socket = self.sockets.get(&iface.addr).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotConnected,
                format!("no SSDP socket bound on {}", iface.addr),
            )
        })?;
        socket.send_to(payload, dest).await?;
        Ok(())
    }
}

/// Datagramme capturé par [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentDatagram {
    pub iface: Ipv4Addr,
    pub dest: SocketAddr,
    pub payload: String,
}

impl SentDatagram {
    /// Valeur d'un en-tête (nom insensible à la casse).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim())
        })
    }
}

/// Transport en mémoire qui enregistre les datagrammes au lieu de les envoyer.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<SentDatagram>>,
    failing: Mutex<HashSet<Ipv4Addr>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fait échouer tous les envois depuis `addr`.
    pub fn fail_on(&self, addr: Ipv4Addr) {
        self.failing.lock().insert(addr);
    }

    pub fn sent(&self) -> Vec<SentDatagram> {
        self.sent.lock().clone()
    }

    /// Rend et oublie les datagrammes enregistrés.
    pub fn take(&self) -> Vec<SentDatagram> {
        std::mem::take(&mut *self.sent.lock())
    }
}

#[async_trait]
impl SsdpTransport for MemoryTransport {
    async fn send_to(&self, iface: &LocalInterface, payload: &[u8], dest: SocketAddr) -> io::Result<()> {
        if self.failing.lock().contains(&iface.addr) {
            return Err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("interface {} is down", iface.addr),
            ));
        }
        self.sent.lock().push(SentDatagram {
            iface: iface.addr,
            dest,
            payload: String::from_utf8_lossy(payload).into_owned(),
        });
        Ok(())
    }
}
