use get_if_addrs::{IfAddr, get_if_addrs};
use std::net::{Ipv4Addr, UdpSocket};
use tracing::warn;

/// Préfixes essayés, du plus spécifique au plus large, pour rapprocher
/// un pair distant d'une interface locale.
const SUBNET_PREFIXES: [u32; 3] = [24, 16, 8];

/// Interface réseau locale IPv4 utilisable pour les annonces SSDP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInterface {
    /// Nom système de l'interface (ex: `"eth0"`, `"en0"`)
    pub name: String,
    /// Adresse IPv4 de l'interface
    pub addr: Ipv4Addr,
    /// Masque réseau déclaré par le système
    pub netmask: Ipv4Addr,
}

impl LocalInterface {
    pub fn new(name: impl Into<String>, addr: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            addr,
            netmask,
        }
    }

    /// Vrai si `remote` partage les `prefix` premiers bits de l'adresse de l'interface.
    pub fn shares_prefix(&self, remote: Ipv4Addr, prefix: u32) -> bool {
        let mask = if prefix == 0 {
            0
        } else {
            u32::MAX << (32 - prefix.min(32))
        };
        (u32::from(self.addr) & mask) == (u32::from(remote) & mask)
    }
}

/// Devine l'adresse IP locale de la machine.
///
/// Crée un socket UDP « connecté » vers un serveur DNS public (aucun paquet
/// n'est émis) et lit l'adresse locale choisie par le système.
///
/// # Returns
///
/// L'adresse IP locale sous forme de `String`, ou `"127.0.0.1"` en cas d'erreur.
pub fn guess_local_ip() -> String {
    match UdpSocket::bind("0.0.0.0:0") {
        Ok(socket) => {
            if socket.connect("8.8.8.8:80").is_ok() {
                if let Ok(local_addr) = socket.local_addr() {
                    return local_addr.ip().to_string();
                }
            }
            "127.0.0.1".to_string()
        }
        Err(_) => "127.0.0.1".to_string(),
    }
}

/// Liste les interfaces IPv4 non-loopback de la machine.
///
/// # Arguments
///
/// * `allowed` - Noms d'interfaces à retenir. Une liste vide retient toutes les interfaces.
///
/// # Returns
///
/// Les interfaces dans l'ordre rendu par le système. En cas d'erreur
/// d'énumération, un avertissement est journalisé et la liste est vide.
pub fn list_interfaces(allowed: &[String]) -> Vec<LocalInterface> {
    let interfaces = match get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            warn!("❌ Failed to enumerate network interfaces: {}", e);
            return Vec::new();
        }
    };

    interfaces
        .into_iter()
        .filter(|iface| !iface.is_loopback())
        .filter(|iface| allowed.is_empty() || allowed.iter().any(|name| name == &iface.name))
        .filter_map(|iface| match iface.addr {
            IfAddr::V4(v4) => Some(LocalInterface::new(iface.name, v4.ip, v4.netmask)),
            IfAddr::V6(_) => None,
        })
        .collect()
}

/// Choisit l'interface locale la plus proche d'un pair distant.
///
/// Les préfixes `/24`, `/16` puis `/8` sont essayés dans cet ordre sur toutes
/// les interfaces ; la première correspondance l'emporte. Sans correspondance,
/// la première interface configurée est retenue.
///
/// # Returns
///
/// `None` uniquement si `interfaces` est vide.
pub fn select_interface(interfaces: &[LocalInterface], remote: Ipv4Addr) -> Option<&LocalInterface> {
    SUBNET_PREFIXES
        .iter()
        .find_map(|&prefix| {
            interfaces
                .iter()
                .find(|iface| iface.shares_prefix(remote, prefix))
        })
        .or_else(|| interfaces.first())
}
