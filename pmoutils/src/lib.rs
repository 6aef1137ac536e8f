/// Utilitaires réseau et système partagés par les crates PMOMedia.
///
/// # Fonctions principales
///
/// - [`guess_local_ip`] : Devine l'adresse IP locale utilisée pour les connexions sortantes
/// - [`list_interfaces`] : Liste les interfaces IPv4 utilisables pour SSDP
/// - [`select_interface`] : Choisit l'interface la plus proche d'un pair distant
/// - [`get_os_string`] : Jeton système pour l'en-tête `SERVER`
///
/// # Examples
///
/// ```no_run
/// use pmoutils::{list_interfaces, select_interface};
///
/// let interfaces = list_interfaces(&[]);
/// let best = select_interface(&interfaces, "192.168.1.20".parse().unwrap());
/// println!("Interface choisie: {:?}", best);
/// ```
mod ip_utils;

pub use ip_utils::{LocalInterface, guess_local_ip, list_interfaces, select_interface};

/// Retourne une chaîne décrivant le système d'exploitation et sa version.
///
/// # Format
/// - macOS: "macOS/15.1"
/// - Linux: "Linux/6.5.0" ou "Ubuntu/22.04"
/// - Windows: "Windows/10.0.19045"
/// - Autre: "{OS}/Unknown"
pub fn get_os_string() -> String {
    let info = os_info::get();
    let os_type = format!("{:?}", info.os_type());

    // Un jeton produit ne doit pas contenir d'espace
    let version = info.version();
    let token = if version != &os_info::Version::Unknown {
        format!("{}/{}", os_type, version)
    } else {
        format!("{}/Unknown", os_type)
    };
    token.replace(' ', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_string_is_a_server_token() {
        let os = get_os_string();
        assert!(os.contains('/'));
        assert!(!os.contains(' '));
    }
}
