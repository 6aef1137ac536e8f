use std::collections::HashMap;

use chrono::Utc;
use tracing::trace;

use super::{SSDP_MULTICAST_ADDR, SSDP_PORT, SsdpError, SsdpOptions};

/// Requête M-SEARCH reçue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Cible de recherche (`ssdp:all`, `upnp:rootdevice`, `uuid:...`, URN)
    pub st: String,
    pub man: Option<String>,
    pub mx: Option<u32>,
}

/// Analyse un datagramme reçu sur le port SSDP.
///
/// # Returns
///
/// - `Ok(Some(_))` pour un M-SEARCH valide
/// - `Ok(None)` pour un message qui ne nous concerne pas (NOTIFY d'un autre
///   device, réponse HTTP)
///
/// # Errors
///
/// [`SsdpError::Malformed`] si la ligne de requête est inconnue ou si `ST`
/// est absent.
pub fn parse_search(data: &str) -> Result<Option<SearchRequest>, SsdpError> {
    let mut lines = data.lines();
    let first_line = lines
        .next()
        .map(str::trim)
        .ok_or_else(|| SsdpError::Malformed("empty datagram".to_string()))?;
    let upper = first_line.to_ascii_uppercase();

    if upper.starts_with("NOTIFY ") || upper.starts_with("HTTP/") {
        return Ok(None);
    }

    let parts: Vec<&str> = upper.split_whitespace().collect();
    if parts != ["M-SEARCH", "*", "HTTP/1.1"] {
        return Err(SsdpError::Malformed(format!(
            "unexpected request line '{}'",
            first_line
        )));
    }

    let headers = parse_headers(lines);
    let st = headers
        .get("ST")
        .cloned()
        .ok_or_else(|| SsdpError::Malformed("M-SEARCH without ST header".to_string()))?;

    Ok(Some(SearchRequest {
        st,
        man: headers.get("MAN").cloned(),
        mx: headers.get("MX").and_then(|mx| mx.parse().ok()),
    }))
}

fn parse_headers<'a, I>(lines: I) -> HashMap<String, String>
where
    I: Iterator<Item = &'a str>,
{
    let mut headers = HashMap::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }

        // Split on first ':' only (values may contain ':')
        match line.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                headers.insert(name.trim().to_ascii_uppercase(), value.trim().to_string());
            }
            _ => trace!("Skipping malformed header: '{}'", line),
        }
    }
    headers
}

impl SsdpOptions {
    fn push_upnp11_headers(&self, msg: &mut String, with_search_port: bool) {
        if self.version < 1 {
            return;
        }
        msg.push_str(&format!("BOOTID.UPNP.ORG: {}\r\n", self.boot_id));
        msg.push_str(&format!("CONFIGID.UPNP.ORG: {}\r\n", self.config_id));
        if with_search_port && self.search_port != SSDP_PORT {
            msg.push_str(&format!("SEARCHPORT.UPNP.ORG: {}\r\n", self.search_port));
        }
    }

    /// Datagramme NOTIFY.
    ///
    /// Un byebye ne porte ni `LOCATION`, ni `CACHE-CONTROL`, ni `SERVER`.
    pub(crate) fn notify_message(&self, nt: &str, usn: &str, alive: bool, location: &str) -> String {
        let mut msg = String::from("NOTIFY * HTTP/1.1\r\n");
        msg.push_str(&format!("HOST: {}:{}\r\n", SSDP_MULTICAST_ADDR, SSDP_PORT));
        if alive {
            msg.push_str(&format!("CACHE-CONTROL: max-age={}\r\n", self.max_age));
            msg.push_str(&format!("LOCATION: {}\r\n", location));
        }
        msg.push_str(&format!("NT: {}\r\n", nt));
        msg.push_str(&format!(
            "NTS: {}\r\n",
            if alive { "ssdp:alive" } else { "ssdp:byebye" }
        ));
        if alive {
            msg.push_str(&format!("SERVER: {}\r\n", self.server_name));
        }
        msg.push_str(&format!("USN: {}\r\n", usn));
        self.push_upnp11_headers(&mut msg, alive);
        if self.version >= 1 && self.ipv6 {
            msg.push_str("OPT: \"http://schemas.upnp.org/upnp/1/0/\"; ns=01\r\n");
            msg.push_str(&format!("01-NLS: {}\r\n", self.boot_id));
        }
        msg.push_str("\r\n");
        msg
    }

    /// Réponse unicast `HTTP/1.1 200 OK` à un M-SEARCH.
    pub(crate) fn search_response(&self, st: &str, usn: &str, location: &str) -> String {
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT");
        let mut msg = String::from("HTTP/1.1 200 OK\r\n");
        msg.push_str(&format!("CACHE-CONTROL: max-age={}\r\n", self.max_age));
        msg.push_str(&format!("DATE: {}\r\n", date));
        msg.push_str("EXT:\r\n");
        msg.push_str(&format!("LOCATION: {}\r\n", location));
        msg.push_str(&format!("SERVER: {}\r\n", self.server_name));
        msg.push_str(&format!("ST: {}\r\n", st));
        msg.push_str(&format!("USN: {}\r\n", usn));
        self.push_upnp11_headers(&mut msg, true);
        msg.push_str("\r\n");
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_msearch() {
        let data = "M-SEARCH * HTTP/1.1\r\n\
                    HOST: 239.255.255.250:1900\r\n\
                    MAN: \"ssdp:discover\"\r\n\
                    MX: 2\r\n\
                    st: urn:schemas-upnp-org:device:MediaServer:1\r\n\r\n";
        let req = parse_search(data).unwrap().unwrap();
        assert_eq!(req.st, "urn:schemas-upnp-org:device:MediaServer:1");
        assert_eq!(req.mx, Some(2));
        assert_eq!(req.man.as_deref(), Some("\"ssdp:discover\""));
    }

    #[test]
    fn test_parse_ignores_notify_and_responses() {
        assert!(parse_search("NOTIFY * HTTP/1.1\r\nNT: x\r\n\r\n").unwrap().is_none());
        assert!(parse_search("HTTP/1.1 200 OK\r\nST: x\r\n\r\n").unwrap().is_none());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(parse_search(""), Err(SsdpError::Malformed(_))));
        assert!(matches!(
            parse_search("M-SEARCH /foo HTTP/1.0\r\nST: ssdp:all\r\n\r\n"),
            Err(SsdpError::Malformed(_))
        ));
        assert!(matches!(
            parse_search("M-SEARCH * HTTP/1.1\r\nMX: 1\r\n\r\n"),
            Err(SsdpError::Malformed(_))
        ));
    }

    #[test]
    fn test_byebye_has_no_location() {
        let options = SsdpOptions::default();
        let msg = options.notify_message("upnp:rootdevice", "uuid:X::upnp:rootdevice", false, "http://a/b");
        assert!(msg.contains("NTS: ssdp:byebye\r\n"));
        assert!(!msg.contains("LOCATION"));
        assert!(!msg.contains("CACHE-CONTROL"));
        assert!(!msg.contains("SERVER"));
        assert!(msg.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_version_gates_upnp11_headers() {
        let mut options = SsdpOptions {
            version: 0,
            search_port: 1901,
            ipv6: true,
            ..SsdpOptions::default()
        };
        let msg = options.notify_message("nt", "usn", true, "http://a/b");
        assert!(!msg.contains("BOOTID.UPNP.ORG"));
        assert!(!msg.contains("SEARCHPORT.UPNP.ORG"));
        assert!(!msg.contains("OPT:"));

        options.version = 1;
        let msg = options.notify_message("nt", "usn", true, "http://a/b");
        assert!(msg.contains("BOOTID.UPNP.ORG: "));
        assert!(msg.contains("CONFIGID.UPNP.ORG: "));
        assert!(msg.contains("SEARCHPORT.UPNP.ORG: 1901\r\n"));
        assert!(msg.contains("01-NLS: "));
    }

    #[test]
    fn test_search_response_headers() {
        let options = SsdpOptions::default();
        let msg = options.search_response("ssdp:all", "uuid:X", "http://10.0.0.5:8080/description.xml");
        assert!(msg.starts_with("HTTP/1.1 200 OK\r\n"));
        for header in ["CACHE-CONTROL: ", "DATE: ", "EXT:", "LOCATION: ", "SERVER: ", "ST: ", "USN: "] {
            assert!(msg.contains(header), "missing {header}");
        }
    }
}
