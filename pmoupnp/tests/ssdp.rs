use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use pmoupnp::ssdp::{MemoryTransport, SearchRequest, SsdpOptions, SsdpServer};
use pmoutils::LocalInterface;

const UUID: &str = "uuid:2fac1234-31f8-11b4-a222-08002b34c003";
const MEDIA_SERVER: &str = "urn:schemas-upnp-org:device:MediaServer:1";
const CONTENT_DIRECTORY: &str = "urn:schemas-upnp-org:service:ContentDirectory:1";

fn iface(name: &str, addr: &str, mask: &str) -> LocalInterface {
    LocalInterface::new(name, addr.parse().unwrap(), mask.parse().unwrap())
}

fn two_interfaces() -> Vec<LocalInterface> {
    vec![
        iface("eth0", "192.168.1.10", "255.255.255.0"),
        iface("wlan0", "10.0.0.5", "255.255.255.0"),
    ]
}

fn server(interfaces: Vec<LocalInterface>) -> (SsdpServer, Arc<MemoryTransport>) {
    let transport = Arc::new(MemoryTransport::new());
    let options = SsdpOptions {
        http_port: 8080,
        server_name: "Linux/6.1 UPnP/1.1 PMOMedia/0.1.0".to_string(),
        boot_id: 7,
        ..SsdpOptions::default()
    };
    let ssdp = SsdpServer::new(interfaces, options, transport.clone());
    ssdp.add_root(UUID, MEDIA_SERVER, "/description.xml");
    (ssdp, transport)
}

fn msearch(st: &str) -> SearchRequest {
    SearchRequest {
        st: st.to_string(),
        man: Some("\"ssdp:discover\"".to_string()),
        mx: Some(1),
    }
}

#[tokio::test]
async fn test_alive_sent_on_every_interface_with_own_location() {
    let (ssdp, transport) = server(two_interfaces());

    let sent = ssdp.advertise(true).await;
    assert_eq!(sent, 6);

    let datagrams = transport.sent();
    let roots: Vec<_> = datagrams
        .iter()
        .filter(|d| d.header("NT") == Some("upnp:rootdevice"))
        .collect();
    assert_eq!(roots.len(), 2);

    for datagram in roots {
        let expected = format!("http://{}:8080/description.xml", datagram.iface);
        assert_eq!(datagram.header("LOCATION"), Some(expected.as_str()));
        assert_eq!(datagram.header("NTS"), Some("ssdp:alive"));
        assert_eq!(
            datagram.header("USN"),
            Some(format!("{}::upnp:rootdevice", UUID).as_str())
        );
        assert_eq!(datagram.header("CACHE-CONTROL"), Some("max-age=1800"));
        assert_eq!(datagram.header("BOOTID.UPNP.ORG"), Some("7"));
        assert_eq!(
            datagram.dest,
            SocketAddr::from((Ipv4Addr::new(239, 255, 255, 250), 1900))
        );
    }
}

#[tokio::test]
async fn test_byebye_has_no_location() {
    let (ssdp, transport) = server(vec![iface("eth0", "192.168.1.10", "255.255.255.0")]);
    ssdp.add_service(UUID, CONTENT_DIRECTORY);

    assert_eq!(ssdp.advertise(false).await, 4);
    for datagram in transport.sent() {
        assert!(datagram.payload.starts_with("NOTIFY * HTTP/1.1\r\n"));
        assert_eq!(datagram.header("NTS"), Some("ssdp:byebye"));
        assert_eq!(datagram.header("LOCATION"), None);
        assert_eq!(datagram.header("SERVER"), None);
    }
}

#[tokio::test]
async fn test_failing_interface_does_not_block_others() {
    let (ssdp, transport) = server(two_interfaces());
    transport.fail_on("192.168.1.10".parse().unwrap());

    assert_eq!(ssdp.advertise(true).await, 3);
    assert!(
        transport
            .sent()
            .iter()
            .all(|d| d.iface == Ipv4Addr::new(10, 0, 0, 5))
    );
}

#[tokio::test]
async fn test_search_response_uses_requester_subnet() {
    let (ssdp, transport) = server(two_interfaces());
    let from: SocketAddr = "10.0.0.42:50000".parse().unwrap();

    assert_eq!(ssdp.respond_to_search(&msearch(MEDIA_SERVER), from).await, 1);

    let datagrams = transport.sent();
    let response = &datagrams[0];
    assert!(response.payload.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(response.iface, Ipv4Addr::new(10, 0, 0, 5));
    assert_eq!(response.dest, from);
    assert_eq!(response.header("ST"), Some(MEDIA_SERVER));
    assert_eq!(
        response.header("LOCATION"),
        Some("http://10.0.0.5:8080/description.xml")
    );
    assert_eq!(
        response.header("USN"),
        Some(format!("{}::{}", UUID, MEDIA_SERVER).as_str())
    );
    assert!(response.header("DATE").is_some());
}

#[tokio::test]
async fn test_search_all_versus_exact_target() {
    let (ssdp, transport) = server(two_interfaces());
    ssdp.add_service(UUID, CONTENT_DIRECTORY);
    let from: SocketAddr = "192.168.1.77:1900".parse().unwrap();

    assert_eq!(ssdp.respond_to_search(&msearch("ssdp:all"), from).await, 4);
    assert_eq!(
        ssdp.respond_to_search(&msearch(CONTENT_DIRECTORY), from).await,
        1
    );
    assert_eq!(
        ssdp.respond_to_search(&msearch("urn:schemas-upnp-org:service:AVTransport:1"), from)
            .await,
        0
    );
    assert!(
        transport
            .sent()
            .iter()
            .all(|d| d.iface == Ipv4Addr::new(192, 168, 1, 10))
    );
}

#[tokio::test]
async fn test_malformed_datagram_is_ignored() {
    let (ssdp, transport) = server(two_interfaces());
    let from: SocketAddr = "192.168.1.77:1900".parse().unwrap();

    ssdp.handle_datagram(b"GARBAGE\r\n\r\n", from).await;
    ssdp.handle_datagram(b"M-SEARCH * HTTP/1.1\r\nMAN: \"ssdp:discover\"\r\n\r\n", from)
        .await;
    assert!(transport.sent().is_empty());

    ssdp.handle_datagram(
        b"M-SEARCH * HTTP/1.1\r\nHOST: 239.255.255.250:1900\r\nST: upnp:rootdevice\r\n\r\n",
        from,
    )
    .await;
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn test_service_on_unknown_device_is_ignored() {
    let (ssdp, _transport) = server(two_interfaces());
    ssdp.add_service("uuid:unknown", CONTENT_DIRECTORY);

    let entries = ssdp.entries();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].bindings.contains_key(CONTENT_DIRECTORY));
}
