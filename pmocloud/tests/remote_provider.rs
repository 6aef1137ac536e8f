use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::TryStreamExt;
use futures::future::join_all;
use mockito::{Matcher, Server, ServerGuard};
use pmocloud::{CloudConfig, CloudProvider};
use pmocontent::{
    ContentAddress, ContentError, ContentProvider, ReadRange, ReadSession, WriteOptions,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const ROOT_LISTING: &str = r#"{"items":[
    {"id":42,"name":"Albums","type":"folder"},
    {"id":"7","name":"intro.flac","type":"file","size":10,"modified":"2024-05-01T10:00:00Z"}
]}"#;

const ALBUM_LISTING: &str = r#"{"items":[
    {"id":"9","name":"track.mp3","type":"file","size":2048,"mime_type":"audio/mpeg"}
]}"#;

fn provider(server: &ServerGuard) -> CloudProvider {
    CloudProvider::new(CloudConfig::new(server.url(), "secret")).unwrap()
}

fn address(path: &str) -> ContentAddress {
    ContentAddress::new("cloud", path)
}

#[tokio::test]
async fn test_listing_populates_cache() {
    let mut server = Server::new_async().await;
    let listing = server
        .mock("GET", "/folders/root/children")
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ROOT_LISTING)
        .expect(1)
        .create_async()
        .await;

    let provider = provider(&server);
    let children = provider.readdir(&provider.root()).await.unwrap();
    assert_eq!(children, vec![address("root/42"), address("root?file=7")]);

    // Servi depuis le cache : aucune nouvelle requête
    let folder = provider.stat(&address("root/42")).await.unwrap();
    assert!(folder.is_directory);
    assert_eq!(folder.name, "Albums");

    let file = provider.stat(&address("root?file=7")).await.unwrap();
    assert_eq!(file.size, 10);
    assert_eq!(file.mime_type, "audio/flac");
    assert!(file.mod_time.is_some());
    let again = provider.stat(&address("root?file=7")).await.unwrap();
    assert_eq!(file, again);

    let root = provider.stat(&provider.root()).await.unwrap();
    assert!(root.is_directory);

    assert_eq!(provider.available_slots(), 2);
    listing.assert_async().await;
}

#[tokio::test]
async fn test_stat_relists_parent_on_cache_miss() {
    let mut server = Server::new_async().await;
    let listing = server
        .mock("GET", "/folders/42/children")
        .with_status(200)
        .with_body(ALBUM_LISTING)
        .expect(1)
        .create_async()
        .await;

    let provider = provider(&server);
    let stat = provider.stat(&address("42?file=9")).await.unwrap();
    assert_eq!(stat.name, "track.mp3");
    assert_eq!(stat.mime_type, "audio/mpeg");
    assert_eq!(stat.address, address("42?file=9"));

    provider.stat(&address("42?file=9")).await.unwrap();
    listing.assert_async().await;
}

#[tokio::test]
async fn test_stat_unknown_child_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/folders/42/children")
        .with_status(200)
        .with_body(ALBUM_LISTING)
        .create_async()
        .await;

    let provider = provider(&server);
    let error = provider.stat(&address("42?file=1000")).await.unwrap_err();
    assert!(matches!(error, ContentError::NotFound(_)));
}

#[tokio::test]
async fn test_forbidden_latches_circuit_breaker() {
    let mut server = Server::new_async().await;
    let listing = server
        .mock("GET", "/folders/root/children")
        .with_status(403)
        .expect(1)
        .create_async()
        .await;
    let content = server
        .mock("GET", "/files/7/content")
        .with_status(200)
        .with_body("data")
        .expect(0)
        .create_async()
        .await;

    let provider = provider(&server);
    let error = provider.readdir(&provider.root()).await.unwrap_err();
    assert!(error.is_auth_error());
    assert!(provider.has_bad_credentials());

    // Plus aucune requête, quelle que soit l'adresse
    let error = provider.readdir(&provider.root()).await.unwrap_err();
    assert!(error.is_auth_error());
    let error = provider
        .read_content(&address("root?file=7"))
        .await
        .unwrap_err();
    assert!(error.is_auth_error());
    let error = provider.stat(&address("other?file=1")).await.unwrap_err();
    assert!(error.is_auth_error());

    listing.assert_async().await;
    content.assert_async().await;
}

#[tokio::test]
async fn test_read_follows_redirect() {
    let mut server = Server::new_async().await;
    let redirect = server
        .mock("GET", "/files/7/content")
        .match_header("authorization", "Bearer secret")
        .with_status(302)
        .with_header("location", "/blobs/abc")
        .expect(1)
        .create_async()
        .await;
    let blob = server
        .mock("GET", "/blobs/abc")
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_body("hello cloud")
        .expect(1)
        .create_async()
        .await;

    let provider = provider(&server);
    let content = provider
        .read_content_to_string(&address("root?file=7"))
        .await
        .unwrap();
    assert_eq!(content, "hello cloud");

    redirect.assert_async().await;
    blob.assert_async().await;
}

#[tokio::test]
async fn test_self_redirect_is_a_status_error() {
    let mut server = Server::new_async().await;
    let redirect = server
        .mock("GET", "/files/7/content")
        .with_status(302)
        .with_header("location", "/files/7/content")
        .expect(1)
        .create_async()
        .await;

    let provider = provider(&server);
    let error = provider
        .read_content(&address("root?file=7"))
        .await
        .unwrap_err();
    assert!(matches!(error, ContentError::Status { code: 302, .. }));
    redirect.assert_async().await;
}

#[tokio::test]
async fn test_redirect_loop_hits_hop_limit() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/files/7/content")
        .with_status(302)
        .with_header("location", "/mirror/7")
        .create_async()
        .await;
    server
        .mock("GET", "/mirror/7")
        .with_status(302)
        .with_header("location", "/files/7/content")
        .create_async()
        .await;

    let provider =
        CloudProvider::new(CloudConfig::new(server.url(), "secret").with_max_redirects(2)).unwrap();
    let error = provider
        .read_content(&address("root?file=7"))
        .await
        .unwrap_err();
    assert!(matches!(error, ContentError::TooManyRedirects { hops: 2, .. }));
}

#[tokio::test]
async fn test_unexpected_status() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/files/7/content")
        .with_status(500)
        .create_async()
        .await;

    let provider = provider(&server);
    let error = provider
        .read_content(&address("root?file=7"))
        .await
        .unwrap_err();
    match error {
        ContentError::Status { code, address } => {
            assert_eq!(code, 500);
            assert_eq!(address, "cloud:root?file=7");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!provider.has_bad_credentials());
}

#[tokio::test]
async fn test_malformed_listing_keeps_body() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/folders/root/children")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let provider = provider(&server);
    match provider.readdir(&provider.root()).await {
        Err(ContentError::Parse { body, .. }) => assert_eq!(body, "<html>maintenance</html>"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_range_is_forwarded() {
    let mut server = Server::new_async().await;
    let content = server
        .mock("GET", "/files/7/content")
        .match_header("range", "bytes=2-5")
        .with_status(206)
        .with_body("2345")
        .expect(1)
        .create_async()
        .await;

    let provider = provider(&server);
    let chunks: Vec<_> = provider
        .create_read_stream(
            &ReadSession::new("192.168.1.20"),
            &address("root?file=7"),
            Some(ReadRange::new(2, Some(5))),
        )
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    let body: Vec<u8> = chunks.iter().flat_map(|chunk| chunk.to_vec()).collect();
    assert_eq!(body, b"2345");
    content.assert_async().await;
}

#[tokio::test]
async fn test_hash_reads_file_prefix() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/folders/root/children")
        .with_status(200)
        .with_body(ROOT_LISTING)
        .create_async()
        .await;
    let content = server
        .mock("GET", "/files/7/content")
        .match_header("range", Matcher::Exact("bytes=0-9".to_string()))
        .with_status(206)
        .with_body("0123456789")
        .expect(2)
        .create_async()
        .await;

    let provider = provider(&server);
    let file = address("root?file=7");
    let stat = provider.stat(&file).await.unwrap();
    let first = provider.compute_hash(&file, &stat).await.unwrap();
    let second = provider.compute_hash(&file, &stat).await.unwrap();
    assert_eq!(first, second);
    content.assert_async().await;
}

#[tokio::test]
async fn test_writes_and_directory_reads_are_unsupported() {
    let server = Server::new_async().await;
    let provider = provider(&server);

    let error = provider
        .create_write_stream(&address("root?file=7"), WriteOptions::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(error, ContentError::Unsupported(_)));

    let error = provider
        .read_content(&address("root/42"))
        .await
        .unwrap_err();
    assert!(matches!(error, ContentError::Unsupported(_)));
}

#[tokio::test]
async fn test_forbidden_blocks_cached_metadata() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/folders/root/children")
        .with_status(200)
        .with_body(ROOT_LISTING)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/folders/42/children")
        .with_status(403)
        .expect(1)
        .create_async()
        .await;

    let provider = provider(&server);
    provider.readdir(&provider.root()).await.unwrap();
    assert!(provider.readdir(&address("root/42")).await.unwrap_err().is_auth_error());

    // Le cache et la racine ne contournent pas le disjoncteur
    assert!(provider.stat(&address("root?file=7")).await.unwrap_err().is_auth_error());
    assert!(provider.stat(&provider.root()).await.unwrap_err().is_auth_error());
    let error = provider
        .create_write_stream(&address("root?file=7"), WriteOptions::default())
        .await
        .err()
        .unwrap();
    assert!(error.is_auth_error());
    assert!(provider.read_content(&address("root/42")).await.unwrap_err().is_auth_error());
    assert!(provider.readdir(&address("root?file=7")).await.unwrap_err().is_auth_error());
}

/// Serveur HTTP minimal qui retarde chaque réponse et mesure le nombre
/// maximal de requêtes traitées simultanément.
async fn counting_server(delay: Duration) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let max = peak.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let in_flight = in_flight.clone();
            let peak = max.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);

                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
                    )
                    .await;
            });
        }
    });

    (url, peak)
}

#[tokio::test]
async fn test_queue_bounds_concurrent_requests() {
    let (url, peak) = counting_server(Duration::from_millis(100)).await;
    let provider = CloudProvider::new(CloudConfig::new(url, "secret")).unwrap();
    assert_eq!(provider.config().concurrency, 2);

    let files: Vec<ContentAddress> = (1..=6)
        .map(|id| address(&format!("root?file={}", id)))
        .collect();
    let results = join_all(files.iter().map(|file| provider.read_content(file))).await;

    for result in results {
        assert_eq!(result.unwrap().as_ref(), b"ok");
    }
    assert_eq!(peak.load(Ordering::SeqCst), 2);
    assert_eq!(provider.available_slots(), 2);
}
