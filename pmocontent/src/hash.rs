//! Empreinte de contenu
//!
//! SHA-256 amorcé par la taille de la ressource, puis nourri par au plus
//! [`HASH_PREFIX_LIMIT`] premiers octets. Deux ressources de même début mais
//! de tailles différentes ont donc des empreintes distinctes.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use futures::StreamExt;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::provider::ByteStream;

/// Nombre maximal d'octets lus pour calculer une empreinte (1 Mio)
pub const HASH_PREFIX_LIMIT: u64 = 1024 * 1024;

/// Calcule l'empreinte d'une ressource de `size` octets lue depuis `stream`.
///
/// Le flux n'est consommé que jusqu'à [`HASH_PREFIX_LIMIT`] octets.
pub async fn hash_stream(mut stream: ByteStream, size: u64) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(size.to_string().as_bytes());

    let mut remaining = HASH_PREFIX_LIMIT as usize;
    while remaining > 0 {
        let Some(chunk) = stream.next().await else {
            break;
        };
        let chunk = chunk?;
        let take = chunk.len().min(remaining);
        hasher.update(&chunk[..take]);
        remaining -= take;
    }

    Ok(encode_digest(&hasher.finalize()))
}

/// Base64 sans `=` ni `/`, utilisable dans une URL.
pub fn encode_digest(digest: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;

    fn stream_of(chunks: Vec<Vec<u8>>) -> ByteStream {
        stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from(c)))).boxed()
    }

    #[tokio::test]
    async fn test_hash_is_deterministic() {
        let a = hash_stream(stream_of(vec![b"hello ".to_vec(), b"world".to_vec()]), 11)
            .await
            .unwrap();
        let b = hash_stream(stream_of(vec![b"hello world".to_vec()]), 11)
            .await
            .unwrap();
        assert_eq!(a, b);
        assert!(!a.contains('=') && !a.contains('/') && !a.contains('+'));
    }

    #[tokio::test]
    async fn test_same_prefix_different_size() {
        let prefix = vec![7u8; HASH_PREFIX_LIMIT as usize];
        let mut longer = prefix.clone();
        longer.extend_from_slice(b"tail");

        let short = hash_stream(stream_of(vec![prefix]), HASH_PREFIX_LIMIT)
            .await
            .unwrap();
        let long = hash_stream(stream_of(vec![longer]), HASH_PREFIX_LIMIT + 4)
            .await
            .unwrap();
        assert_ne!(short, long);
    }

    #[tokio::test]
    async fn test_only_first_mebibyte_is_read() {
        let mut a = vec![1u8; HASH_PREFIX_LIMIT as usize];
        let mut b = a.clone();
        a.extend_from_slice(b"AAAA");
        b.extend_from_slice(b"BBBB");

        let size = HASH_PREFIX_LIMIT + 4;
        assert_eq!(
            hash_stream(stream_of(vec![a]), size).await.unwrap(),
            hash_stream(stream_of(vec![b]), size).await.unwrap()
        );
    }
}
