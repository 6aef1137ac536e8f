//! Réponse JSON de `GET /folders/{id}/children`
//!
//! ```json
//! {"items": [
//!   {"id": 42, "name": "Albums", "type": "folder"},
//!   {"id": "7", "name": "a.flac", "type": "file", "size": 1024,
//!    "modified": "2024-05-01T10:00:00Z", "mime_type": "audio/flac"}
//! ]}
//! ```

use chrono::{DateTime, Utc};
use pmocontent::{ContentAddress, ContentError, ContentStat};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
struct Listing {
    items: Vec<RemoteEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEntry {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Les identifiants sont numériques ou textuels selon le backend.
fn opaque_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(id) => id,
        Id::Number(id) => id.to_string(),
    })
}

impl RemoteEntry {
    pub fn into_stat(self, address: ContentAddress) -> ContentStat {
        let mut stat = match self.kind {
            EntryKind::Folder => ContentStat::directory(self.name, address),
            EntryKind::File => {
                let mut stat = ContentStat::file(self.name, self.size, address);
                if let Some(mime_type) = self.mime_type {
                    stat.mime_type = mime_type;
                }
                stat
            }
        };
        stat.mod_time = self.modified;
        stat
    }
}

/// Décode un listing ; en cas d'échec le corps brut est conservé dans
/// l'erreur.
pub fn parse_listing(body: &str) -> Result<Vec<RemoteEntry>, ContentError> {
    serde_json::from_str::<Listing>(body)
        .map(|listing| listing.items)
        .map_err(|e| ContentError::Parse {
            message: e.to_string(),
            body: body.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing() {
        let entries = parse_listing(
            r#"{"items":[
                {"id":42,"name":"Albums","type":"folder"},
                {"id":"7","name":"a.flac","type":"file","size":1024,
                 "modified":"2024-05-01T10:00:00Z"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "42");
        assert_eq!(entries[0].kind, EntryKind::Folder);

        let stat = entries[1]
            .clone()
            .into_stat(ContentAddress::new("cloud", "root?file=7"));
        assert!(!stat.is_directory);
        assert_eq!(stat.size, 1024);
        assert_eq!(stat.mime_type, "audio/flac");
        assert!(stat.mod_time.is_some());
    }

    #[test]
    fn test_parse_error_keeps_body() {
        match parse_listing("<html>maintenance</html>") {
            Err(ContentError::Parse { body, .. }) => assert_eq!(body, "<html>maintenance</html>"),
            other => panic!("unexpected result: {:?}", other.map(|e| e.len())),
        }
    }
}
