//! Extension de `pmoconfig::Config` pour les partages de contenu

use std::path::PathBuf;

use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::{Mapping, Value};

/// Dossier local partagé par le serveur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareConfig {
    pub name: String,
    pub path: PathBuf,
}

/// Trait d'extension pour la section `content`
///
/// ```yaml
/// content:
///   shares:
///     - /srv/music                      # nom = dernier composant
///     - { name: Films, path: videos }   # relatif au dossier de config
/// ```
pub trait ContentConfigExt {
    fn get_content_shares(&self) -> Vec<ShareConfig>;

    fn add_content_share(&self, name: &str, path: &str) -> Result<()>;
}

impl ContentConfigExt for Config {
    fn get_content_shares(&self) -> Vec<ShareConfig> {
        let Ok(Value::Sequence(entries)) = self.get_value(&["content", "shares"]) else {
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(|entry| {
                let (name, path) = match entry {
                    Value::String(path) => (None, path.clone()),
                    Value::Mapping(map) => (
                        map.get("name").and_then(Value::as_str).map(str::to_string),
                        map.get("path").and_then(Value::as_str)?.to_string(),
                    ),
                    _ => return None,
                };

                let mut path = PathBuf::from(path);
                if path.is_relative() {
                    path = self.config_dir().join(path);
                }
                let name = name.or_else(|| {
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                })?;
                Some(ShareConfig { name, path })
            })
            .collect()
    }

    fn add_content_share(&self, name: &str, path: &str) -> Result<()> {
        let mut entries = match self.get_value(&["content", "shares"]) {
            Ok(Value::Sequence(entries)) => entries,
            _ => Vec::new(),
        };

        let mut share = Mapping::new();
        share.insert(Value::from("name"), Value::from(name));
        share.insert(Value::from("path"), Value::from(path));
        entries.push(Value::Mapping(share));

        self.set_value(&["content", "shares"], Value::Sequence(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shares_from_yaml() {
        let config = Config::in_memory(
            "content:\n  shares:\n    - /srv/music\n    - { name: Films, path: /srv/videos }\n",
        )
        .unwrap();

        let shares = config.get_content_shares();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].name, "music");
        assert_eq!(shares[1].name, "Films");
        assert_eq!(shares[1].path, PathBuf::from("/srv/videos"));

        config.add_content_share("Photos", "/srv/photos").unwrap();
        assert_eq!(config.get_content_shares().len(), 3);
    }
}
