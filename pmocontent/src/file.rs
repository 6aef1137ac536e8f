//! Fournisseur de fichiers locaux
//!
//! Les adresses `name:/chemin/relatif` désignent des fichiers sous un dossier
//! racine. Toute tentative de sortir de la racine est refusée.

use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::address::ContentAddress;
use crate::error::{ContentError, Result};
use crate::provider::{ByteSink, ByteStream, ContentProvider, WriteOptions};
use crate::range::{ReadRange, ReadSession};
use crate::stat::ContentStat;

pub const FILE_PROVIDER: &str = "file";

#[derive(Debug, Clone)]
pub struct FileContentProvider {
    name: String,
    root: PathBuf,
}

impl FileContentProvider {
    /// Fournisseur `file` enraciné dans `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_name(FILE_PROVIDER, root)
    }

    pub fn with_name(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    /// Adresse d'un chemin relatif à la racine.
    pub fn address(&self, relative: &str) -> ContentAddress {
        ContentAddress::new(
            self.name.clone(),
            format!("/{}", relative.trim_start_matches('/')),
        )
    }

    /// Chemin disque d'une adresse de ce fournisseur.
    fn resolve(&self, address: &ContentAddress) -> Result<PathBuf> {
        if address.provider() != self.name {
            return Err(ContentError::InvalidAddress(address.to_string()));
        }

        let mut path = self.root.clone();
        for component in Path::new(address.path().trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => return Err(ContentError::InvalidAddress(address.to_string())),
            }
        }
        Ok(path)
    }

    fn not_found(address: &ContentAddress, e: std::io::Error) -> ContentError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ContentError::NotFound(address.to_string())
        } else {
            ContentError::Io(e)
        }
    }
}

fn child_path(parent: &str, name: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), name)
}

#[async_trait]
impl ContentProvider for FileContentProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> ContentAddress {
        self.address("/")
    }

    async fn readdir(&self, address: &ContentAddress) -> Result<Vec<ContentAddress>> {
        let dir = self.resolve(address)?;
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| Self::not_found(address, e))?;

        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            children.push(address.with_path(child_path(address.path(), &name)));
        }
        children.sort();
        debug!("📁 {} entries in {}", children.len(), address);
        Ok(children)
    }

    async fn stat(&self, address: &ContentAddress) -> Result<ContentStat> {
        let path = self.resolve(address)?;
        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| Self::not_found(address, e))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let stat = if metadata.is_dir() {
            ContentStat::directory(name, address.clone())
        } else {
            ContentStat::file(name, metadata.len(), address.clone())
        };

        Ok(match metadata.modified() {
            Ok(modified) => stat.with_mod_time(DateTime::<Utc>::from(modified)),
            Err(_) => stat,
        })
    }

    async fn create_read_stream(
        &self,
        session: &ReadSession,
        address: &ContentAddress,
        range: Option<ReadRange>,
    ) -> Result<ByteStream> {
        let path = self.resolve(address)?;
        let mut file = fs::File::open(&path)
            .await
            .map_err(|e| Self::not_found(address, e))?;

        debug!(
            requester = ?session.requester,
            "📖 Reading {} ({:?})",
            address,
            range
        );

        let stream = match range {
            Some(range) => {
                let total = file.metadata().await?.len();
                file.seek(SeekFrom::Start(range.start)).await?;
                ReaderStream::new(file.take(range.len(total))).boxed()
            }
            None => ReaderStream::new(file).boxed(),
        };
        Ok(stream.map_err(ContentError::from).boxed())
    }

    async fn create_write_stream(
        &self,
        address: &ContentAddress,
        options: WriteOptions,
    ) -> Result<ByteSink> {
        let path = self.resolve(address)?;
        if options.create_parents {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(options.append)
            .truncate(!options.append)
            .open(&path)
            .await?;
        Ok(Box::pin(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rejects_escape() {
        let provider = FileContentProvider::new("/srv/media");
        assert_eq!(
            provider.resolve(&provider.address("music/a.flac")).unwrap(),
            PathBuf::from("/srv/media/music/a.flac")
        );
        assert!(matches!(
            provider.resolve(&provider.address("../etc/passwd")),
            Err(ContentError::InvalidAddress(_))
        ));
        assert!(matches!(
            provider.resolve(&ContentAddress::new("cloud", "/a")),
            Err(ContentError::InvalidAddress(_))
        ));
    }
}
