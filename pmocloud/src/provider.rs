//! Fournisseur de contenu adossé à une API de stockage distante
//!
//! - toutes les requêtes passent par une file de `concurrency` places
//! - chaque listing alimente un cache `adresse → ContentStat`
//! - un premier `403` désactive définitivement le fournisseur
//! - les lectures suivent les redirections `302` dans la limite
//!   de `max_redirects`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use moka::future::Cache;
use pmocontent::{
    ByteSink, ByteStream, ContentAddress, ContentError, ContentProvider, ContentStat, ReadRange,
    ReadSession, Result, WriteOptions,
};
use reqwest::header::{LOCATION, RANGE};
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode, Url};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::CloudConfig;
use crate::listing::{EntryKind, parse_listing};
use crate::path::CloudPath;

pub struct CloudProvider {
    config: CloudConfig,
    client: Client,
    queue: Arc<Semaphore>,
    cache: Cache<String, ContentStat>,
    bad_credentials: AtomicBool,
}

impl CloudProvider {
    /// Crée le fournisseur ; un jeton ou une URL manquante est une erreur de
    /// configuration.
    pub fn new(config: CloudConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(ContentError::Configuration(format!(
                "no base URL for provider '{}'",
                config.name
            )));
        }
        if config.token.is_empty() {
            return Err(ContentError::Configuration(format!(
                "no credentials for provider '{}'",
                config.name
            )));
        }
        if config.concurrency == 0 {
            return Err(ContentError::Configuration(
                "concurrency must be at least 1".to_string(),
            ));
        }

        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ContentError::Configuration(e.to_string()))?;

        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(config.cache_ttl)
            .build();

        info!(
            "✅ Cloud provider '{}' on {} (concurrency {})",
            config.name, config.base_url, config.concurrency
        );

        Ok(Self {
            queue: Arc::new(Semaphore::new(config.concurrency)),
            client,
            cache,
            bad_credentials: AtomicBool::new(false),
            config,
        })
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// Vrai dès qu'un `403` a été reçu ; l'état ne revient jamais à faux.
    ///
    /// Toutes les opérations échouent alors en `Authentication`, y compris
    /// celles servies par le cache.
    pub fn has_bad_credentials(&self) -> bool {
        self.bad_credentials.load(Ordering::SeqCst)
    }

    /// Places libres dans la file de requêtes.
    pub fn available_slots(&self) -> usize {
        self.queue.available_permits()
    }

    pub fn address(&self, path: &CloudPath) -> ContentAddress {
        ContentAddress::new(self.config.name.clone(), path.to_string())
    }

    fn cloud_path(&self, address: &ContentAddress) -> Result<CloudPath> {
        if address.provider() != self.config.name {
            return Err(ContentError::InvalidAddress(address.to_string()));
        }
        CloudPath::parse(address.path())
            .ok_or_else(|| ContentError::InvalidAddress(address.to_string()))
    }

    fn ensure_credentials(&self) -> Result<()> {
        if self.has_bad_credentials() {
            return Err(ContentError::Authentication(format!(
                "credentials for '{}' were rejected",
                self.config.name
            )));
        }
        Ok(())
    }

    fn url(&self, path: &str, address: &ContentAddress) -> Result<Url> {
        Url::parse(&format!("{}{}", self.config.base_url, path)).map_err(|e| {
            ContentError::Transport {
                address: address.to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Requête GET authentifiée, admise par la file.
    ///
    /// Le disjoncteur est vérifié avant et après l'attente d'une place : un
    /// `403` reçu pendant l'attente bloque aussi les requêtes en file.
    async fn send(
        &self,
        url: Url,
        address: &ContentAddress,
        range: Option<ReadRange>,
    ) -> Result<Response> {
        self.ensure_credentials()?;
        let _permit = self
            .queue
            .acquire()
            .await
            .map_err(|e| ContentError::Transport {
                address: address.to_string(),
                message: e.to_string(),
            })?;
        self.ensure_credentials()?;

        debug!("📡 GET {}", url);
        let mut request = self.client.get(url).bearer_auth(&self.config.token);
        if let Some(range) = range {
            request = request.header(RANGE, range.to_header());
        }

        let response = request.send().await.map_err(|e| ContentError::Transport {
            address: address.to_string(),
            message: e.to_string(),
        })?;

        if response.status() == StatusCode::FORBIDDEN {
            self.bad_credentials.store(true, Ordering::SeqCst);
            warn!(
                "❌ Credentials rejected by {}, provider '{}' disabled",
                self.config.base_url, self.config.name
            );
            return Err(ContentError::Authentication(format!(
                "403 while accessing {}",
                address
            )));
        }
        Ok(response)
    }

    /// Liste un dossier distant et met en cache chaque enfant.
    async fn list_folder(
        &self,
        folder_id: &str,
        address: &ContentAddress,
    ) -> Result<Vec<ContentStat>> {
        let url = self.url(&format!("/folders/{}/children", folder_id), address)?;
        let response = self.send(url, address, None).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                code: status.as_u16(),
                address: address.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| ContentError::Transport {
            address: address.to_string(),
            message: e.to_string(),
        })?;

        let mut stats = Vec::new();
        for entry in parse_listing(&body)? {
            let path = match entry.kind {
                EntryKind::Folder => CloudPath::Folder {
                    parent: folder_id.to_string(),
                    id: entry.id.clone(),
                },
                EntryKind::File => CloudPath::File {
                    parent: folder_id.to_string(),
                    id: entry.id.clone(),
                },
            };
            let stat = entry.into_stat(self.address(&path));
            self.cache.insert(stat.address.to_string(), stat.clone()).await;
            stats.push(stat);
        }

        debug!("📁 {} entries in {}", stats.len(), address);
        Ok(stats)
    }

    fn root_stat(&self) -> ContentStat {
        ContentStat::directory(self.config.name.clone(), self.root())
    }
}

impl std::fmt::Debug for CloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudProvider")
            .field("name", &self.config.name)
            .field("base_url", &self.config.base_url)
            .field("bad_credentials", &self.has_bad_credentials())
            .finish()
    }
}

#[async_trait]
impl ContentProvider for CloudProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn root(&self) -> ContentAddress {
        self.address(&CloudPath::Root)
    }

    async fn readdir(&self, address: &ContentAddress) -> Result<Vec<ContentAddress>> {
        self.ensure_credentials()?;
        let path = self.cloud_path(address)?;
        let Some(folder_id) = path.folder_id() else {
            return Err(ContentError::Unsupported(format!(
                "{} is not a directory",
                address
            )));
        };

        let stats = self.list_folder(folder_id, address).await?;
        Ok(stats.into_iter().map(|stat| stat.address).collect())
    }

    async fn stat(&self, address: &ContentAddress) -> Result<ContentStat> {
        self.ensure_credentials()?;
        let path = self.cloud_path(address)?;
        let Some(parent) = path.parent() else {
            return Ok(self.root_stat());
        };

        let resolved = self.address(&path);
        let key = resolved.to_string();
        if let Some(stat) = self.cache.get(&key).await {
            debug!("Cache hit for {}", key);
            return Ok(stat);
        }

        self.list_folder(parent, address)
            .await?
            .into_iter()
            .find(|stat| stat.address == resolved)
            .ok_or(ContentError::NotFound(key))
    }

    async fn create_read_stream(
        &self,
        session: &ReadSession,
        address: &ContentAddress,
        range: Option<ReadRange>,
    ) -> Result<ByteStream> {
        self.ensure_credentials()?;
        let CloudPath::File { id, .. } = self.cloud_path(address)? else {
            return Err(ContentError::Unsupported(format!(
                "{} is not a file",
                address
            )));
        };

        debug!(
            requester = ?session.requester,
            "📖 Reading {} ({:?})",
            address,
            range
        );

        let mut url = self.url(&format!("/files/{}/content", id), address)?;
        let mut hops = 0;
        loop {
            let response = self.send(url.clone(), address, range).await?;
            let status = response.status();

            if status == StatusCode::FOUND {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|location| url.join(location).ok());

                let Some(location) = location.filter(|location| *location != url) else {
                    warn!("⚠️ Unusable redirect for {} at {}", address, url);
                    return Err(ContentError::Status {
                        code: status.as_u16(),
                        address: address.to_string(),
                    });
                };

                if hops == self.config.max_redirects {
                    return Err(ContentError::TooManyRedirects {
                        address: address.to_string(),
                        hops,
                    });
                }
                hops += 1;
                debug!("Redirect {} for {}: {}", hops, address, location);
                url = location;
                continue;
            }

            if !status.is_success() {
                return Err(ContentError::Status {
                    code: status.as_u16(),
                    address: address.to_string(),
                });
            }

            let origin = address.to_string();
            return Ok(response
                .bytes_stream()
                .map(move |chunk| {
                    chunk.map_err(|e| ContentError::Transport {
                        address: origin.clone(),
                        message: e.to_string(),
                    })
                })
                .boxed());
        }
    }

    async fn create_write_stream(
        &self,
        address: &ContentAddress,
        _options: WriteOptions,
    ) -> Result<ByteSink> {
        self.ensure_credentials()?;
        Err(ContentError::Unsupported(format!(
            "{} is read-only",
            address
        )))
    }
}
