use std::time::Duration;

pub const DEFAULT_PROVIDER_NAME: &str = "cloud";
pub const DEFAULT_CONCURRENCY: usize = 2;
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);
pub const DEFAULT_MAX_REDIRECTS: usize = 8;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Paramètres du fournisseur distant
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// Nom du fournisseur dans les adresses (`cloud:…`)
    pub name: String,
    /// URL de l'API, sans `/` final
    pub base_url: String,
    /// Jeton porteur (`Authorization: Bearer …`)
    pub token: String,
    /// Nombre maximal de requêtes simultanées vers le backend
    pub concurrency: usize,
    pub cache_capacity: u64,
    pub cache_ttl: Duration,
    /// Nombre de redirections `302` suivies lors d'une lecture
    pub max_redirects: usize,
    pub timeout: Duration,
}

impl CloudConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: DEFAULT_PROVIDER_NAME.to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            concurrency: DEFAULT_CONCURRENCY,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: DEFAULT_CACHE_TTL,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }
}
