use std::fmt;
use std::str::FromStr;

use crate::error::ContentError;

/// Adresse d'une ressource : `(fournisseur, chemin opaque)`.
///
/// La forme texte `fournisseur:chemin` sert aux logs et aux clés de cache.
/// Le chemin n'a de sens que pour le fournisseur qui l'a produit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentAddress {
    provider: String,
    path: String,
}

impl ContentAddress {
    pub fn new(provider: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            path: path.into(),
        }
    }

    /// Découpe `fournisseur:chemin` sur le premier `:`.
    ///
    /// # Errors
    ///
    /// [`ContentError::InvalidAddress`] sans `:` ou avec un fournisseur vide.
    pub fn parse(s: &str) -> Result<Self, ContentError> {
        match s.split_once(':') {
            Some((provider, path)) if !provider.is_empty() => Ok(Self::new(provider, path)),
            _ => Err(ContentError::InvalidAddress(s.to_string())),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Même fournisseur, autre chemin.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self::new(self.provider.clone(), path)
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.path)
    }
}

impl FromStr for ContentAddress {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_first_colon() {
        let address = ContentAddress::parse("cloud:42/17?file=9:x").unwrap();
        assert_eq!(address.provider(), "cloud");
        assert_eq!(address.path(), "42/17?file=9:x");
        assert_eq!(address.to_string(), "cloud:42/17?file=9:x");
    }

    #[test]
    fn test_parse_rejects_missing_provider() {
        assert!(ContentAddress::parse("no-colon").is_err());
        assert!(ContentAddress::parse(":path").is_err());
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(ContentAddress::new("file", "/a"), ContentAddress::new("file", "/a"));
        assert_ne!(ContentAddress::new("file", "/a"), ContentAddress::new("cloud", "/a"));
    }
}
