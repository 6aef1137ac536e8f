/// Intervalle d'octets à lire, fin incluse (sémantique HTTP `Range`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRange {
    pub start: u64,
    /// Dernier octet inclus ; `None` = jusqu'à la fin
    pub end: Option<u64>,
}

impl ReadRange {
    pub fn new(start: u64, end: Option<u64>) -> Self {
        Self { start, end }
    }

    /// Analyse un en-tête `Range: bytes=a-b` (un seul intervalle).
    ///
    /// Les suffixes (`bytes=-500`) sont convertis à partir de `total`.
    pub fn from_header(value: &str, total: u64) -> Option<Self> {
        let spec = value.trim().strip_prefix("bytes=")?;
        if spec.contains(',') {
            return None;
        }
        let (start, end) = spec.split_once('-')?;
        let (start, end) = (start.trim(), end.trim());

        if start.is_empty() {
            let suffix: u64 = end.parse().ok()?;
            if suffix == 0 || total == 0 {
                return None;
            }
            return Some(Self::new(total.saturating_sub(suffix), Some(total - 1)));
        }

        let start: u64 = start.parse().ok()?;
        let end = if end.is_empty() {
            None
        } else {
            Some(end.parse::<u64>().ok()?)
        };
        match end {
            Some(end) if end < start => None,
            _ => Some(Self::new(start, end)),
        }
    }

    /// Dernier octet effectif pour une ressource de `total` octets.
    pub fn last_byte(&self, total: u64) -> u64 {
        let last = total.saturating_sub(1);
        self.end.map_or(last, |end| end.min(last))
    }

    /// Nombre d'octets couverts pour une ressource de `total` octets.
    pub fn len(&self, total: u64) -> u64 {
        if self.start >= total {
            0
        } else {
            self.last_byte(total) - self.start + 1
        }
    }

    pub fn is_satisfiable(&self, total: u64) -> bool {
        self.start < total
    }

    /// Valeur d'en-tête `Range` pour une requête sortante.
    pub fn to_header(&self) -> String {
        match self.end {
            Some(end) => format!("bytes={}-{}", self.start, end),
            None => format!("bytes={}-", self.start),
        }
    }

    /// Valeur d'en-tête `Content-Range` d'une réponse 206.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.last_byte(total), total)
    }
}

/// Contexte d'une lecture, conservé pour les logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSession {
    pub requester: Option<String>,
    pub user_agent: Option<String>,
}

impl ReadSession {
    pub fn new(requester: impl Into<String>) -> Self {
        Self {
            requester: Some(requester.into()),
            user_agent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_header_forms() {
        assert_eq!(
            ReadRange::from_header("bytes=0-99", 1000),
            Some(ReadRange::new(0, Some(99)))
        );
        assert_eq!(
            ReadRange::from_header("bytes=500-", 1000),
            Some(ReadRange::new(500, None))
        );
        assert_eq!(
            ReadRange::from_header("bytes=-100", 1000),
            Some(ReadRange::new(900, Some(999)))
        );
        assert_eq!(ReadRange::from_header("bytes=9-3", 1000), None);
        assert_eq!(ReadRange::from_header("bytes=0-1,5-6", 1000), None);
        assert_eq!(ReadRange::from_header("items=0-1", 1000), None);
    }

    #[test]
    fn test_range_length_clamped_to_total() {
        let range = ReadRange::new(900, Some(5000));
        assert_eq!(range.len(1000), 100);
        assert_eq!(range.content_range(1000), "bytes 900-999/1000");
        assert!(!ReadRange::new(1000, None).is_satisfiable(1000));
        assert_eq!(ReadRange::new(2, None).to_header(), "bytes=2-");
    }
}
