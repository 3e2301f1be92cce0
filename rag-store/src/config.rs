//! Store and ingestion configuration.

use crate::errors::RagError;

/// Elasticsearch connection and index settings.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreConfig {
    /// Base URL, e.g. `http://localhost:9200`.
    pub url: String,
    /// Target index name.
    pub index: String,
    /// Optional API key (`Authorization: ApiKey <key>`).
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Analyzer for `text`/`title`. `kuromoji` needs the analysis-kuromoji plugin.
    pub text_analyzer: String,
}

impl StoreConfig {
    /// Creates a sane default config for a given endpoint and index name.
    pub fn new_default(url: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            index: index.into(),
            api_key: None,
            timeout_secs: 30,
            text_analyzer: "kuromoji".into(),
        }
    }

    /// `ELASTICSEARCH_URL`, `ELASTICSEARCH_INDEX`, `ELASTICSEARCH_API_KEY`,
    /// `ELASTICSEARCH_TIMEOUT_SECS`, `ELASTICSEARCH_TEXT_ANALYZER`.
    pub fn from_env() -> Result<Self, RagError> {
        let mut cfg = Self::new_default(
            env("ELASTICSEARCH_URL", "http://localhost:9200"),
            env("ELASTICSEARCH_INDEX", "scrapbox-pages"),
        );
        cfg.api_key = env_opt("ELASTICSEARCH_API_KEY");
        cfg.timeout_secs = parse("ELASTICSEARCH_TIMEOUT_SECS", 30)?;
        cfg.text_analyzer = env("ELASTICSEARCH_TEXT_ANALYZER", "kuromoji");
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        let url = self.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(RagError::Config(
                "ELASTICSEARCH_URL must start with http:// or https://".into(),
            ));
        }
        if self.index.trim().is_empty() {
            return Err(RagError::Config("index is empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(RagError::Config("timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}

/// Ingestion batch settings.
#[derive(Clone, Debug, PartialEq)]
pub struct IngestConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Documents per `_bulk` request.
    pub bulk_batch: usize,
    /// Chunks encoded concurrently per page.
    pub encode_concurrency: usize,
    pub project: String,
    /// `connect.sid` cookie for private projects.
    pub sid: Option<String>,
    /// Scrapbox origin; overridable for tests.
    pub scrapbox_base: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            bulk_batch: 50,
            encode_concurrency: 4,
            project: String::new(),
            sid: None,
            scrapbox_base: "https://scrapbox.io".into(),
        }
    }
}

impl IngestConfig {
    /// `CHUNK_SIZE`, `CHUNK_OVERLAP`, `BULK_BATCH_SIZE`, `ENCODE_CONCURRENCY`,
    /// `SCRAPBOX_PROJECT` (required), `SCRAPBOX_SID`, `SCRAPBOX_BASE_URL`.
    pub fn from_env() -> Result<Self, RagError> {
        let d = Self::default();
        let cfg = Self {
            chunk_size: parse("CHUNK_SIZE", d.chunk_size)?,
            chunk_overlap: parse("CHUNK_OVERLAP", d.chunk_overlap)?,
            bulk_batch: parse("BULK_BATCH_SIZE", d.bulk_batch)?,
            encode_concurrency: parse("ENCODE_CONCURRENCY", d.encode_concurrency)?,
            project: env_opt("SCRAPBOX_PROJECT")
                .ok_or_else(|| RagError::Config("SCRAPBOX_PROJECT is not set".into()))?,
            sid: env_opt("SCRAPBOX_SID"),
            scrapbox_base: env("SCRAPBOX_BASE_URL", &d.scrapbox_base),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("CHUNK_SIZE must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(
                "CHUNK_OVERLAP must be smaller than CHUNK_SIZE".into(),
            ));
        }
        if self.bulk_batch == 0 {
            return Err(RagError::Config("BULK_BATCH_SIZE must be > 0".into()));
        }
        if self.project.trim().is_empty() {
            return Err(RagError::Config("SCRAPBOX_PROJECT is empty".into()));
        }
        Ok(())
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, RagError> {
    match env_opt(key) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| RagError::Config(format!("{key} has invalid value {v:?}"))),
        None => Ok(default),
    }
}
