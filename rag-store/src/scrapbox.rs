//! Scrapbox page source.
//!
//! Lists page titles through `/api/pages/{project}` (paginated with
//! `limit`/`skip`) and fetches each page's lines through
//! `/api/pages/{project}/{title}`.

use std::time::{Duration, Instant};

use reqwest::{Client, Url, header};
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use crate::config::IngestConfig;
use crate::errors::RagError;
use crate::record::SourcePage;

const DEFAULT_PAGE_LIMIT: usize = 1000;

pub struct ScrapboxClient {
    client: Client,
    base: Url,
    project: String,
    page_limit: usize,
}

#[derive(Deserialize)]
struct PageList {
    #[serde(default)]
    count: usize,
    #[serde(default)]
    pages: Vec<PageMeta>,
}

#[derive(Deserialize)]
struct PageMeta {
    title: String,
}

impl ScrapboxClient {
    pub fn new(cfg: &IngestConfig) -> Result<Self, RagError> {
        let base = Url::parse(cfg.scrapbox_base.trim())
            .map_err(|e| RagError::Config(format!("invalid SCRAPBOX_BASE_URL: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(RagError::Config("SCRAPBOX_BASE_URL cannot be a base URL".into()));
        }

        let mut headers = header::HeaderMap::new();
        if let Some(sid) = &cfg.sid {
            let cookie = header::HeaderValue::from_str(&format!("connect.sid={sid}"))
                .map_err(|e| RagError::Config(format!("invalid SCRAPBOX_SID: {e}")))?;
            headers.insert(header::COOKIE, cookie);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base,
            project: cfg.project.clone(),
            page_limit: DEFAULT_PAGE_LIMIT,
        })
    }

    /// Overrides the listing page size.
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    /// `{base}/api/pages/{project}[/{title}]`, each segment percent-encoded.
    fn pages_url(&self, title: Option<&str>) -> Result<Url, RagError> {
        let mut url = self.base.clone();
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|_| RagError::Config("SCRAPBOX_BASE_URL cannot be a base URL".into()))?;
            segs.pop_if_empty().extend(["api", "pages", self.project.as_str()]);
            if let Some(t) = title {
                segs.push(t);
            }
        }
        Ok(url)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Result<T, RagError> {
        let started = Instant::now();
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.trim().chars().take(200).collect();
            error!(%status, %url, %snippet, latency_ms = started.elapsed().as_millis(), "scrapbox request failed");
            return Err(RagError::Source(format!("HTTP {status} from {url}")));
        }
        resp.json::<T>()
            .await
            .map_err(|e| RagError::Decode(format!("scrapbox response from {url}: {e}")))
    }

    /// All page titles of the project, in listing order.
    #[instrument(skip_all, fields(project = %self.project))]
    pub async fn list_titles(&self) -> Result<Vec<String>, RagError> {
        let mut titles = Vec::new();
        let mut skip = 0usize;
        loop {
            let mut url = self.pages_url(None)?;
            url.query_pairs_mut()
                .append_pair("limit", &self.page_limit.to_string())
                .append_pair("skip", &skip.to_string());

            let list: PageList = self.get_json(url).await?;
            let got = list.pages.len();
            titles.extend(list.pages.into_iter().map(|p| p.title));
            skip += got;
            debug!(got, total = list.count, "listed pages");

            if got == 0 || skip >= list.count {
                break;
            }
        }
        Ok(titles)
    }

    pub async fn fetch_page(&self, title: &str) -> Result<SourcePage, RagError> {
        self.get_json(self.pages_url(Some(title))?).await
    }

    /// Fetches every page. A page that fails to load is logged and skipped;
    /// only a listing failure is fatal.
    pub async fn fetch_all(&self) -> Result<Vec<SourcePage>, RagError> {
        info!("Fetching all pages from Scrapbox project: {}", self.project);
        let titles = self.list_titles().await?;

        let mut pages = Vec::with_capacity(titles.len());
        for title in &titles {
            match self.fetch_page(title).await {
                Ok(page) => pages.push(page),
                Err(e) => warn!(%title, error = %e, "failed to fetch page, skipping"),
            }
        }
        info!("Retrieved {} of {} pages", pages.len(), titles.len());
        Ok(pages)
    }

    /// Public page URL: `https://scrapbox.io/{project}/{title}` with the title percent-encoded.
    pub fn page_url(project: &str, title: &str) -> Result<String, RagError> {
        let mut url = Url::parse("https://scrapbox.io/")
            .map_err(|e| RagError::Config(format!("page url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| RagError::Config("page url cannot be a base".into()))?
            .pop_if_empty()
            .push(project)
            .push(title);
        Ok(url.to_string())
    }
}
