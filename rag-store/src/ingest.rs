//! Ingestion pipeline: Scrapbox pages → chunks → sparse vectors → `_bulk` into the store.
//!
//! The index is dropped and recreated on every run. Pages that cannot be
//! fetched are skipped; encoding and store failures abort the batch.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use splade_encoder::{SparseEncoding, TermKeys};
use tracing::{debug, info};

use crate::chunker::ChunkSplitter;
use crate::config::IngestConfig;
use crate::errors::RagError;
use crate::record::{IndexedDocument, SourcePage};
use crate::scrapbox::ScrapboxClient;
use crate::store::PassageStore;

/// Turns one page into indexable documents.
pub struct Processor {
    encoder: Arc<dyn SparseEncoding>,
    splitter: ChunkSplitter,
    project: String,
    concurrency: usize,
}

impl Processor {
    pub fn new(encoder: Arc<dyn SparseEncoding>, cfg: &IngestConfig) -> Result<Self, RagError> {
        Ok(Self {
            encoder,
            splitter: ChunkSplitter::new(cfg.chunk_size, cfg.chunk_overlap)?,
            project: cfg.project.clone(),
            concurrency: cfg.encode_concurrency.max(1),
        })
    }

    /// One document per chunk with a non-empty vector, in chunk order.
    pub async fn process_page(&self, page: &SourcePage) -> Result<Vec<IndexedDocument>, RagError> {
        let url = ScrapboxClient::page_url(&self.project, &page.title)?;
        let updated = page.updated.saturating_mul(1000);
        let chunks = self.splitter.split(&page.full_text());
        let total = chunks.len();
        debug!(title = %page.title, chunks = total, "processing page");

        let encoder = &*self.encoder;
        let encoded: Vec<_> = stream::iter(chunks.into_iter().enumerate())
            .map(|(i, chunk)| async move {
                debug!("Encoding chunk {}/{} of page: {}", i + 1, total, page.title);
                let vector = encoder.encode(&chunk, TermKeys::Tokens).await?;
                Ok::<_, RagError>((chunk, vector))
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        Ok(encoded
            .into_iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(text, sparse_vector)| IndexedDocument {
                title: page.title.clone(),
                text,
                url: url.clone(),
                updated,
                sparse_vector,
            })
            .collect())
    }
}

/// Counters reported at the end of a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub pages: usize,
    pub documents: usize,
}

/// Full batch: recreate the index, fetch every page, index all chunks.
pub async fn run_batch(
    client: &ScrapboxClient,
    processor: &Processor,
    store: &dyn PassageStore,
    bulk_batch: usize,
) -> Result<IngestReport, RagError> {
    info!("Starting ingestion batch...");
    store.recreate_index().await?;

    let pages = client.fetch_all().await?;
    let report = index_pages(&pages, processor, store, bulk_batch).await?;

    info!(
        pages = report.pages,
        documents = report.documents,
        "Ingestion batch completed successfully."
    );
    Ok(report)
}

/// Processes pages in order and bulk-indexes documents in groups of
/// `bulk_batch`, flushing the remainder at the end.
pub async fn index_pages(
    pages: &[SourcePage],
    processor: &Processor,
    store: &dyn PassageStore,
    bulk_batch: usize,
) -> Result<IngestReport, RagError> {
    let batch = bulk_batch.max(1);

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-"),
    );

    let mut pending: Vec<IndexedDocument> = Vec::new();
    let mut report = IngestReport::default();

    for page in pages {
        pending.extend(processor.process_page(page).await?);
        report.pages += 1;
        pb.inc(1);

        while pending.len() >= batch {
            let docs: Vec<IndexedDocument> = pending.drain(..batch).collect();
            report.documents += store.bulk_index(&docs).await?;
        }
    }

    if !pending.is_empty() {
        report.documents += store.bulk_index(&pending).await?;
    }

    pb.finish_with_message("done");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inmemory::InMemoryStore;
    use crate::query::SparseQuery;
    use crate::record::{RankedPassage, SourceLine};
    use crate::store::StoreFuture;
    use axum::{Router, http::StatusCode, routing::get};
    use serde_json::json;
    use splade_encoder::{EncodeFuture, EncoderError, SparseVector};
    use std::sync::Mutex;

    /// One term per whitespace-separated word, weight 1.
    struct WordEncoder;

    impl SparseEncoding for WordEncoder {
        fn encode<'a>(&'a self, text: &'a str, _keys: TermKeys) -> EncodeFuture<'a> {
            Box::pin(async move {
                Ok(text.split_whitespace().map(|w| (w, 1.0f32)).collect::<SparseVector>())
            })
        }

        fn model_id(&self) -> &str {
            "words"
        }
    }

    /// Fails every call, like a model that cannot run.
    struct BrokenEncoder;

    impl SparseEncoding for BrokenEncoder {
        fn encode<'a>(&'a self, _text: &'a str, _keys: TermKeys) -> EncodeFuture<'a> {
            Box::pin(async { Err(EncoderError::Inference("session poisoned".into())) })
        }

        fn model_id(&self) -> &str {
            "broken"
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Call {
        Recreate,
        Bulk(usize),
    }

    /// Records store calls in order.
    #[derive(Default)]
    struct CallRecorder {
        calls: Mutex<Vec<Call>>,
    }

    impl CallRecorder {
        fn bulk_sizes(&self) -> Vec<usize> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter_map(|c| match c {
                    Call::Bulk(n) => Some(*n),
                    Call::Recreate => None,
                })
                .collect()
        }
    }

    impl PassageStore for CallRecorder {
        fn search<'a>(&'a self, _q: &'a SparseQuery) -> StoreFuture<'a, Vec<RankedPassage>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn recreate_index(&self) -> StoreFuture<'_, ()> {
            self.calls.lock().unwrap().push(Call::Recreate);
            Box::pin(async { Ok(()) })
        }

        fn bulk_index<'a>(&'a self, docs: &'a [IndexedDocument]) -> StoreFuture<'a, usize> {
            self.calls.lock().unwrap().push(Call::Bulk(docs.len()));
            Box::pin(async move { Ok(docs.len()) })
        }
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn scrapbox(base: String) -> ScrapboxClient {
        ScrapboxClient::new(&IngestConfig {
            project: "proj".into(),
            scrapbox_base: base,
            ..IngestConfig::default()
        })
        .unwrap()
    }

    fn page(title: &str, lines: &[&str]) -> SourcePage {
        SourcePage {
            title: title.into(),
            updated: 1_700_000_000,
            lines: lines.iter().map(|t| SourceLine { text: (*t).into() }).collect(),
        }
    }

    fn processor(size: usize, overlap: usize) -> Processor {
        let cfg = IngestConfig {
            chunk_size: size,
            chunk_overlap: overlap,
            project: "proj".into(),
            ..IngestConfig::default()
        };
        Processor::new(Arc::new(WordEncoder), &cfg).unwrap()
    }

    fn broken_processor() -> Processor {
        let cfg = IngestConfig {
            project: "proj".into(),
            ..IngestConfig::default()
        };
        Processor::new(Arc::new(BrokenEncoder), &cfg).unwrap()
    }

    #[tokio::test]
    async fn page_becomes_ordered_documents_with_metadata() {
        let p = processor(4, 0);
        let docs = p.process_page(&page("東京 天気", &["aaa", "bbb"])).await.unwrap();

        // "aaa\nbbb" -> "aaa\n", "bbb"
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["aaa\n", "bbb"]);
        assert!(docs.iter().all(|d| d.updated == 1_700_000_000_000));
        assert_eq!(
            docs[0].url,
            "https://scrapbox.io/proj/%E6%9D%B1%E4%BA%AC%20%E5%A4%A9%E6%B0%97"
        );
        assert_eq!(docs[1].sparse_vector.get("bbb"), Some(1.0));
    }

    #[tokio::test]
    async fn chunks_with_empty_vectors_are_skipped() {
        let p = processor(3, 0);
        // "ab\n  \ncd" -> "ab\n", "  \n", "cd"
        let docs = p.process_page(&page("t", &["ab", "  ", "cd"])).await.unwrap();
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["ab\n", "cd"]);
    }

    #[tokio::test]
    async fn empty_page_yields_nothing() {
        let p = processor(10, 2);
        assert!(p.process_page(&page("t", &[])).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn documents_are_bulk_indexed_in_fixed_batches_plus_remainder() {
        let p = processor(2, 0);
        // 3 pages × 3 chunks each = 9 docs
        let pages: Vec<_> = (0..3).map(|i| page(&i.to_string(), &["a b c"])).collect();
        let store = CallRecorder::default();

        let report = index_pages(&pages, &p, &store, 4).await.unwrap();

        assert_eq!(report, IngestReport { pages: 3, documents: 9 });
        assert_eq!(store.bulk_sizes(), vec![4, 4, 1]);
    }

    #[tokio::test]
    async fn indexed_chunks_are_searchable() {
        let p = processor(100, 10);
        let store = InMemoryStore::new();
        index_pages(&[page("weather", &["tokyo sunny"]), page("food", &["sushi"])], &p, &store, 50)
            .await
            .unwrap();

        let v: SparseVector = vec![("sunny", 1.0)].into_iter().collect();
        let hits = crate::retrieve::search_by_vector(&store, &v, 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "weather");
    }

    #[tokio::test]
    async fn encoding_failure_aborts_before_any_bulk_request() {
        let p = broken_processor();
        let err = p.process_page(&page("t", &["tokyo"])).await.unwrap_err();
        assert!(matches!(err, RagError::Encoding(EncoderError::Inference(_))));

        let store = CallRecorder::default();
        let err = index_pages(&[page("t", &["tokyo"])], &p, &store, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Encoding(_)));
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn batch_recreates_index_before_indexing() {
        let app = Router::new()
            .route(
                "/api/pages/{project}",
                get(|| async {
                    axum::Json(json!({"count": 2, "pages": [{"title": "a"}, {"title": "b"}]}))
                }),
            )
            .route(
                "/api/pages/{project}/{title}",
                get(|| async {
                    axum::Json(json!({
                        "title": "a",
                        "updated": 1_700_000_000,
                        "lines": [{"text": "tokyo sunny"}]
                    }))
                }),
            );
        let client = scrapbox(serve(app).await);
        let store = CallRecorder::default();

        let report = run_batch(&client, &processor(100, 10), &store, 50).await.unwrap();

        assert_eq!(report, IngestReport { pages: 2, documents: 2 });
        assert_eq!(*store.calls.lock().unwrap(), vec![Call::Recreate, Call::Bulk(2)]);
    }

    #[tokio::test]
    async fn listing_failure_aborts_batch_before_indexing() {
        let app = Router::new().route(
            "/api/pages/{project}",
            get(|| async { StatusCode::FORBIDDEN }),
        );
        let client = scrapbox(serve(app).await);
        let store = CallRecorder::default();

        let err = run_batch(&client, &processor(100, 10), &store, 50)
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::Source(_)));
        assert_eq!(*store.calls.lock().unwrap(), vec![Call::Recreate]);
    }
}
