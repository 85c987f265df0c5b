//! In-memory content client backed by fixture documents

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

use super::{ApiPage, ContentClient, Query};
use crate::content::RawDocument;
use crate::error::{BlogError, Result};

/// Page size the CMS applies when a query does not set one
const DEFAULT_PAGE_SIZE: u32 = 20;

const CURSOR_PREFIX: &str = "memory:";

/// Accepted fixture layouts: a bare document array or a saved search response
#[derive(Deserialize)]
#[serde(untagged)]
enum Fixture {
    Documents(Vec<RawDocument>),
    Page(ApiPage),
}

/// Serves a fixed set of documents in insertion order
#[derive(Debug, Clone, Default)]
pub struct InMemoryClient {
    documents: Vec<RawDocument>,
}

impl InMemoryClient {
    pub fn new(documents: Vec<RawDocument>) -> Self {
        Self { documents }
    }

    /// Load documents from a JSON fixture file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let documents = match serde_json::from_str::<Fixture>(&content)? {
            Fixture::Documents(documents) => documents,
            Fixture::Page(page) => page.results,
        };
        tracing::debug!(
            "Loaded {} fixture documents from {:?}",
            documents.len(),
            path.as_ref()
        );
        Ok(Self::new(documents))
    }

    pub fn documents(&self) -> &[RawDocument] {
        &self.documents
    }

    fn of_type<'a>(&'a self, document_type: &'a str) -> impl Iterator<Item = &'a RawDocument> {
        self.documents
            .iter()
            .filter(move |doc| doc.document_type == document_type)
    }

    fn total_pages(&self, document_type: &str, page_size: u32) -> u32 {
        let total = self.of_type(document_type).count() as u32;
        total.div_ceil(page_size.max(1))
    }

    /// Page `page` (1-based) of a type; callers keep `page` within `1..=total_pages`
    fn page(&self, document_type: &str, fetch: &[String], page: u32, page_size: u32) -> ApiPage {
        let matching: Vec<&RawDocument> = self.of_type(document_type).collect();

        let page_size = page_size.max(1);
        let total = matching.len() as u32;
        let total_pages = total.div_ceil(page_size);
        let start = (page.saturating_sub(1) as usize).saturating_mul(page_size as usize);

        let results = matching
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .map(|doc| project(doc, fetch))
            .collect();

        let next_page = (page < total_pages).then(|| {
            format!(
                "{}{}:{}:{}:{}",
                CURSOR_PREFIX,
                document_type,
                page + 1,
                page_size,
                fetch.join(",")
            )
        });

        ApiPage {
            page,
            total_pages,
            total_results_size: total,
            next_page,
            results,
        }
    }
}

#[async_trait]
impl ContentClient for InMemoryClient {
    async fn query(&self, query: &Query) -> Result<ApiPage> {
        Ok(self.page(
            &query.document_type,
            &query.fetch,
            1,
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        ))
    }

    async fn next_page(&self, cursor: &str) -> Result<ApiPage> {
        let invalid = || BlogError::invalid_cursor(cursor);

        let rest = cursor.strip_prefix(CURSOR_PREFIX).ok_or_else(invalid)?;
        let mut parts = rest.splitn(4, ':');
        let document_type = parts.next().ok_or_else(invalid)?;
        let page: u32 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let page_size: u32 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let fetch: Vec<String> = parts
            .next()
            .unwrap_or_default()
            .split(',')
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();

        if page == 0 || page > self.total_pages(document_type, page_size).max(1) {
            return Err(invalid());
        }

        Ok(self.page(document_type, &fetch, page, page_size))
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<RawDocument> {
        self.documents
            .iter()
            .find(|doc| doc.document_type == document_type && doc.uid.as_deref() == Some(uid))
            .cloned()
            .ok_or_else(|| BlogError::not_found(document_type, uid))
    }
}

/// Keep only the projected `type.field` entries of the data bag
fn project(doc: &RawDocument, fetch: &[String]) -> RawDocument {
    let mut doc = doc.clone();
    if fetch.is_empty() {
        return doc;
    }

    if let Value::Object(fields) = &mut doc.data {
        let prefix = format!("{}.", doc.document_type);
        fields.retain(|name, _| {
            fetch
                .iter()
                .any(|f| f.strip_prefix(&prefix) == Some(name.as_str()))
        });
    }
    doc
}
