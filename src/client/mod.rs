//! Content API clients
//!
//! [`ContentClient`] is the seam between the page controllers and the CMS.
//! [`PrismicClient`] talks to the Prismic REST API; [`InMemoryClient`] serves
//! fixture documents for offline rendering and tests.

mod memory;
mod prismic;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

use crate::content::RawDocument;
use crate::error::Result;

pub use memory::InMemoryClient;
pub use prismic::PrismicClient;

/// A document query: type predicate, field projection and page size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub document_type: String,
    /// Fields to fetch (`type.field`); empty means every field
    pub fetch: Vec<String>,
    /// Results per page; `None` leaves the CMS default
    pub page_size: Option<u32>,
}

impl Query {
    /// Query every document of a type
    pub fn documents(document_type: &str) -> Self {
        Self {
            document_type: document_type.to_string(),
            fetch: Vec::new(),
            page_size: None,
        }
    }

    /// Restrict the fields returned for each document
    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// One page of a search response, as sent by the CMS
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results_size: u32,
    /// Absolute URL of the following page, `None` on the last page
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub results: Vec<RawDocument>,
}

/// Client to the headless CMS
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Run a query and return its first page
    async fn query(&self, query: &Query) -> Result<ApiPage>;

    /// Fetch the page behind a cursor previously returned by this client
    async fn next_page(&self, cursor: &str) -> Result<ApiPage>;

    /// Fetch one document by uid; fails with `NotFound` when absent
    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<RawDocument>;
}

/// Query shape of the index listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostListing {}

/// Query shape of the known-uid enumeration used for pre-rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownIds {}

/// Opaque "continue from here" token for a query of shape `Q`
///
/// The token is only ever handed back to [`ContentClient::next_page`]. The
/// shape parameter keeps cursors of different queries apart.
pub struct Cursor<Q> {
    token: String,
    shape: PhantomData<fn() -> Q>,
}

impl<Q> Cursor<Q> {
    pub(crate) fn new(token: String) -> Self {
        Self {
            token,
            shape: PhantomData,
        }
    }

    /// The token to re-submit, verbatim
    pub fn as_str(&self) -> &str {
        &self.token
    }
}

impl<Q> Clone for Cursor<Q> {
    fn clone(&self) -> Self {
        Self::new(self.token.clone())
    }
}

impl<Q> PartialEq for Cursor<Q> {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl<Q> Eq for Cursor<Q> {}

impl<Q> fmt::Debug for Cursor<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.token).finish()
    }
}

impl<Q> Serialize for Cursor<Q> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token)
    }
}

impl<'de, Q> Deserialize<'de> for Cursor<Q> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Items of one page plus the cursor to the next page
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T, Q> {
    pub items: Vec<T>,
    /// `None` exactly when no further pages exist
    pub next_page: Option<Cursor<Q>>,
}

impl<T, Q> PageResult<T, Q> {
    /// Map the documents of a raw page, keeping its cursor
    pub fn from_api<F>(page: ApiPage, map: F) -> Self
    where
        F: FnMut(&RawDocument) -> T,
    {
        Self {
            items: page.results.iter().map(map).collect(),
            next_page: page.next_page.map(Cursor::new),
        }
    }

    pub fn has_next(&self) -> bool {
        self.next_page.is_some()
    }
}
