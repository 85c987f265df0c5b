//! Detail page: resolve a post uid to its full content

use std::sync::Arc;

use crate::cache::RevalidationCache;
use crate::client::{ContentClient, KnownIds, PageResult, Query};
use crate::content::PostDetail;
use crate::error::Result;

/// Resolves post uids, reusing resolutions for the revalidation window
///
/// The cache belongs to the hosting layer (server or generator) and is
/// shared with whoever else needs to see fresh detail pages.
pub struct DetailPageController {
    client: Arc<dyn ContentClient>,
    cache: Arc<RevalidationCache<PostDetail>>,
    document_type: String,
}

impl DetailPageController {
    pub fn new(
        client: Arc<dyn ContentClient>,
        cache: Arc<RevalidationCache<PostDetail>>,
        document_type: &str,
    ) -> Self {
        Self {
            client,
            cache,
            document_type: document_type.to_string(),
        }
    }

    /// Uids to pre-render ahead of requests
    ///
    /// Only the first page of the listing is enumerated; any other uid still
    /// resolves on demand.
    pub async fn list_known_ids(&self) -> Result<Vec<String>> {
        let page = self
            .client
            .query(&Query::documents(&self.document_type))
            .await?;
        let page: PageResult<Option<String>, KnownIds> =
            PageResult::from_api(page, |doc| doc.uid.clone());

        if page.has_next() {
            tracing::debug!("More {} documents exist beyond the pre-render set", self.document_type);
        }
        Ok(page.items.into_iter().flatten().collect())
    }

    /// Full content for `uid`; fails with `NotFound` for unknown uids
    pub async fn resolve(&self, uid: &str) -> Result<Arc<PostDetail>> {
        if let Some(detail) = self.cache.get(uid).await {
            tracing::debug!("Serving {} from cache", uid);
            return Ok(detail);
        }

        let doc = self.client.get_by_uid(&self.document_type, uid).await?;
        let detail = PostDetail::from_document(&doc);
        tracing::debug!("Resolved {} ({} sections)", uid, detail.sections.len());
        Ok(self.cache.insert(uid, detail).await)
    }

    /// Resolve every known uid, warming the cache
    pub async fn prerender(&self) -> Result<Vec<(String, Arc<PostDetail>)>> {
        let mut resolved = Vec::new();
        for uid in self.list_known_ids().await? {
            let detail = self.resolve(&uid).await?;
            resolved.push((uid, detail));
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiPage, InMemoryClient};
    use crate::content::RawDocument;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const DAY: Duration = Duration::from_secs(60 * 60 * 24);

    /// Counts uid lookups reaching the CMS
    struct CountingClient {
        inner: InMemoryClient,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl ContentClient for CountingClient {
        async fn query(&self, query: &Query) -> Result<ApiPage> {
            self.inner.query(query).await
        }

        async fn next_page(&self, cursor: &str) -> Result<ApiPage> {
            self.inner.next_page(cursor).await
        }

        async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<RawDocument> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.get_by_uid(document_type, uid).await
        }
    }

    fn post(uid: Option<&str>, title: &str) -> RawDocument {
        let mut doc = RawDocument::new("post");
        doc.uid = uid.map(str::to_string);
        doc.data = json!({
            "title": title,
            "banner": { "url": "https://images.prismic.io/banner.png" },
            "author": "Danilo Vieira",
            "content": [{ "heading": "Intro", "body": ["Olá"] }]
        });
        doc
    }

    fn setup(docs: Vec<RawDocument>) -> (Arc<CountingClient>, DetailPageController) {
        let client = Arc::new(CountingClient {
            inner: InMemoryClient::new(docs),
            lookups: AtomicUsize::new(0),
        });
        let cache = Arc::new(RevalidationCache::new(DAY));
        let controller = DetailPageController::new(client.clone(), cache, "post");
        (client, controller)
    }

    #[tokio::test]
    async fn test_list_known_ids_skips_missing_uid() {
        let (_, controller) = setup(vec![
            post(Some("first"), "First"),
            post(None, "Draft without uid"),
            post(Some("second"), "Second"),
        ]);
        assert_eq!(
            controller.list_known_ids().await.unwrap(),
            vec!["first", "second"]
        );
    }

    #[tokio::test]
    async fn test_unknown_uid_is_not_found() {
        let (client, controller) = setup(vec![post(Some("first"), "First")]);

        assert!(!controller
            .list_known_ids()
            .await
            .unwrap()
            .contains(&"unknown-uid".to_string()));
        let err = controller.resolve("unknown-uid").await.unwrap_err();
        assert!(err.is_not_found());

        // failures are not cached
        assert!(controller.resolve("unknown-uid").await.is_err());
        assert_eq!(client.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolution_cached_for_window() {
        let (client, controller) = setup(vec![post(Some("first"), "First")]);

        let detail = controller.resolve("first").await.unwrap();
        assert_eq!(detail.title, "First");
        assert_eq!(detail.sections[0].paragraphs, vec!["Olá"]);

        tokio::time::advance(DAY - Duration::from_secs(1)).await;
        controller.resolve("first").await.unwrap();
        assert_eq!(client.lookups.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        controller.resolve("first").await.unwrap();
        assert_eq!(client.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_prerender_warms_cache() {
        let (client, controller) = setup(vec![
            post(Some("first"), "First"),
            post(Some("second"), "Second"),
        ]);

        let rendered = controller.prerender().await.unwrap();
        let uids: Vec<_> = rendered.iter().map(|(uid, _)| uid.as_str()).collect();
        assert_eq!(uids, vec!["first", "second"]);
        assert_eq!(client.lookups.load(Ordering::SeqCst), 2);

        controller.resolve("second").await.unwrap();
        assert_eq!(client.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_uid_outside_known_set_resolves_on_demand() {
        let docs: Vec<RawDocument> = (1..=25)
            .map(|i| post(Some(&format!("post-{}", i)), "Post"))
            .collect();
        let (_, controller) = setup(docs);

        let known = controller.list_known_ids().await.unwrap();
        assert_eq!(known.len(), 20);
        assert!(!known.contains(&"post-25".to_string()));
        assert!(controller.resolve("post-25").await.is_ok());
    }
}
