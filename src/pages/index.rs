//! Index page: first page of post summaries plus "load more"

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::client::{ContentClient, Cursor, PageResult, PostListing, Query};
use crate::config::SiteConfig;
use crate::content::{summary_fields, PostSummary};
use crate::error::Result;

/// A page of index summaries
pub type IndexPage = PageResult<PostSummary, PostListing>;

/// Fetch the first page of summaries for the index
pub async fn first_page(client: &dyn ContentClient, config: &SiteConfig) -> Result<IndexPage> {
    let query = Query::documents(&config.document_type)
        .fetch(summary_fields(&config.document_type))
        .page_size(config.page_size);

    let page = client.query(&query).await?;
    tracing::debug!(
        "Index page: {} of {} posts",
        page.results.len(),
        page.total_results_size
    );
    Ok(PageResult::from_api(page, PostSummary::from_document))
}

/// Fetch the page behind an index cursor
pub async fn next_page(client: &dyn ContentClient, cursor: &Cursor<PostListing>) -> Result<IndexPage> {
    let page = client.next_page(cursor.as_str()).await?;
    Ok(PageResult::from_api(page, PostSummary::from_document))
}

/// Outcome of a [`IndexPageController::request_more`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMore {
    /// A page arrived and this many posts were appended
    Appended(usize),
    /// There is no next page
    Exhausted,
    /// Another request is in flight; nothing was done
    AlreadyLoading,
}

#[derive(Debug)]
struct IndexState {
    posts: Vec<PostSummary>,
    next_page: Option<Cursor<PostListing>>,
    loading: bool,
}

/// Holds the posts shown on the index and loads further pages on request
///
/// The controller is either idle or loading exactly one page. Loaded pages
/// are appended after everything already shown, in arrival order.
pub struct IndexPageController {
    client: Arc<dyn ContentClient>,
    state: Mutex<IndexState>,
}

impl IndexPageController {
    /// Create an idle controller seeded with the first page
    pub fn new(client: Arc<dyn ContentClient>, initial: IndexPage) -> Self {
        Self {
            client,
            state: Mutex::new(IndexState {
                posts: initial.items,
                next_page: initial.next_page,
                loading: false,
            }),
        }
    }

    /// Fetch the first page and seed a controller with it
    pub async fn load(client: Arc<dyn ContentClient>, config: &SiteConfig) -> Result<Self> {
        let initial = first_page(client.as_ref(), config).await?;
        Ok(Self::new(client, initial))
    }

    /// Posts currently displayed, in display order
    pub async fn posts(&self) -> Vec<PostSummary> {
        self.state.lock().await.posts.clone()
    }

    /// Whether the "load more" affordance is enabled
    pub async fn can_load_more(&self) -> bool {
        self.state.lock().await.next_page.is_some()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }

    /// Load the next page and append it
    ///
    /// On failure the error is returned and the displayed posts and cursor
    /// are left as they were.
    pub async fn request_more(&self) -> Result<LoadMore> {
        let cursor = {
            let mut state = self.state.lock().await;
            if state.loading {
                return Ok(LoadMore::AlreadyLoading);
            }
            let Some(cursor) = state.next_page.clone() else {
                return Ok(LoadMore::Exhausted);
            };
            state.loading = true;
            cursor
        };

        let result = next_page(self.client.as_ref(), &cursor).await;

        let mut state = self.state.lock().await;
        state.loading = false;
        match result {
            Ok(page) => {
                let appended = page.items.len();
                state.posts.extend(page.items);
                state.next_page = page.next_page;
                tracing::debug!(
                    "Appended {} posts, {} shown, more: {}",
                    appended,
                    state.posts.len(),
                    state.next_page.is_some()
                );
                Ok(LoadMore::Appended(appended))
            }
            Err(e) => {
                tracing::warn!("Failed to load more posts: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiPage, InMemoryClient};
    use crate::content::RawDocument;
    use crate::error::BlogError;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::{oneshot, Notify};

    fn post(uid: &str) -> RawDocument {
        let mut doc = RawDocument::new("post");
        doc.uid = Some(uid.to_string());
        doc.first_publication_date = Some("2021-03-15T19:25:28+0000".to_string());
        doc.data = json!({ "title": uid, "subtitle": "sub", "author": "Author" });
        doc
    }

    fn summary(uid: &str) -> PostSummary {
        PostSummary::from_document(&post(uid))
    }

    fn seeded(items: &[&str], cursor: Option<&str>) -> IndexPage {
        PageResult {
            items: items.iter().map(|uid| summary(uid)).collect(),
            next_page: cursor.map(|c| Cursor::new(c.to_string())),
        }
    }

    fn ids(posts: &[PostSummary]) -> Vec<String> {
        posts.iter().filter_map(|p| p.id.clone()).collect()
    }

    /// Answers `next_page` with a scripted page, optionally after a gate opens
    struct ScriptedClient {
        page: std::sync::Mutex<Option<Result<ApiPage>>>,
        gate: Option<Arc<Notify>>,
        started: std::sync::Mutex<Option<oneshot::Sender<()>>>,
    }

    impl ScriptedClient {
        fn new(page: Result<ApiPage>) -> Self {
            Self {
                page: std::sync::Mutex::new(Some(page)),
                gate: None,
                started: std::sync::Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ContentClient for ScriptedClient {
        async fn query(&self, _query: &Query) -> Result<ApiPage> {
            Err(BlogError::api("unexpected query"))
        }

        async fn next_page(&self, cursor: &str) -> Result<ApiPage> {
            assert_eq!(cursor, "page2");
            if let Some(tx) = self.started.lock().unwrap().take() {
                let _ = tx.send(());
            }
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.page
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(BlogError::api("page already served")))
        }

        async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<RawDocument> {
            Err(BlogError::not_found(document_type, uid))
        }
    }

    fn last_page(uids: &[&str]) -> ApiPage {
        ApiPage {
            next_page: None,
            results: uids.iter().map(|uid| post(uid)).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_request_more_appends_in_order() {
        let client = Arc::new(ScriptedClient::new(Ok(last_page(&["c", "d", "e"]))));
        let controller = IndexPageController::new(client, seeded(&["a", "b"], Some("page2")));
        assert!(controller.can_load_more().await);

        let outcome = controller.request_more().await.unwrap();
        assert_eq!(outcome, LoadMore::Appended(3));

        let posts = controller.posts().await;
        assert_eq!(posts.len(), 5);
        assert_eq!(ids(&posts), vec!["a", "b", "c", "d", "e"]);
        assert!(!controller.can_load_more().await);
        assert!(!controller.is_loading().await);
    }

    #[tokio::test]
    async fn test_exhausted_without_cursor() {
        let client = Arc::new(ScriptedClient::new(Ok(last_page(&["x"]))));
        let controller = IndexPageController::new(client, seeded(&["a"], None));

        assert!(!controller.can_load_more().await);
        assert_eq!(controller.request_more().await.unwrap(), LoadMore::Exhausted);
        assert_eq!(ids(&controller.posts().await), vec!["a"]);
    }

    #[tokio::test]
    async fn test_failure_leaves_state_intact() {
        let client = Arc::new(ScriptedClient::new(Err(BlogError::api("503 from CMS"))));
        let controller = IndexPageController::new(client, seeded(&["a", "b"], Some("page2")));

        let err = controller.request_more().await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(ids(&controller.posts().await), vec!["a", "b"]);
        assert!(controller.can_load_more().await);
        assert!(!controller.is_loading().await);
    }

    #[tokio::test]
    async fn test_second_request_while_loading_is_rejected() {
        let gate = Arc::new(Notify::new());
        let (started_tx, started_rx) = oneshot::channel();
        let client = Arc::new(ScriptedClient {
            page: std::sync::Mutex::new(Some(Ok(last_page(&["c"])))),
            gate: Some(gate.clone()),
            started: std::sync::Mutex::new(Some(started_tx)),
        });
        let controller = Arc::new(IndexPageController::new(
            client,
            seeded(&["a", "b"], Some("page2")),
        ));

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.request_more().await }
        });
        started_rx.await.unwrap();

        assert!(controller.is_loading().await);
        assert_eq!(
            controller.request_more().await.unwrap(),
            LoadMore::AlreadyLoading
        );
        assert_eq!(ids(&controller.posts().await), vec!["a", "b"]);

        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), LoadMore::Appended(1));
        assert_eq!(ids(&controller.posts().await), vec!["a", "b", "c"]);
        assert!(!controller.can_load_more().await);
    }

    #[tokio::test]
    async fn test_load_walks_every_page() {
        let docs: Vec<RawDocument> = (1..=5).map(|i| post(&format!("post-{}", i))).collect();
        let client: Arc<dyn ContentClient> = Arc::new(InMemoryClient::new(docs));
        let config = SiteConfig::default();

        let controller = IndexPageController::load(client, &config).await.unwrap();
        assert_eq!(controller.posts().await.len(), 2);

        let mut rounds = 0;
        while controller.can_load_more().await {
            controller.request_more().await.unwrap();
            rounds += 1;
        }

        assert_eq!(rounds, 2);
        assert_eq!(
            ids(&controller.posts().await),
            vec!["post-1", "post-2", "post-3", "post-4", "post-5"]
        );
        assert_eq!(controller.request_more().await.unwrap(), LoadMore::Exhausted);
    }
}
