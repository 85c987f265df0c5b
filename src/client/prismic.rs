//! Prismic REST API client

use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{ApiPage, ContentClient, Query};
use crate::cache::RevalidationCache;
use crate::config::SiteConfig;
use crate::content::RawDocument;
use crate::error::{BlogError, Result};

/// How long a fetched master ref is reused before the API root is read again
const MASTER_REF_TTL: Duration = Duration::from_secs(30);

const MASTER_REF_KEY: &str = "master";

/// Entry in the `refs` list of the API root document
#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// API root document (only the parts we read)
#[derive(Debug, Deserialize)]
struct ApiInfo {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

/// Client for a Prismic repository's v2 REST API
#[derive(Debug, Clone)]
pub struct PrismicClient {
    http: reqwest::Client,
    /// API root, e.g. `https://repo.cdn.prismic.io/api/v2`
    endpoint: Url,
    access_token: Option<String>,
    master_refs: Arc<RevalidationCache<String>>,
}

impl PrismicClient {
    pub fn new(endpoint: &str, access_token: Option<String>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(BlogError::Config("api_endpoint is empty".to_string()));
        }
        let endpoint = Url::parse(endpoint)
            .map_err(|e| BlogError::Config(format!("Invalid api_endpoint {}: {}", endpoint, e)))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            access_token: access_token.filter(|t| !t.is_empty()),
            master_refs: Arc::new(RevalidationCache::new(MASTER_REF_TTL)),
        })
    }

    /// Build a client from the site configuration
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        Self::new(
            &config.api_endpoint,
            config.access_token.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.query(&[("access_token", token)]),
            None => request,
        }
    }

    /// `{endpoint}/documents/search`
    fn search_url(&self) -> String {
        format!("{}/documents/search", self.endpoint.as_str().trim_end_matches('/'))
    }

    /// Current master ref; every search must name the content release it reads
    async fn master_ref(&self) -> Result<String> {
        if let Some(reference) = self.master_refs.get(MASTER_REF_KEY).await {
            return Ok(reference.as_str().to_owned());
        }

        let info: ApiInfo = self
            .authorize(self.http.get(self.endpoint.clone()))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let reference = info
            .refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or_else(|| BlogError::api(format!("No master ref at {}", self.endpoint)))?;

        tracing::debug!("Master ref is {}", reference);
        self.master_refs.insert(MASTER_REF_KEY, reference.clone()).await;
        Ok(reference)
    }

    /// Accept only search URLs on this repository's endpoint
    fn check_cursor(&self, cursor: &str) -> Result<Url> {
        let url = Url::parse(cursor).map_err(|_| BlogError::invalid_cursor(cursor))?;
        let search = Url::parse(&self.search_url()).map_err(|_| BlogError::invalid_cursor(cursor))?;

        let same_origin = url.scheme() == search.scheme()
            && url.host_str() == search.host_str()
            && url.port_or_known_default() == search.port_or_known_default();
        let no_credentials = url.username().is_empty() && url.password().is_none();

        if same_origin && no_credentials && url.path() == search.path() {
            Ok(url)
        } else {
            tracing::warn!("Rejected foreign page cursor {}", cursor);
            Err(BlogError::invalid_cursor(cursor))
        }
    }

    async fn search(&self, params: Vec<(&str, String)>) -> Result<ApiPage> {
        let master_ref = self.master_ref().await?;
        let url = self.search_url();

        let page: ApiPage = self
            .authorize(self.http.get(&url).query(&[("ref", master_ref)]).query(&params))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(
            "Fetched page {}/{} ({} results)",
            page.page,
            page.total_pages,
            page.results.len()
        );
        Ok(page)
    }
}

#[async_trait]
impl ContentClient for PrismicClient {
    async fn query(&self, query: &Query) -> Result<ApiPage> {
        let mut params = vec![("q", type_predicate(&query.document_type))];
        if !query.fetch.is_empty() {
            params.push(("fetch", query.fetch.join(",")));
        }
        if let Some(page_size) = query.page_size {
            params.push(("pageSize", page_size.to_string()));
        }
        self.search(params).await
    }

    async fn next_page(&self, cursor: &str) -> Result<ApiPage> {
        let url = self.check_cursor(cursor)?;
        let page: ApiPage = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!("Fetched page {}/{} via cursor", page.page, page.total_pages);
        Ok(page)
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<RawDocument> {
        let params = vec![
            ("q", uid_predicate(document_type, uid)),
            ("pageSize", "1".to_string()),
        ];
        self.search(params)
            .await?
            .results
            .into_iter()
            .next()
            .ok_or_else(|| BlogError::not_found(document_type, uid))
    }
}

fn type_predicate(document_type: &str) -> String {
    format!(r#"[[at(document.type, "{}")]]"#, escape(document_type))
}

fn uid_predicate(document_type: &str, uid: &str) -> String {
    format!(
        r#"[[at(my.{}.uid, "{}")]]"#,
        document_type,
        escape(uid)
    )
}

fn escape(value: &str) -> String {
    value.replace('\\', r"\\").replace('"', r#"\""#)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query as Params, State};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    struct MockApi {
        base: String,
        root_hits: Arc<AtomicUsize>,
    }

    fn doc(uid: &str, title: &str) -> Value {
        json!({
            "id": format!("id-{}", uid),
            "uid": uid,
            "type": "post",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "last_publication_date": "2021-03-15T19:25:28+0000",
            "data": { "title": title, "subtitle": "sub", "author": "Joseph Oliveira" }
        })
    }

    async fn api_root(
        State(api): State<MockApi>,
        Params(params): Params<HashMap<String, String>>,
    ) -> Response {
        api.root_hits.fetch_add(1, Ordering::SeqCst);
        if params.get("access_token").map(String::as_str) != Some("secret") {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        Json(json!({
            "refs": [
                { "id": "preview", "ref": "preview-ref", "isMasterRef": false },
                { "id": "master", "ref": "master-ref", "label": "Master", "isMasterRef": true }
            ]
        }))
        .into_response()
    }

    async fn search(
        State(api): State<MockApi>,
        Params(params): Params<HashMap<String, String>>,
    ) -> Response {
        let param = |key: &str| params.get(key).map(String::as_str);
        if param("ref") != Some("master-ref") {
            return StatusCode::BAD_REQUEST.into_response();
        }

        if param("page") == Some("2") {
            return Json(json!({
                "page": 2,
                "total_pages": 2,
                "next_page": null,
                "results": [doc("post-3", "Third")]
            }))
            .into_response();
        }

        match param("q") {
            Some(r#"[[at(document.type, "post")]]"#) => {
                if param("pageSize") != Some("2")
                    || param("fetch") != Some("post.title,post.subtitle,post.author")
                {
                    return StatusCode::BAD_REQUEST.into_response();
                }
                Json(json!({
                    "page": 1,
                    "total_pages": 2,
                    "next_page": format!("{}/documents/search?ref=master-ref&page=2&access_token=secret", api.base),
                    "results": [doc("post-1", "First"), doc("post-2", "Second")]
                }))
                .into_response()
            }
            Some(r#"[[at(my.post.uid, "post-2")]]"#) => Json(json!({
                "page": 1,
                "total_pages": 1,
                "next_page": null,
                "results": [doc("post-2", "Second")]
            }))
            .into_response(),
            Some(_) => Json(json!({ "page": 1, "total_pages": 0, "next_page": null, "results": [] }))
                .into_response(),
            None => StatusCode::BAD_REQUEST.into_response(),
        }
    }

    async fn spawn_api() -> MockApi {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let api = MockApi {
            base: format!("http://{}/api/v2", listener.local_addr().unwrap()),
            root_hits: Arc::new(AtomicUsize::new(0)),
        };
        let app = Router::new()
            .route("/api/v2", get(api_root))
            .route("/api/v2/documents/search", get(search))
            .with_state(api.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        api
    }

    /// A server that only counts the requests it receives
    async fn spawn_counter() -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = hits.clone();
        let app = Router::new().fallback(move || {
            let counted = counted.clone();
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
                Json(json!({ "results": [doc("leak", "INTERNAL")] }))
            }
        });
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (base, hits)
    }

    fn client(endpoint: &str) -> PrismicClient {
        PrismicClient::new(
            endpoint,
            Some("secret".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_and_follow_cursor() {
        let api = spawn_api().await;
        let client = client(&api.base);

        let query = Query::documents("post")
            .fetch(["post.title", "post.subtitle", "post.author"])
            .page_size(2);
        let first = client.query(&query).await.unwrap();
        assert_eq!(first.results.len(), 2);
        assert_eq!(first.results[0].uid.as_deref(), Some("post-1"));

        let cursor = first.next_page.unwrap();
        let second = client.next_page(&cursor).await.unwrap();
        assert_eq!(second.results[0].text_field("title"), "Third");
        assert_eq!(second.next_page, None);
    }

    #[tokio::test]
    async fn test_get_by_uid() {
        let api = spawn_api().await;
        let client = client(&api.base);

        let doc = client.get_by_uid("post", "post-2").await.unwrap();
        assert_eq!(doc.text_field("title"), "Second");

        let err = client.get_by_uid("post", "unknown-uid").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_token_is_fetch_error() {
        let api = spawn_api().await;
        let client = PrismicClient::new(&api.base, None, Duration::from_secs(5)).unwrap();

        let err = client
            .query(&Query::documents("post"))
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_master_ref_is_reused() {
        let api = spawn_api().await;
        let client = client(&api.base);

        client.get_by_uid("post", "post-2").await.unwrap();
        client.get_by_uid("post", "unknown-uid").await.unwrap_err();
        client.query(&Query::documents("post")).await.unwrap();
        assert_eq!(api.root_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_foreign_cursor_rejected_without_request() {
        let api = spawn_api().await;
        let (other, hits) = spawn_counter().await;
        let client = client(&api.base);

        let foreign = [
            format!("{}/admin/secrets", other),
            format!("{}/api/v2/documents/search?page=2", other),
            format!("{}/documents/other?page=2", api.base),
            api.base.replace("http://", "http://user:pass@") + "/documents/search?page=2",
            "not a url".to_string(),
        ];
        for cursor in &foreign {
            let err = client.next_page(cursor).await.unwrap_err();
            assert!(
                matches!(err, BlogError::InvalidCursor(_)),
                "{} was not rejected",
                cursor
            );
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        // the repository's own search URLs are still followed
        let own = format!("{}/documents/search?ref=master-ref&page=2", api.base);
        assert_eq!(client.next_page(&own).await.unwrap().page, 2);
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let err = PrismicClient::new("not a url", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, BlogError::Config(_)));
    }

    #[test]
    fn test_predicates_escape_quotes() {
        assert_eq!(type_predicate("post"), r#"[[at(document.type, "post")]]"#);
        assert_eq!(
            uid_predicate("post", r#"say-"hi""#),
            r#"[[at(my.post.uid, "say-\"hi\"")]]"#
        );
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let err = PrismicClient::new(" ", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, BlogError::Config(_)));
    }
}
