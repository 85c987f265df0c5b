//! HTTP server with incremental regeneration
//!
//! Pages are rendered on first request and reused until the revalidation
//! window passes. Known posts are pre-rendered when the server starts.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::cache::RevalidationCache;
use crate::client::{Cursor, PostListing};
use crate::error::BlogError;
use crate::helpers::url_for;
use crate::pages::{index, DetailPageController};
use crate::templates::{LoadMoreSource, PostCard, PostView, TemplateRenderer};
use crate::Blog;

const INDEX_KEY: &str = "index";

/// Server state
struct ServerState {
    blog: Blog,
    renderer: TemplateRenderer,
    index_cache: RevalidationCache<String>,
    details: DetailPageController,
}

/// Query string of the load-more endpoint
#[derive(Debug, Deserialize)]
struct LoadMoreParams {
    page: Option<Cursor<PostListing>>,
}

/// One more page of posts for the index
#[derive(Debug, Serialize)]
struct LoadMoreResponse {
    results: Vec<PostCard>,
    next_page: Option<Cursor<PostListing>>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Build the application router
pub fn router(blog: &Blog) -> Result<Router> {
    Ok(routes(Arc::new(build_state(blog)?)))
}

fn build_state(blog: &Blog) -> Result<ServerState> {
    let window = blog.config.revalidate();
    let details = DetailPageController::new(
        blog.client.clone(),
        Arc::new(RevalidationCache::new(window)),
        &blog.config.document_type,
    );

    Ok(ServerState {
        blog: blog.clone(),
        renderer: TemplateRenderer::new()?,
        index_cache: RevalidationCache::new(window),
        details,
    })
}

fn routes(state: Arc<ServerState>) -> Router {
    let root = url_for(&state.blog.config, "/");
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/post/:uid", get(post_handler))
        .route("/api/posts", get(load_more_handler))
        .fallback(fallback_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if root == "/" {
        app
    } else {
        Router::new().nest(root.trim_end_matches('/'), app)
    }
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(build_state(blog)?);

    match state.details.prerender().await {
        Ok(resolved) => tracing::info!("Pre-rendered {} posts", resolved.len()),
        Err(e) => tracing::warn!("Pre-rendering failed, posts will render on demand: {}", e),
    }

    let app = routes(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    if let Some(html) = state.index_cache.get(INDEX_KEY).await {
        return Html(html.as_str().to_owned()).into_response();
    }

    match render_index(&state).await {
        Ok(html) => {
            let html = state.index_cache.insert(INDEX_KEY, html).await;
            Html(html.as_str().to_owned()).into_response()
        }
        Err(e) => error_response(&state, e, "/"),
    }
}

async fn render_index(state: &ServerState) -> Result<String, BlogError> {
    let config = &state.blog.config;
    let page = index::first_page(state.blog.client.as_ref(), config).await?;
    let cards = PostCard::from_summaries(config, &state.blog.dates, &page.items)?;
    state
        .renderer
        .render_index(config, &cards, page.next_page.as_ref(), LoadMoreSource::Server)
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(uid): Path<String>,
) -> Response {
    match render_post(&state, &uid).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_response(&state, e, &format!("/post/{}", uid)),
    }
}

async fn render_post(state: &ServerState, uid: &str) -> Result<String, BlogError> {
    let detail = state.details.resolve(uid).await?;
    let view = PostView::new(&state.blog.dates, &detail)?;
    state.renderer.render_post(&state.blog.config, uid, &view)
}

async fn load_more_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<LoadMoreParams>,
) -> Response {
    let Some(cursor) = params.page else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "missing page cursor".to_string(),
            }),
        )
            .into_response();
    };

    match load_more(&state, &cursor).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            tracing::warn!("Load more failed: {}", e);
            (
                status_for(&e),
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn load_more(
    state: &ServerState,
    cursor: &Cursor<PostListing>,
) -> Result<LoadMoreResponse, BlogError> {
    let page = index::next_page(state.blog.client.as_ref(), cursor).await?;
    let results = PostCard::from_summaries(&state.blog.config, &state.blog.dates, &page.items)?;
    Ok(LoadMoreResponse {
        results,
        next_page: page.next_page,
    })
}

async fn fallback_handler(State(state): State<Arc<ServerState>>, uri: axum::http::Uri) -> Response {
    not_found_page(&state, uri.path())
}

fn status_for(err: &BlogError) -> StatusCode {
    match err {
        BlogError::NotFound { .. } => StatusCode::NOT_FOUND,
        BlogError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
        e if e.is_transient() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(state: &ServerState, err: BlogError, path: &str) -> Response {
    if err.is_not_found() {
        return not_found_page(state, path);
    }

    tracing::error!("Failed to render {}: {}", path, err);
    (status_for(&err), "Failed to render page").into_response()
}

fn not_found_page(state: &ServerState, path: &str) -> Response {
    match state.renderer.render_not_found(&state.blog.config, path) {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render not-found page: {}", e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}
