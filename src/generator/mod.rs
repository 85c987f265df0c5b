//! Generator module - pre-renders pages into the public directory

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::RevalidationCache;
use crate::client::{Cursor, PostListing};
use crate::helpers::encode_segment;
use crate::pages::{index, DetailPageController};
use crate::templates::{LoadMoreSource, PostCard, PostView, TemplateRenderer};
use crate::Blog;

/// What a generation pass produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    /// Posts listed on the generated index page
    pub index_posts: usize,
    /// Detail pages written
    pub post_pages: usize,
}

/// Static site generator using the built-in templates
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
    details: DetailPageController,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;
        let cache = Arc::new(RevalidationCache::new(blog.config.revalidate()));
        let details =
            DetailPageController::new(blog.client.clone(), cache, &blog.config.document_type);

        Ok(Self {
            blog: blog.clone(),
            renderer,
            details,
        })
    }

    /// Generate the index page and every known post page
    pub async fn generate(&self) -> Result<GenerateSummary> {
        fs::create_dir_all(&self.blog.public_dir)
            .with_context(|| format!("Failed to create {:?}", self.blog.public_dir))?;

        let index_posts = self.generate_index_page().await?;
        let post_pages = self.generate_post_pages().await?;

        Ok(GenerateSummary {
            index_posts,
            post_pages,
        })
    }

    /// Generate the index page from the first page of posts
    async fn generate_index_page(&self) -> Result<usize> {
        let config = &self.blog.config;
        let page = index::first_page(self.blog.client.as_ref(), config).await?;
        let cards = PostCard::from_summaries(config, &self.blog.dates, &page.items)?;

        let next_page = page.next_page.as_ref().filter(|cursor| browser_fetchable(cursor));
        if page.next_page.is_some() && next_page.is_none() {
            tracing::debug!("Next page is not a public URL, generating index without load more");
        }

        let html = self
            .renderer
            .render_index(config, &cards, next_page, LoadMoreSource::Cms)?;
        self.write_page(PathBuf::from("index.html"), &html)?;

        Ok(cards.len())
    }

    /// Generate individual post pages for every known uid
    async fn generate_post_pages(&self) -> Result<usize> {
        let config = &self.blog.config;
        let resolved = self.details.prerender().await?;

        for (uid, detail) in &resolved {
            let view = PostView::new(&self.blog.dates, detail)
                .with_context(|| format!("Failed to render post {}", uid))?;
            let html = self.renderer.render_post(config, uid, &view)?;

            let output = PathBuf::from("post")
                .join(encode_segment(uid))
                .join("index.html");
            self.write_page(output, &html)?;
        }

        Ok(resolved.len())
    }

    fn write_page(&self, relative: PathBuf, html: &str) -> Result<()> {
        let output_path = self.blog.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
        }
        fs::write(&output_path, html)
            .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }
}

/// Whether a static page can follow the cursor from the browser
fn browser_fetchable(cursor: &Cursor<PostListing>) -> bool {
    reqwest::Url::parse(cursor.as_str())
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}
