//! Built-in templates using the Tera template engine
//!
//! All templates are embedded directly in the binary. Autoescaping stays on
//! since every rendered string comes from the CMS.

use serde::Serialize;
use tera::{Context, Tera};

use crate::client::{Cursor, PostListing};
use crate::config::SiteConfig;
use crate::content::{PostDetail, PostSummary};
use crate::error::Result;
use crate::helpers::{full_url_for, post_url, url_for, DateFormatter};

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("index.html", include_str!("theme/index.html")),
            ("post.html", include_str!("theme/post.html")),
            ("not_found.html", include_str!("theme/not_found.html")),
            (
                "partials/header.html",
                include_str!("theme/partials/header.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Render the index page with its first page of posts
    ///
    /// The "load more" button appears only when `next_page` is set, and
    /// fetches from `source`.
    pub fn render_index(
        &self,
        config: &SiteConfig,
        posts: &[PostCard],
        next_page: Option<&Cursor<PostListing>>,
        source: LoadMoreSource,
    ) -> Result<String> {
        let mut context = base_context(config, "/");
        context.insert("posts", posts);
        context.insert("next_page", &next_page);
        context.insert("load_more", &source);
        context.insert("api_url", &url_for(config, "api/posts"));
        context.insert("post_base", &url_for(config, "post/"));
        context.insert("timezone", &config.timezone);
        self.render("index.html", &context)
    }

    /// Render a post's detail page
    pub fn render_post(&self, config: &SiteConfig, uid: &str, post: &PostView) -> Result<String> {
        let mut context = base_context(config, &post_url(config, uid));
        context.insert("post", post);
        self.render("post.html", &context)
    }

    /// Render the page shown for unknown post uids
    pub fn render_not_found(&self, config: &SiteConfig, path: &str) -> Result<String> {
        let mut context = base_context(config, path);
        context.insert("path", path);
        self.render("not_found.html", &context)
    }
}

fn base_context(config: &SiteConfig, path: &str) -> Context {
    let mut context = Context::new();
    context.insert("config", &ConfigData::from(config));
    context.insert("canonical_url", &full_url_for(config, path));
    context
}

/// Where the index page's "load more" button reads further pages from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMoreSource {
    /// The server's `api/posts` endpoint, which answers with ready cards
    Server,
    /// The cursor itself is a CMS search URL the browser fetches directly
    Cms,
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub url: String,
    pub root: String,
}

impl From<&SiteConfig> for ConfigData {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            url: config.url.clone(),
            root: url_for(config, "/"),
        }
    }
}

/// A post as shown in the index list and the load-more API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostCard {
    /// Detail page link, empty when the summary has no uid
    pub href: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
}

impl PostCard {
    pub fn new(config: &SiteConfig, dates: &DateFormatter, summary: &PostSummary) -> Result<Self> {
        Ok(Self {
            href: summary
                .id
                .as_deref()
                .map(|uid| post_url(config, uid))
                .unwrap_or_default(),
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            author: summary.author.clone(),
            date: dates.format_optional(summary.publication_date.as_deref())?,
        })
    }

    /// Build cards for a list of summaries, failing on the first bad date
    pub fn from_summaries(
        config: &SiteConfig,
        dates: &DateFormatter,
        summaries: &[PostSummary],
    ) -> Result<Vec<Self>> {
        summaries
            .iter()
            .map(|summary| Self::new(config, dates, summary))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub heading: String,
    pub paragraphs: Vec<String>,
}

/// A post as shown on its detail page
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub banner_url: String,
    pub author: String,
    pub date: String,
    /// Date of the latest publication, only for edited posts
    pub edited_at: Option<String>,
    /// Minutes
    pub reading_time: usize,
    pub sections: Vec<SectionView>,
}

impl PostView {
    pub fn new(dates: &DateFormatter, detail: &PostDetail) -> Result<Self> {
        let edited_at = if detail.is_edited() {
            Some(dates.format_optional(detail.last_publication_date.as_deref())?)
        } else {
            None
        };

        Ok(Self {
            title: detail.title.clone(),
            banner_url: detail.banner_url.clone(),
            author: detail.author.clone(),
            date: dates.format_optional(detail.publication_date.as_deref())?,
            edited_at,
            reading_time: detail.reading_time(),
            sections: detail
                .sections
                .iter()
                .map(|s| SectionView {
                    heading: s.heading.clone(),
                    paragraphs: s.paragraphs.clone(),
                })
                .collect(),
        })
    }
}
