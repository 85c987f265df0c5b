//! Show a single post

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::cache::RevalidationCache;
use crate::pages::DetailPageController;
use crate::templates::PostView;
use crate::Blog;

/// Resolve a post by uid and print it as plain text
pub async fn run(blog: &Blog, uid: &str) -> Result<()> {
    let text = render(blog, uid).await?;
    print!("{}", text);
    Ok(())
}

async fn render(blog: &Blog, uid: &str) -> Result<String> {
    let controller = DetailPageController::new(
        blog.client.clone(),
        Arc::new(RevalidationCache::new(blog.config.revalidate())),
        &blog.config.document_type,
    );

    let detail = controller
        .resolve(uid)
        .await
        .with_context(|| format!("Failed to load post {}", uid))?;
    let view = PostView::new(&blog.dates, &detail)?;

    let mut out = format!("{}\n", view.title);
    out.push_str(&format!(
        "{} | {} | {} min\n",
        view.date, view.author, view.reading_time
    ));
    if let Some(edited) = &view.edited_at {
        out.push_str(&format!("* editado em {}\n", edited));
    }

    for section in &view.sections {
        out.push_str(&format!("\n## {}\n", section.heading));
        for paragraph in &section.paragraphs {
            out.push_str(&format!("\n{}\n", paragraph));
        }
    }

    Ok(out)
}
