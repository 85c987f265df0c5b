//! List published posts

use anyhow::Result;

use crate::content::PostSummary;
use crate::helpers::DateFormatter;
use crate::pages::{IndexPageController, LoadMore};
use crate::Blog;

/// List posts the way the index shows them, following `pages` load-more steps
/// (all of them when `None`)
pub async fn run(blog: &Blog, pages: Option<usize>) -> Result<()> {
    let posts = collect(blog, pages).await?;

    println!("Posts ({}):", posts.len());
    for line in format_lines(&blog.dates, &posts)? {
        println!("{}", line);
    }

    Ok(())
}

/// Load the first page, then keep requesting more while allowed
async fn collect(blog: &Blog, pages: Option<usize>) -> Result<Vec<PostSummary>> {
    let controller = IndexPageController::load(blog.client.clone(), &blog.config).await?;

    let mut extra = 0;
    while pages.map_or(true, |limit| extra < limit) && controller.can_load_more().await {
        match controller.request_more().await? {
            LoadMore::Appended(count) => {
                tracing::debug!("Loaded {} more posts", count);
                extra += 1;
            }
            LoadMore::Exhausted | LoadMore::AlreadyLoading => break,
        }
    }

    Ok(controller.posts().await)
}

fn format_lines(dates: &DateFormatter, posts: &[PostSummary]) -> Result<Vec<String>> {
    posts
        .iter()
        .map(|post| {
            let date = dates.format_optional(post.publication_date.as_deref())?;
            Ok(format!(
                "  {} - {} [{}]",
                date,
                post.title,
                post.id.as_deref().unwrap_or("-")
            ))
        })
        .collect()
}
