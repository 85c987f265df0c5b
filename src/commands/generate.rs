//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Blog;

/// Pre-render the index and every known post into the public directory
pub async fn run(blog: &Blog) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog)?;
    let summary = generator.generate().await?;

    tracing::info!(
        "Generated index with {} posts and {} post pages",
        summary.index_posts,
        summary.post_pages
    );

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryClient;
    use crate::config::SiteConfig;
    use crate::content::RawDocument;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_generate_then_clean() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = RawDocument::new("post");
        doc.uid = Some("hello".to_string());
        doc.first_publication_date = Some("2021-04-19T12:00:00+0000".to_string());
        doc.data = json!({ "title": "Hello", "subtitle": "World", "author": "Ana" });

        let blog = Blog::with_client(
            dir.path(),
            SiteConfig::default(),
            Arc::new(InMemoryClient::new(vec![doc])),
        )
        .unwrap();

        blog.generate().await.unwrap();
        assert!(blog.public_dir.join("index.html").exists());
        assert!(blog.public_dir.join("post/hello/index.html").exists());

        blog.clean().unwrap();
        assert!(!blog.public_dir.exists());
    }
}
