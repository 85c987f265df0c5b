//! Full post content for the detail page

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::{block_texts, plain_text};
use super::RawDocument;

/// Average reading speed used for the reading-time estimate
const WORDS_PER_MINUTE: usize = 200;

/// A fully resolved post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    /// ISO-8601 timestamp of the first publication
    pub publication_date: Option<String>,

    /// ISO-8601 timestamp of the latest publication
    pub last_publication_date: Option<String>,

    pub title: String,

    /// Banner image URL, empty when the document has none
    pub banner_url: String,

    pub author: String,

    /// Content sections in document order
    pub sections: Vec<ContentSection>,
}

/// A heading followed by its body paragraphs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    pub heading: String,
    pub paragraphs: Vec<String>,
}

impl PostDetail {
    /// Map a raw `post` document, flattening rich text into plain strings
    pub fn from_document(doc: &RawDocument) -> Self {
        let sections = match doc.field("content") {
            Some(Value::Array(groups)) => groups.iter().map(ContentSection::from_group).collect(),
            _ => Vec::new(),
        };

        Self {
            publication_date: doc.first_publication_date.clone(),
            last_publication_date: doc.last_publication_date.clone(),
            title: doc.text_field("title"),
            banner_url: doc.url_field("banner").unwrap_or_default(),
            author: doc.text_field("author"),
            sections,
        }
    }

    /// Total words across headings and paragraphs
    pub fn word_count(&self) -> usize {
        self.sections
            .iter()
            .map(|section| {
                count_words(&section.heading)
                    + section
                        .paragraphs
                        .iter()
                        .map(|p| count_words(p))
                        .sum::<usize>()
            })
            .sum()
    }

    /// Estimated reading time in whole minutes, rounded up
    pub fn reading_time(&self) -> usize {
        self.word_count().div_ceil(WORDS_PER_MINUTE)
    }

    /// Whether the post was republished after its first publication
    pub fn is_edited(&self) -> bool {
        match (&self.publication_date, &self.last_publication_date) {
            (Some(first), Some(last)) => first != last,
            _ => false,
        }
    }
}

impl From<&RawDocument> for PostDetail {
    fn from(doc: &RawDocument) -> Self {
        Self::from_document(doc)
    }
}

impl ContentSection {
    fn from_group(group: &Value) -> Self {
        Self {
            heading: group.get("heading").map(plain_text).unwrap_or_default(),
            paragraphs: group.get("body").map(block_texts).unwrap_or_default(),
        }
    }
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
