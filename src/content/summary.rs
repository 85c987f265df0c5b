//! Post summaries shown on the index page

use serde::{Deserialize, Serialize};

use super::RawDocument;

/// A post as listed on the index page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Document uid, absent when the payload omits it
    pub id: Option<String>,

    /// ISO-8601 timestamp of the first publication
    pub publication_date: Option<String>,

    pub title: String,

    pub subtitle: String,

    pub author: String,
}

impl PostSummary {
    /// Map a raw `post` document. Never fails: missing text fields become
    /// empty strings and missing uid/date stay absent.
    pub fn from_document(doc: &RawDocument) -> Self {
        Self {
            id: doc.uid.clone(),
            publication_date: doc.first_publication_date.clone(),
            title: doc.text_field("title"),
            subtitle: doc.text_field("subtitle"),
            author: doc.text_field("author"),
        }
    }
}

impl From<&RawDocument> for PostSummary {
    fn from(doc: &RawDocument) -> Self {
        Self::from_document(doc)
    }
}

/// Field projection the index query needs for a document type
pub fn summary_fields(document_type: &str) -> Vec<String> {
    ["title", "subtitle", "author"]
        .iter()
        .map(|field| format!("{}.{}", document_type, field))
        .collect()
}
