//! Content module - raw CMS documents and the view models mapped from them

mod detail;
pub mod document;
mod summary;

pub use detail::{ContentSection, PostDetail};
pub use document::RawDocument;
pub use summary::{summary_fields, PostSummary};
