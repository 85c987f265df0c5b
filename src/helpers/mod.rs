//! Helper functions for templates
//!
//! Date formatting and URL generation shared by the renderer, the
//! generator and the server.

mod date;
mod url;

pub use date::*;
pub use url::*;
