//! Page controllers - the data behind the index and detail routes

mod detail;
pub mod index;

pub use detail::DetailPageController;
pub use index::{IndexPage, IndexPageController, LoadMore};
