//! Search index access.

pub mod client;
pub mod query;

pub use client::{HttpIndexClient, IndexClient};
pub use query::{PAGE_SIZE, SearchIndexResponse, SearchQuery, SortOrder};
