//! Core types for newsdesk.
//!
//! This crate holds everything below the terminal presentation layer:
//! - `hit` and `newsvalue` for the typed search-index records
//! - `index`, `cache` and `fetcher` for the window-bounded search
//! - `aggregate` and `grid` for day bucketing and grid sizing
//! - `columns` for the events table column model

pub mod aggregate;
pub mod cache;
pub mod columns;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod grid;
pub mod hit;
pub mod index;
pub mod newsvalue;
pub mod registry;
pub mod session;
pub mod window;

pub use aggregate::{BucketedResult, aggregate};
pub use error::{NewsdeskError, NewsdeskResult};
pub use hit::SearchHit;
