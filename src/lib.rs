//! Paginated search client for the Hacker News Algolia API.
//!
//! [`controller::SearchController`] owns the per-query result cache and the
//! session state machine. Hosts feed it user events, run the
//! [`controller::FetchRequest`]s it hands back through a
//! [`fetcher::Fetcher`], and pass the outcomes back in as
//! [`controller::Completion`]s.

pub mod cache;
pub mod config;
pub mod controller;
pub mod fetcher;
pub mod model;
pub mod session;
pub mod sort;
pub mod ui;

pub use cache::ResultsCache;
pub use controller::{Completion, Event, FetchRequest, SearchController, SearchView};
pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use model::{CacheEntry, Item, ResultPage, SearchKey};
pub use session::{LivenessToken, SearchSession, Status};
