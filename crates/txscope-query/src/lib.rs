//! Client-side query layer
//!
//! - store: committed filter criteria mirrored into the location query string
//! - search: debounced search input over the store
//! - cache: paginated, criteria-keyed query cache with in-flight coalescing
//! - scroll: scroll-triggered next-page loading
//! - dashboard: view-model combining the above with insights

pub mod cache;
pub mod dashboard;
pub mod scroll;
pub mod search;
pub mod store;

#[cfg(test)]
mod testing;

pub use cache::{FetchHandle, FetchOutcome, QueryOptions, QuerySnapshot, QueryStatus, TransactionQuery};
pub use dashboard::{Dashboard, DashboardView, EmptyState, InsightCard, END_OF_LIST};
pub use scroll::{PaginationTarget, ScrollLoader, ScrollMetrics};
pub use search::{DebouncedSearch, Debouncer};
pub use store::{FilterStore, History, MemoryHistory};
