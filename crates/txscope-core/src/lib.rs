//! Core transaction model and pure query logic
//!
//! Everything in this crate is synchronous and side-effect free apart from
//! logging:
//! - types / models: transaction records as served by the remote endpoint
//! - filters: filter criteria, partial updates, client-side matching
//! - time: calendar-day bounds and timestamp parsing
//! - query_string: the shareable URL representation of a criteria value
//! - insights: summary statistics over a loaded result set

pub mod error;
pub mod filters;
pub mod insights;
pub mod models;
pub mod query_string;
pub mod time;
pub mod types;

pub use error::{CoreError, CoreResult, ErrorCode, ErrorContext, ErrorLogger, ErrorSeverity};
pub use filters::{FilterCriteria, FilterPatch};
pub use insights::{summarize, InsightsMemo, InsightsSummary};
pub use models::{Page, TransactionRecord};
pub use query_string::{criteria_from_query, criteria_to_query, parse_query};
pub use time::{DateBounds, DATE_FORMAT};
pub use types::{Category, TransactionStatus};
