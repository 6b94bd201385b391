pub mod filter;
pub mod query;

pub use filter::SearchFilter;
pub use query::{SearchQuery, SqlParam, DEFAULT_LIMIT};
