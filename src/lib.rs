//! Data access for the LightBnB listing site: users, reservations and
//! property search over Postgres.

pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod store;

pub use config::Config;
pub use error::{DataError, Result};
pub use search::{SearchFilter, DEFAULT_LIMIT};
pub use store::{ListingStore, PgStore};
