pub mod postgres;
pub mod traits;

pub use postgres::PgStore;
pub use traits::ListingStore;
