use crate::error::Result;
use crate::models::{NewProperty, NewUser, Property, PropertyWithRating, Reservation, User};
use crate::search::SearchFilter;
use async_trait::async_trait;

/// Data access used by the listing site.
///
/// Every call is independent: no state is kept between calls and nothing is
/// cached, so a write is visible to the next read.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Look up a user by email, ignoring case
    async fn get_user_with_email(&self, email: &str) -> Result<Option<User>>;

    async fn get_user_with_id(&self, id: i32) -> Result<Option<User>>;

    /// Create a user. Fails with `DuplicateEmail` if the email is taken.
    async fn add_user(&self, user: NewUser) -> Result<User>;

    /// Past reservations of a guest, oldest first
    async fn get_all_reservations(&self, guest_id: i32, limit: i64) -> Result<Vec<Reservation>>;

    /// Properties matching `filter`, cheapest first, with their average rating
    async fn get_all_properties(
        &self,
        filter: &SearchFilter,
        limit: i64,
    ) -> Result<Vec<PropertyWithRating>>;

    async fn add_property(&self, property: NewProperty) -> Result<Property>;

    /// Get the name of the storage backend
    fn source_name(&self) -> &'static str;
}
