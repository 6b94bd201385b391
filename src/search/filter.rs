use serde::{Deserialize, Serialize};

/// Search parameters for property listings.
///
/// Every field is optional and an absent field imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Substring of the city name
    pub city: Option<String>,
    /// Exact owner
    pub owner_id: Option<i32>,
    /// Exclusive lower bound on the nightly price (dollars)
    pub minimum_price_per_night: Option<i64>,
    /// Exclusive upper bound on the nightly price (dollars)
    pub maximum_price_per_night: Option<i64>,
    /// Inclusive lower bound on the average review rating
    pub minimum_rating: Option<f64>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_owner(mut self, owner_id: i32) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn with_minimum_price(mut self, dollars: i64) -> Self {
        self.minimum_price_per_night = Some(dollars);
        self
    }

    pub fn with_maximum_price(mut self, dollars: i64) -> Self {
        self.maximum_price_per_night = Some(dollars);
        self
    }

    pub fn with_minimum_rating(mut self, rating: f64) -> Self {
        self.minimum_rating = Some(rating);
        self
    }

    /// The city to match on, if any. Blank input from a search form means "any city".
    pub fn city_term(&self) -> Option<&str> {
        self.city.as_deref().filter(|city| !city.trim().is_empty())
    }

    /// Lower price bound in dollars. Zero is the form's "no minimum".
    pub fn minimum_price_bound(&self) -> Option<i64> {
        self.minimum_price_per_night.filter(|dollars| *dollars != 0)
    }

    /// Upper price bound in dollars. Zero is the form's "no maximum".
    pub fn maximum_price_bound(&self) -> Option<i64> {
        self.maximum_price_per_night.filter(|dollars| *dollars != 0)
    }

    /// Rating bound. Zero means "any rating", which must still include
    /// properties that have no reviews.
    pub fn rating_bound(&self) -> Option<f64> {
        self.minimum_rating.filter(|rating| *rating != 0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.city_term().is_none()
            && self.owner_id.is_none()
            && self.minimum_price_bound().is_none()
            && self.maximum_price_bound().is_none()
            && self.rating_bound().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_empty() {
        assert!(SearchFilter::new().is_empty());
    }

    #[test]
    fn blank_city_is_ignored() {
        let filter = SearchFilter::new().with_city("   ");
        assert_eq!(filter.city_term(), None);
        assert!(filter.is_empty());

        let filter = SearchFilter::new().with_city("Van");
        assert_eq!(filter.city_term(), Some("Van"));
        assert!(!filter.is_empty());
    }

    #[test]
    fn zero_bounds_are_ignored() {
        let filter = SearchFilter::new()
            .with_minimum_price(0)
            .with_maximum_price(0)
            .with_minimum_rating(0.0);

        assert_eq!(filter.minimum_price_bound(), None);
        assert_eq!(filter.maximum_price_bound(), None);
        assert_eq!(filter.rating_bound(), None);
        assert!(filter.is_empty());

        let filter = SearchFilter::new()
            .with_minimum_price(50)
            .with_minimum_rating(4.0);
        assert_eq!(filter.minimum_price_bound(), Some(50));
        assert_eq!(filter.rating_bound(), Some(4.0));
    }

    #[test]
    fn deserializes_sparse_form_values() {
        let filter: SearchFilter =
            serde_json::from_str(r#"{"city": "Calgary", "minimum_rating": 4}"#).unwrap();

        assert_eq!(filter.city.as_deref(), Some("Calgary"));
        assert_eq!(filter.minimum_rating, Some(4.0));
        assert_eq!(filter.owner_id, None);
        assert_eq!(filter.minimum_price_per_night, None);
    }
}
