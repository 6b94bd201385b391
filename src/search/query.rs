use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{DataError, Result};
use crate::search::SearchFilter;

pub const DEFAULT_LIMIT: i64 = 10;

const BASE_SELECT: &str = "SELECT properties.*, avg(property_reviews.rating)::float8 AS average_rating \
FROM properties \
LEFT JOIN property_reviews ON properties.id = property_reviews.property_id";

/// A value bound to a numbered placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i32),
    BigInt(i64),
    Float(f64),
}

/// Property search statement together with its positional parameters.
///
/// `params[i]` is bound to placeholder `$(i + 1)`, and the limit is always the
/// last parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    sql: String,
    params: Vec<SqlParam>,
}

impl SearchQuery {
    /// Compose the search statement for `filter`, capped at `limit` rows.
    ///
    /// Row predicates go into `WHERE` in the order city, owner, minimum price,
    /// maximum price. The rating bound applies to the per-property average, so
    /// it becomes a `HAVING` clause after `GROUP BY`.
    pub fn build(filter: &SearchFilter, limit: i64) -> Result<Self> {
        if limit < 1 {
            return Err(DataError::invalid_input(format!(
                "limit must be at least 1, got {limit}"
            )));
        }

        let mut builder = Builder::new(BASE_SELECT);

        if let Some(city) = filter.city_term() {
            builder.push_where("properties.city LIKE", SqlParam::Text(format!("%{city}%")));
        }

        if let Some(owner_id) = filter.owner_id {
            builder.push_where("properties.owner_id =", SqlParam::Int(owner_id));
        }

        if let Some(dollars) = filter.minimum_price_bound() {
            let cents = dollars_to_cents("minimum_price_per_night", dollars)?;
            builder.push_where("properties.cost_per_night >", SqlParam::BigInt(cents));
        }

        if let Some(dollars) = filter.maximum_price_bound() {
            let cents = dollars_to_cents("maximum_price_per_night", dollars)?;
            builder.push_where("properties.cost_per_night <", SqlParam::BigInt(cents));
        }

        builder.push_sql(" GROUP BY properties.id");

        if let Some(rating) = filter.rating_bound() {
            if !rating.is_finite() {
                return Err(DataError::invalid_input("minimum_rating must be a finite number"));
            }
            let n = builder.bind(SqlParam::Float(rating));
            builder.push_sql(&format!(" HAVING avg(property_reviews.rating) >= ${n}"));
        }

        builder.push_sql(" ORDER BY properties.cost_per_night, properties.id");
        let n = builder.bind(SqlParam::BigInt(limit));
        builder.push_sql(&format!(" LIMIT ${n}"));

        let query = builder.finish();
        debug!(sql = %query.sql, params = ?query.params, "composed property search");
        Ok(query)
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<SqlParam>) {
        (self.sql, self.params)
    }

    /// Placeholder numbers in the order they occur in the text.
    pub fn placeholder_indices(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        let mut chars = self.sql.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            if c != '$' {
                continue;
            }
            let mut digits = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }
            if let Ok(n) = digits.parse() {
                indices.push(n);
            }
        }

        indices
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholder_indices()
            .into_iter()
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Accumulates SQL text and parameters so placeholder numbers always match
/// parameter positions.
struct Builder {
    sql: String,
    params: Vec<SqlParam>,
    has_where: bool,
}

impl Builder {
    fn new(base: &str) -> Self {
        Self {
            sql: base.to_string(),
            params: Vec::new(),
            has_where: false,
        }
    }

    /// Returns the 1-based placeholder number of the new parameter.
    fn bind(&mut self, param: SqlParam) -> usize {
        self.params.push(param);
        self.params.len()
    }

    fn push_where(&mut self, predicate: &str, param: SqlParam) {
        let keyword = if self.has_where { "AND" } else { "WHERE" };
        self.has_where = true;
        let n = self.bind(param);
        self.sql.push_str(&format!(" {keyword} {predicate} ${n}"));
    }

    fn push_sql(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }

    fn finish(self) -> SearchQuery {
        SearchQuery {
            sql: self.sql,
            params: self.params,
        }
    }
}

fn dollars_to_cents(field: &str, dollars: i64) -> Result<i64> {
    if dollars < 0 {
        return Err(DataError::invalid_input(format!(
            "{field} must not be negative, got {dollars}"
        )));
    }
    dollars
        .checked_mul(100)
        .ok_or_else(|| DataError::invalid_input(format!("{field} is too large: {dollars}")))
}
