use crate::config::Config;
use crate::error::{DataError, Result};
use crate::models::{NewProperty, NewUser, Property, PropertyWithRating, Reservation, User};
use crate::search::{SearchFilter, SearchQuery, SqlParam};
use crate::store::traits::ListingStore;
use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions};
use sqlx::query::QueryAs;
use sqlx::Postgres;
use tracing::{debug, error, info};

const USER_COLUMNS: &str = "id, name, email, password";

const PROPERTY_COLUMNS: &str = "id, owner_id, title, description, thumbnail_photo_url, \
cover_photo_url, cost_per_night, street, city, province, post_code, country, \
parking_spaces, number_of_bathrooms, number_of_bedrooms";

/// Postgres-backed store. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a connection pool with the configured credentials
    pub async fn connect(config: &Config) -> Result<Self> {
        info!(
            "Connecting to {}:{}/{}...",
            config.db_host, config.db_port, config.db_name
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_with(config.connect_options())
            .await
            .map_err(failed("connect"))?;

        info!("Database connection established");
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ListingStore for PgStore {
    async fn get_user_with_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");

        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(failed("get_user_with_email"))
    }

    async fn get_user_with_id(&self, id: i32) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(failed("get_user_with_id"))
    }

    async fn add_user(&self, user: NewUser) -> Result<User> {
        require_text("name", &user.name)?;
        require_text("email", &user.email)?;
        require_text("password", &user.password)?;

        if self.get_user_with_email(&user.email).await?.is_some() {
            debug!(email = %user.email, "email already registered");
            return Err(DataError::DuplicateEmail(user.email));
        }

        let sql = format!(
            "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );

        let inserted = sqlx::query_as::<_, User>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password)
            .fetch_one(&self.pool)
            .await
            .map_err(DataError::from);

        match inserted {
            Ok(created) => {
                info!(user_id = created.id, "user created");
                Ok(created)
            }
            // A concurrent insert won between the check and ours
            Err(err) if err.is_unique_violation() => Err(DataError::DuplicateEmail(user.email)),
            Err(err) => {
                error!(operation = "add_user", error = %err, "query failed");
                Err(err)
            }
        }
    }

    async fn get_all_reservations(&self, guest_id: i32, limit: i64) -> Result<Vec<Reservation>> {
        require_limit(limit)?;

        sqlx::query_as::<_, Reservation>(
            "SELECT reservations.id, reservations.guest_id, reservations.property_id, \
                    reservations.start_date, reservations.end_date, \
                    properties.title, properties.number_of_bedrooms, \
                    properties.number_of_bathrooms, properties.parking_spaces, \
                    properties.thumbnail_photo_url, properties.cover_photo_url \
             FROM reservations \
             JOIN properties ON properties.id = reservations.property_id \
             WHERE reservations.guest_id = $1 \
               AND reservations.start_date < now()::date \
             ORDER BY reservations.start_date \
             LIMIT $2",
        )
        .bind(guest_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(failed("get_all_reservations"))
    }

    async fn get_all_properties(
        &self,
        filter: &SearchFilter,
        limit: i64,
    ) -> Result<Vec<PropertyWithRating>> {
        let search = SearchQuery::build(filter, limit)?;

        let query = search
            .params()
            .iter()
            .fold(sqlx::query_as::<_, PropertyWithRating>(search.sql()), bind_param);

        let properties = query
            .fetch_all(&self.pool)
            .await
            .map_err(failed("get_all_properties"))?;

        debug!("Found {} properties", properties.len());
        Ok(properties)
    }

    async fn add_property(&self, property: NewProperty) -> Result<Property> {
        validate_new_property(&property)?;

        let sql = format!(
            "INSERT INTO properties (owner_id, title, description, thumbnail_photo_url, \
             cover_photo_url, cost_per_night, street, city, province, post_code, country, \
             parking_spaces, number_of_bathrooms, number_of_bedrooms) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {PROPERTY_COLUMNS}"
        );

        let created = sqlx::query_as::<_, Property>(&sql)
            .bind(property.owner_id)
            .bind(&property.title)
            .bind(&property.description)
            .bind(&property.thumbnail_photo_url)
            .bind(&property.cover_photo_url)
            .bind(property.cost_per_night)
            .bind(&property.street)
            .bind(&property.city)
            .bind(&property.province)
            .bind(&property.post_code)
            .bind(&property.country)
            .bind(property.parking_spaces)
            .bind(property.number_of_bathrooms)
            .bind(property.number_of_bedrooms)
            .fetch_one(&self.pool)
            .await
            .map_err(failed("add_property"))?;

        info!(property_id = created.id, owner_id = created.owner_id, "property created");
        Ok(created)
    }

    fn source_name(&self) -> &'static str {
        "postgres"
    }
}

fn bind_param<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    param: &'q SqlParam,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    match param {
        SqlParam::Text(value) => query.bind(value.as_str()),
        SqlParam::Int(value) => query.bind(*value),
        SqlParam::BigInt(value) => query.bind(*value),
        SqlParam::Float(value) => query.bind(*value),
    }
}

/// Classify a driver error and log it against the operation that failed.
fn failed(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DataError {
    move |err| {
        let err = DataError::from(err);
        error!(operation, error = %err, "query failed");
        err
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DataError::invalid_input(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_limit(limit: i64) -> Result<()> {
    if limit < 1 {
        return Err(DataError::invalid_input(format!(
            "limit must be at least 1, got {limit}"
        )));
    }
    Ok(())
}

fn validate_new_property(property: &NewProperty) -> Result<()> {
    require_text("title", &property.title)?;

    let counts = [
        ("cost_per_night", property.cost_per_night),
        ("parking_spaces", property.parking_spaces),
        ("number_of_bathrooms", property.number_of_bathrooms),
        ("number_of_bedrooms", property.number_of_bedrooms),
    ];
    for (field, value) in counts {
        if value < 0 {
            return Err(DataError::invalid_input(format!(
                "{field} must not be negative, got {value}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_property() -> NewProperty {
        NewProperty {
            owner_id: 1,
            title: "Speed lamp".to_string(),
            description: "description".to_string(),
            thumbnail_photo_url: "https://images.example/thumb.jpg".to_string(),
            cover_photo_url: "https://images.example/cover.jpg".to_string(),
            cost_per_night: 93_061,
            street: "536 Namsub Highway".to_string(),
            city: "Sotboske".to_string(),
            province: "Quebec".to_string(),
            post_code: "28142".to_string(),
            country: "Canada".to_string(),
            parking_spaces: 6,
            number_of_bathrooms: 4,
            number_of_bedrooms: 8,
        }
    }

    #[test]
    fn accepts_complete_property() {
        assert!(validate_new_property(&new_property()).is_ok());
    }

    #[test]
    fn rejects_blank_title() {
        let property = NewProperty {
            title: "  ".to_string(),
            ..new_property()
        };
        assert!(matches!(
            validate_new_property(&property),
            Err(DataError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_negative_counts() {
        let property = NewProperty {
            parking_spaces: -1,
            ..new_property()
        };
        assert!(matches!(
            validate_new_property(&property),
            Err(DataError::InvalidInput(_))
        ));

        let property = NewProperty {
            cost_per_night: -100,
            ..new_property()
        };
        assert!(matches!(
            validate_new_property(&property),
            Err(DataError::InvalidInput(_))
        ));
    }

    #[test]
    fn limit_must_be_positive() {
        assert!(require_limit(1).is_ok());
        assert!(matches!(require_limit(0), Err(DataError::InvalidInput(_))));
    }

    #[test]
    fn failed_classifies_the_error() {
        let err = failed("get_user_with_id")(sqlx::Error::PoolTimedOut);
        assert!(err.is_retryable());
    }
}
