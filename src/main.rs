use anyhow::Result;
use clap::{Parser, Subcommand};
use lightbnb_data::{Config, DataError, ListingStore, PgStore, SearchFilter, DEFAULT_LIMIT};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Query the LightBnB database from the command line
#[derive(Parser)]
#[command(name = "lightbnb", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search properties, cheapest first
    Search {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        owner_id: Option<i32>,
        /// Dollars per night
        #[arg(long)]
        min_price: Option<i64>,
        /// Dollars per night
        #[arg(long)]
        max_price: Option<i64>,
        #[arg(long)]
        min_rating: Option<f64>,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: i64,
    },
    /// Look up a single user
    User {
        #[arg(long, conflicts_with = "id", required_unless_present = "id")]
        email: Option<String>,
        #[arg(long)]
        id: Option<i32>,
    },
    /// List a guest's past reservations
    Reservations {
        #[arg(long)]
        guest_id: i32,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lightbnb=info,lightbnb_data=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::from_env();
    let store = PgStore::connect(&config)
        .await
        .map_err(|err| failure(err, "Failed to connect to the database"))?;

    info!("Using {} store", store.source_name());

    match cli.command {
        Command::Search {
            city,
            owner_id,
            min_price,
            max_price,
            min_rating,
            limit,
        } => {
            let filter = SearchFilter {
                city,
                owner_id,
                minimum_price_per_night: min_price,
                maximum_price_per_night: max_price,
                minimum_rating: min_rating,
            };
            let properties = store
                .get_all_properties(&filter, limit)
                .await
                .map_err(|err| failure(err, "Property search failed"))?;

            info!("Found {} properties", properties.len());
            print_json(&properties)?;
        }
        Command::User { email, id } => {
            let user = match (email, id) {
                (Some(email), _) => store.get_user_with_email(&email).await,
                (None, Some(id)) => store.get_user_with_id(id).await,
                (None, None) => anyhow::bail!("Pass --email or --id"),
            }
            .map_err(|err| failure(err, "User lookup failed"))?;

            match user {
                Some(user) => print_json(&user)?,
                None => info!("No such user"),
            }
        }
        Command::Reservations { guest_id, limit } => {
            let reservations = store
                .get_all_reservations(guest_id, limit)
                .await
                .map_err(|err| failure(err, "Reservation lookup failed"))?;

            info!("Found {} past reservations", reservations.len());
            print_json(&reservations)?;
        }
    }

    Ok(())
}

/// Attach context to a store error, noting when running again may succeed.
fn failure(err: DataError, action: &'static str) -> anyhow::Error {
    if err.is_retryable() {
        warn!("The database is unreachable right now; the command can be retried");
    }
    anyhow::Error::new(err).context(action)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_keeps_the_store_error_under_its_context() {
        let err = failure(
            DataError::from(sqlx::Error::PoolTimedOut),
            "Failed to connect to the database",
        );

        assert_eq!(err.to_string(), "Failed to connect to the database");
        let cause = err.downcast_ref::<DataError>().unwrap();
        assert!(cause.is_retryable());
    }

    #[test]
    fn failure_of_bad_input_is_not_retryable() {
        let err = failure(
            DataError::invalid_input("limit must be at least 1, got 0"),
            "Property search failed",
        );

        let cause = err.downcast_ref::<DataError>().unwrap();
        assert!(!cause.is_retryable());
    }
}
