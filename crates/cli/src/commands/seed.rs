//! Seed the database with a restaurant catalog.
//!
//! The fixture is the same JSON shape `POST /restaurants` accepts, wrapped
//! in `{"restaurants": [...]}`. Without `--file` the catalog bundled with
//! the API crate is used.

use std::path::Path;

use foodhub_api::db::{CatalogStore, PgStore};
use foodhub_api::services::validate_seed;
use foodhub_core::{CatalogSeed, RestaurantQuery};
use tracing::info;

use super::connect;

/// Catalog shipped with the API crate.
const BUNDLED_CATALOG: &str = include_str!("../../../api/fixtures/catalog.json");

/// Insert every restaurant of a catalog file.
///
/// # Arguments
///
/// * `file_path` - JSON catalog, or `None` for the bundled one
/// * `force` - Insert even if restaurants already exist
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if database
/// operations fail.
pub async fn catalog(
    file_path: Option<&str>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = match file_path {
        Some(file_path) => {
            let path = Path::new(file_path);
            if !path.exists() {
                return Err(format!("File not found: {file_path}").into());
            }
            info!(path = %file_path, "Loading catalog from file");
            tokio::fs::read_to_string(path).await?
        }
        None => {
            info!("Loading bundled catalog");
            BUNDLED_CATALOG.to_owned()
        }
    };

    // Parse before connecting to the database
    let seed: CatalogSeed = serde_json::from_str(&content)?;
    info!(restaurants = seed.restaurants.len(), "Parsed catalog");
    for restaurant in &seed.restaurants {
        validate_seed(restaurant)
            .map_err(|e| format!("{}: {}", restaurant.name, e.public_message()))?;
    }

    let store = PgStore::new(connect().await?);

    let (_, existing) = store.list_restaurants(&RestaurantQuery::default()).await?;
    if existing > 0 && !force {
        return Err(format!(
            "Catalog already has {existing} restaurants; pass --force to insert anyway"
        )
        .into());
    }

    let inserted = store.seed_catalog(&seed).await?;
    info!("Seeding complete!");
    info!("  Restaurants inserted: {inserted}");
    info!(
        "  Menu items inserted: {}",
        seed.restaurants.iter().map(|r| r.menu.len()).sum::<usize>()
    );

    Ok(())
}
