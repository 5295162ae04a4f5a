//! Restaurant catalog: restaurants, menu items, listing queries and pagination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MenuItemId, Price, RestaurantId};

/// Default page size for restaurant listings.
pub const DEFAULT_PAGE_SIZE: u32 = 6;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A restaurant in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    pub cuisine: String,
    /// Average rating in `0.0..=5.0`.
    pub rating: f64,
    /// Estimated delivery time in minutes.
    pub delivery_time: i32,
    pub price_range: Option<String>,
    pub image: Option<String>,
    pub address: String,
    pub description: Option<String>,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

/// A dish offered by exactly one restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub price: Price,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub is_popular: bool,
}

/// Catalog fixture: restaurants with their menus.
///
/// Used by `foodhub-cli seed` and by the in-memory store in tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    pub restaurants: Vec<RestaurantSeed>,
}

/// One restaurant in a [`CatalogSeed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSeed {
    pub name: String,
    pub cuisine: String,
    #[serde(default)]
    pub rating: f64,
    pub delivery_time: i32,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub address: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_open")]
    pub is_open: bool,
    #[serde(default)]
    pub menu: Vec<MenuItemSeed>,
}

/// One menu item in a [`RestaurantSeed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemSeed {
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_popular: bool,
}

const fn default_open() -> bool {
    true
}

/// Sort orders supported by restaurant listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestaurantSort {
    /// Highest rating first.
    RatingDesc,
    /// Fastest delivery first.
    DeliveryTimeAsc,
}

impl RestaurantSort {
    /// Parse the `sort` query parameter. Unknown keys mean "no sort".
    #[must_use]
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "rating" => Some(Self::RatingDesc),
            "deliveryTime" => Some(Self::DeliveryTimeAsc),
            _ => None,
        }
    }
}

/// A page request over the restaurant catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantQuery {
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    /// Exact cuisine match.
    pub cuisine: Option<String>,
    pub sort: Option<RestaurantSort>,
    /// Case-insensitive substring over name and cuisine.
    pub search: Option<String>,
}

impl Default for RestaurantQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            cuisine: None,
            sort: None,
            search: None,
        }
    }
}

impl RestaurantQuery {
    /// Build a query from raw query-string values.
    ///
    /// Missing, non-numeric or non-positive `page`/`limit` fall back to the
    /// defaults; `limit` is capped at [`MAX_PAGE_SIZE`]. Blank filters are
    /// ignored.
    #[must_use]
    pub fn from_params(
        page: Option<&str>,
        limit: Option<&str>,
        cuisine: Option<&str>,
        sort: Option<&str>,
        search: Option<&str>,
    ) -> Self {
        let positive = |raw: Option<&str>| {
            raw.and_then(|s| s.trim().parse::<u32>().ok())
                .filter(|n| *n > 0)
        };
        let non_blank = |raw: Option<&str>| {
            raw.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        Self {
            page: positive(page).unwrap_or(1),
            limit: positive(limit)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
            cuisine: non_blank(cuisine),
            sort: sort.and_then(|s| RestaurantSort::from_param(s.trim())),
            search: non_blank(search),
        }
    }

    /// Number of rows to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Whether a restaurant passes the cuisine and search filters.
    ///
    /// Stores that cannot push filtering down to the database use this.
    #[must_use]
    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        if let Some(cuisine) = &self.cuisine
            && restaurant.cuisine != *cuisine
        {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            return restaurant.name.to_lowercase().contains(&needle)
                || restaurant.cuisine.to_lowercase().contains(&needle);
        }
        true
    }
}

/// Reference to a neighbouring page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: u32,
    pub limit: u32,
}

/// Pagination metadata returned alongside a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub pages: u64,
    pub current_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    /// Compute pagination metadata for `query` over `total` matching rows.
    #[must_use]
    pub fn new(query: &RestaurantQuery, total: u64) -> Self {
        let limit = u64::from(query.limit.max(1));
        let offset = query.offset();

        Self {
            total,
            pages: total.div_ceil(limit),
            current_page: query.page,
            next: (offset + limit < total).then(|| PageRef {
                page: query.page + 1,
                limit: query.limit,
            }),
            prev: (offset > 0).then(|| PageRef {
                page: query.page - 1,
                limit: query.limit,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn restaurant(name: &str, cuisine: &str) -> Restaurant {
        Restaurant {
            id: RestaurantId::new(1),
            name: name.to_owned(),
            cuisine: cuisine.to_owned(),
            rating: 4.0,
            delivery_time: 25,
            price_range: None,
            image: None,
            address: "1 Main St".to_owned(),
            description: None,
            is_open: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_from_params_defaults_and_clamps() {
        let q = RestaurantQuery::from_params(Some("abc"), Some("0"), Some("  "), Some("nope"), None);
        assert_eq!(q, RestaurantQuery::default());

        let q = RestaurantQuery::from_params(Some("3"), Some("500"), Some("Thai"), Some("rating"), Some(" pad "));
        assert_eq!(q.page, 3);
        assert_eq!(q.limit, MAX_PAGE_SIZE);
        assert_eq!(q.cuisine.as_deref(), Some("Thai"));
        assert_eq!(q.sort, Some(RestaurantSort::RatingDesc));
        assert_eq!(q.search.as_deref(), Some("pad"));
    }

    #[test]
    fn test_matches_search_is_case_insensitive_over_name_and_cuisine() {
        let r = restaurant("Golden Dragon", "Chinese");
        let by_name = RestaurantQuery {
            search: Some("DRAGON".to_owned()),
            ..RestaurantQuery::default()
        };
        let by_cuisine = RestaurantQuery {
            search: Some("chin".to_owned()),
            ..RestaurantQuery::default()
        };
        let miss = RestaurantQuery {
            search: Some("taco".to_owned()),
            ..RestaurantQuery::default()
        };
        assert!(by_name.matches(&r));
        assert!(by_cuisine.matches(&r));
        assert!(!miss.matches(&r));
    }

    #[test]
    fn test_cuisine_filter_is_exact() {
        let r = restaurant("Golden Dragon", "Chinese");
        let q = RestaurantQuery {
            cuisine: Some("chinese".to_owned()),
            ..RestaurantQuery::default()
        };
        assert!(!q.matches(&r));
    }

    #[test]
    fn test_pagination_first_middle_last() {
        let mut q = RestaurantQuery::default();
        let first = Pagination::new(&q, 14);
        assert_eq!(first.pages, 3);
        assert_eq!(first.next, Some(PageRef { page: 2, limit: 6 }));
        assert_eq!(first.prev, None);

        q.page = 2;
        let middle = Pagination::new(&q, 14);
        assert!(middle.next.is_some());
        assert_eq!(middle.prev, Some(PageRef { page: 1, limit: 6 }));

        q.page = 3;
        let last = Pagination::new(&q, 14);
        assert_eq!(last.next, None);
        assert_eq!(last.current_page, 3);
    }

    #[test]
    fn test_pagination_empty_catalog() {
        let p = Pagination::new(&RestaurantQuery::default(), 0);
        assert_eq!(p.pages, 0);
        assert!(p.next.is_none() && p.prev.is_none());
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("next").is_none());
        assert_eq!(json["currentPage"], 1);
    }
}
