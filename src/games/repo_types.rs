use serde::{Deserialize, Serialize};

/// Catalog entry to insert. Prices are in the store currency.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGame {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub discount: Option<i64>,
    pub badge: Option<String>,
    pub logo: Option<String>,
    pub is_free: bool,
    pub rating: f64,
    pub downloads: i64,
}

/// The columns the analytics summaries need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub downloads: Option<i64>,
    #[serde(default)]
    pub is_free: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Option<String>,
    pub count: i64,
}
