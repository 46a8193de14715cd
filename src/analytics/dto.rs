use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::DbStats;
use crate::games::CategoryCount;
use crate::users::RoleCount;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct BasicAnalytics {
    pub success: bool,
    pub stats: DbStats,
    pub categories: Vec<CategoryCount>,
    pub roles: Vec<RoleCount>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStats {
    pub total: usize,
    pub by_category: BTreeMap<String, i64>,
    pub avg_price: f64,
    pub avg_rating: f64,
    pub total_downloads: i64,
    pub free_games: usize,
    pub paid_games: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub total: i64,
    pub by_role: BTreeMap<String, i64>,
    pub active_users: i64,
}

#[derive(Debug, Serialize)]
pub struct AdvancedStats {
    pub games: GameStats,
    pub users: UserStats,
}

#[derive(Debug, Serialize)]
pub struct AdvancedAnalytics {
    pub success: bool,
    pub stats: AdvancedStats,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    pub period: Option<String>,
}

/// Rows created on one calendar day (`YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub success: bool,
    pub games: Vec<DailyCount>,
    pub users: Vec<DailyCount>,
    pub period: String,
    pub days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predictions {
    pub next_7_days: f64,
    pub next_30_days: f64,
    pub based_on_days: i64,
    pub method: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PredictionsResponse {
    pub success: bool,
    pub predictions: Predictions,
}
