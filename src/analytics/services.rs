use std::collections::BTreeMap;

use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::warn;

use crate::analytics::{
    dto::{
        AdvancedStats, BasicAnalytics, DailyCount, GameStats, Predictions, TrendsResponse, UserStats,
    },
    repo::{self, Tracked},
};
use crate::db::Gateway;
use crate::games::{self, GameMetrics};
use crate::users::{ActiveCounts, RoleCount, User};

pub const DEFAULT_PERIOD: &str = "7d";
/// Trailing window the predictions are computed from.
pub const PREDICTION_WINDOW_DAYS: i64 = 30;

pub fn timestamp() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

/// Days covered by a trends period. Anything unrecognized is a week.
pub fn period_days(period: &str) -> i64 {
    match period {
        "30d" => 30,
        "1y" => 365,
        _ => 7,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Catalog summary. Games without a category are left out of
/// `by_category`; `avg_price` only looks at paid games.
pub fn summarize_games(games: &[GameMetrics]) -> GameStats {
    let mut by_category = BTreeMap::new();
    for category in games.iter().filter_map(|g| g.category.as_ref()) {
        *by_category.entry(category.clone()).or_insert(0) += 1;
    }

    let paid = || games.iter().filter(|g| g.is_free == Some(false));

    GameStats {
        total: games.len(),
        by_category,
        avg_price: mean(paid().filter_map(|g| g.price)).unwrap_or(0.0),
        avg_rating: mean(games.iter().filter_map(|g| g.rating)).unwrap_or(0.0),
        total_downloads: games.iter().filter_map(|g| g.downloads).sum(),
        free_games: games.iter().filter(|g| g.is_free == Some(true)).count(),
        paid_games: paid().count(),
    }
}

/// Users with a NULL role count toward `total` but get no `by_role` entry.
pub fn summarize_users(roles: &[RoleCount], active: ActiveCounts) -> UserStats {
    UserStats {
        total: roles.iter().map(|r| r.count).sum(),
        by_role: roles
            .iter()
            .filter_map(|r| Some((r.role?.to_string(), r.count)))
            .collect(),
        active_users: active.active,
    }
}

/// Mean over the days that had at least one creation.
pub fn average_daily(days: &[DailyCount]) -> f64 {
    mean(days.iter().map(|d| d.count as f64)).unwrap_or(0.0)
}

pub fn project(avg_daily: f64, method: &'static str) -> Predictions {
    Predictions {
        next_7_days: round2(avg_daily * 7.0),
        next_30_days: round2(avg_daily * 30.0),
        based_on_days: PREDICTION_WINDOW_DAYS,
        method,
    }
}

/// Counts and group-bys that only need SQL. A failing group-by reads as an
/// empty list.
pub async fn basic(gw: &Gateway) -> BasicAnalytics {
    let stats = gw.stats().await;
    let categories = games::repo::category_counts(gw).await.unwrap_or_else(|e| {
        warn!(error = %e, "category counts unavailable");
        Vec::new()
    });
    let roles = User::role_counts(gw).await.unwrap_or_else(|e| {
        warn!(error = %e, "role counts unavailable");
        Vec::new()
    });
    BasicAnalytics {
        success: true,
        stats,
        categories,
        roles,
        timestamp: timestamp(),
    }
}

pub async fn advanced(gw: &Gateway) -> anyhow::Result<AdvancedStats> {
    let games = games::repo::metrics(gw).await?;
    let roles = User::role_counts(gw).await?;
    let active = User::active_counts(gw).await?;
    Ok(AdvancedStats {
        games: summarize_games(&games),
        users: summarize_users(&roles, active),
    })
}

pub async fn trends(gw: &Gateway, period: Option<String>) -> TrendsResponse {
    let period = period.unwrap_or_else(|| DEFAULT_PERIOD.to_string());
    let days = period_days(&period);
    let load = |tracked| async move {
        repo::daily_created(gw, tracked, days).await.unwrap_or_else(|e| {
            warn!(error = %e, ?tracked, "trend query failed");
            Vec::new()
        })
    };
    TrendsResponse {
        success: true,
        games: load(Tracked::Games).await,
        users: load(Tracked::Users).await,
        period,
        days,
    }
}

/// Naive projection of game creations. With the advanced capability the
/// daily mean is taken over active days only, otherwise over the whole
/// window.
pub async fn predictions(gw: &Gateway, advanced: bool) -> anyhow::Result<Predictions> {
    if advanced {
        let days = repo::daily_created(gw, Tracked::Games, PREDICTION_WINDOW_DAYS).await?;
        return Ok(project(average_daily(&days), "daily_mean"));
    }

    let total = repo::created_total(gw, Tracked::Games, PREDICTION_WINDOW_DAYS)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "creation total unavailable");
            0
        });
    Ok(project(total as f64 / PREDICTION_WINDOW_DAYS as f64, "basic"))
}
