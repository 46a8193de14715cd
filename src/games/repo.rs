use crate::db::Gateway;
use crate::games::repo_types::{CategoryCount, GameMetrics, NewGame};
use crate::params;

/// Inserts `game` unless a game with the same title exists. The table has
/// no natural key, so the guard is on `title`. Returns whether a row was
/// written.
pub async fn insert_if_absent(gw: &Gateway, game: &NewGame, created_by: i64) -> anyhow::Result<bool> {
    let result = gw
        .execute(
            r#"
            INSERT INTO games (
                title, subtitle, description, image_url, category, color,
                price, original_price, discount, badge, logo, is_free,
                rating, downloads, created_by
            )
            SELECT $1, $2, $3, $4, $5, $6,
                   $7::numeric, $8::numeric, $9::int, $10, $11, $12,
                   $13::numeric, $14::int, $15::int
            WHERE NOT EXISTS (SELECT 1 FROM games WHERE title = $16)
            "#,
            &params![
                game.title.as_str(),
                game.subtitle.as_deref(),
                game.description.as_deref(),
                game.image_url.as_deref(),
                game.category.as_deref(),
                game.color.as_deref(),
                game.price,
                game.original_price,
                game.discount,
                game.badge.as_deref(),
                game.logo.as_deref(),
                game.is_free,
                game.rating,
                game.downloads,
                created_by,
                game.title.as_str(),
            ],
        )
        .await;
    Ok(result.try_affected()? > 0)
}

pub async fn metrics(gw: &Gateway) -> anyhow::Result<Vec<GameMetrics>> {
    gw.query(
        "SELECT category, price, rating, downloads, is_free FROM games",
        &[],
    )
    .await
    .try_rows_as()
}

pub async fn category_counts(gw: &Gateway) -> anyhow::Result<Vec<CategoryCount>> {
    gw.query(
        r#"
        SELECT category, COUNT(*) AS count
        FROM games
        GROUP BY category
        ORDER BY count DESC
        "#,
        &[],
    )
    .await
    .try_rows_as()
}
