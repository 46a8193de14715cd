use crate::analytics::dto::DailyCount;
use crate::db::Gateway;
use crate::params;

/// Tables with a `created_at` column that trends are reported for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracked {
    Games,
    Users,
}

impl Tracked {
    fn table(self) -> &'static str {
        match self {
            Tracked::Games => "games",
            Tracked::Users => "users",
        }
    }
}

/// Per-day creation counts over the trailing `days`, oldest first.
pub async fn daily_created(gw: &Gateway, tracked: Tracked, days: i64) -> anyhow::Result<Vec<DailyCount>> {
    let sql = format!(
        r#"
        SELECT to_char(DATE(created_at), 'YYYY-MM-DD') AS date, COUNT(*) AS count
        FROM {}
        WHERE created_at >= CURRENT_TIMESTAMP - make_interval(days => $1::int)
        GROUP BY DATE(created_at)
        ORDER BY DATE(created_at)
        "#,
        tracked.table()
    );
    gw.query(&sql, &params![days]).await.try_rows_as()
}

pub async fn created_total(gw: &Gateway, tracked: Tracked, days: i64) -> anyhow::Result<i64> {
    let sql = format!(
        "SELECT COUNT(*) AS total FROM {} \
         WHERE created_at >= CURRENT_TIMESTAMP - make_interval(days => $1::int)",
        tracked.table()
    );
    let result = gw.query(&sql, &params![days]).await;
    if let Some(e) = result.error() {
        return Err(e.clone().into());
    }
    Ok(result.scalar_i64("total").unwrap_or(0))
}
