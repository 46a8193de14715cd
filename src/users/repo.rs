use crate::db::Gateway;
use crate::params;
use crate::users::repo_types::{ActiveCounts, Activity, Credentials, NewUser, RoleCount, User};

const USER_COLUMNS: &str =
    "id, username, email, role, full_name, avatar_url, is_active, created_at, updated_at";

impl User {
    pub async fn find_by_username(gw: &Gateway, username: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        Ok(gw.query(&sql, &params![username]).await.try_rows_as()?.into_iter().next())
    }

    pub async fn find_by_email(gw: &Gateway, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(gw.query(&sql, &params![email]).await.try_rows_as()?.into_iter().next())
    }

    /// Matches either column.
    pub async fn find_by_login(gw: &Gateway, username_or_email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $2");
        Ok(gw
            .query(&sql, &params![username_or_email, username_or_email])
            .await
            .try_rows_as()?
            .into_iter()
            .next())
    }

    /// Newest first.
    pub async fn list_all(gw: &Gateway) -> anyhow::Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        gw.query(&sql, &[]).await.try_rows_as()
    }

    pub async fn recent(gw: &Gateway, limit: i64) -> anyhow::Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1");
        gw.query(&sql, &params![limit]).await.try_rows_as()
    }

    /// The bootstrap account, looked up by its fixed username.
    pub async fn find_admin(gw: &Gateway) -> anyhow::Result<Option<User>> {
        Self::find_by_username(gw, "admin").await
    }

    /// Any user holding the admin role.
    pub async fn first_admin_id(gw: &Gateway) -> anyhow::Result<Option<i64>> {
        let result = gw
            .query("SELECT id FROM users WHERE role = 'admin' ORDER BY id LIMIT 1", &[])
            .await;
        if let Some(e) = result.error() {
            return Err(e.clone().into());
        }
        Ok(result.scalar_i64("id"))
    }

    pub async fn role_counts(gw: &Gateway) -> anyhow::Result<Vec<RoleCount>> {
        gw.query(
            r#"
            SELECT role, COUNT(*) AS count
            FROM users
            GROUP BY role
            ORDER BY count DESC
            "#,
            &[],
        )
        .await
        .try_rows_as()
    }

    pub async fn active_counts(gw: &Gateway) -> anyhow::Result<ActiveCounts> {
        let rows: Vec<ActiveCounts> = gw
            .query(
                r#"
                SELECT
                    COUNT(*) FILTER (WHERE is_active = true) AS active,
                    COUNT(*) FILTER (WHERE is_active = false) AS inactive
                FROM users
                "#,
                &[],
            )
            .await
            .try_rows_as()?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    pub async fn recent_activities(
        gw: &Gateway,
        user_id: i64,
        limit: i64,
    ) -> anyhow::Result<Vec<Activity>> {
        gw.query(
            r#"
            SELECT activity_type, activity_data, created_at
            FROM user_activities
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
            &params![user_id, limit],
        )
        .await
        .try_rows_as()
    }

    pub async fn credentials_by_email(gw: &Gateway, email: &str) -> anyhow::Result<Option<Credentials>> {
        Ok(gw
            .query(
                "SELECT id, username, email, is_active, password FROM users WHERE email = $1",
                &params![email],
            )
            .await
            .try_rows_as()?
            .into_iter()
            .next())
    }

    /// Insert a new user and return the stored row.
    pub async fn create(gw: &Gateway, new: &NewUser) -> anyhow::Result<User> {
        let sql = format!(
            "INSERT INTO users (username, email, password, full_name, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        );
        let result = gw
            .query(
                &sql,
                &params![
                    new.username.as_str(),
                    new.email.as_str(),
                    new.password_hash.as_str(),
                    new.full_name.as_deref(),
                    new.role.as_str()
                ],
            )
            .await;
        result
            .try_rows_as::<User>()?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("insert returned no row"))
    }
}
