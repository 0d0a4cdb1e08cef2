use color_eyre::Result;

use super::models::UserRow;
use super::Db;

const USER_COLUMNS: &str = "id, stytch_user_id, email, name, profile_picture_url";

impl Db {
    pub async fn get_user(&self, user_id: i64) -> Result<Option<UserRow>> {
        let user =
            sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Case-insensitive email lookup, so lead capture never duplicates a
    /// user who typed their address with different casing.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER(?)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn create_lead_user(&self, email: &str, name: &str) -> Result<UserRow> {
        let user = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (email, name) VALUES (?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("new lead user created: id={}", user.id);
        Ok(user)
    }

    /// Create-or-update keyed on the provider's user id. On a repeat login
    /// the provider's fields win, but absent fields never erase what is
    /// already stored.
    pub async fn upsert_oauth_user(
        &self,
        stytch_user_id: &str,
        email: Option<&str>,
        name: Option<&str>,
        profile_picture_url: Option<&str>,
    ) -> Result<UserRow> {
        let user = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (stytch_user_id, email, name, profile_picture_url)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(stytch_user_id) DO UPDATE SET
                email = COALESCE(excluded.email, users.email),
                name = COALESCE(excluded.name, users.name),
                profile_picture_url = COALESCE(excluded.profile_picture_url, users.profile_picture_url)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(stytch_user_id)
        .bind(email)
        .bind(name)
        .bind(profile_picture_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_user_name(&self, user_id: i64, name: &str) -> Result<()> {
        sqlx::query("UPDATE users SET name = ? WHERE id = ?")
            .bind(name)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
