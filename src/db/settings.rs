use color_eyre::Result;

use super::models::AppSettingsRow;
use super::Db;

impl Db {
    /// The single app-settings row, seeded by migration.
    pub async fn get_app_settings(&self) -> Result<AppSettingsRow> {
        let settings = sqlx::query_as::<_, AppSettingsRow>(
            "SELECT id, notify_admin, admin_notification_email FROM app_settings WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(settings)
    }

    pub async fn update_app_settings(
        &self,
        notify_admin: Option<bool>,
        admin_notification_email: Option<Option<&str>>,
    ) -> Result<AppSettingsRow> {
        if let Some(notify_admin) = notify_admin {
            sqlx::query("UPDATE app_settings SET notify_admin = ? WHERE id = 1")
                .bind(notify_admin)
                .execute(&self.pool)
                .await?;
        }
        if let Some(email) = admin_notification_email {
            sqlx::query("UPDATE app_settings SET admin_notification_email = ? WHERE id = 1")
                .bind(email)
                .execute(&self.pool)
                .await?;
        }

        self.get_app_settings().await
    }
}
