//! SQLite 接続とマイグレーション

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// SQLite への接続プールを作成し、マイグレーションを適用する
///
/// # Arguments
///
/// * `database_url` - 接続文字列（例: `sqlite:shitei.db?mode=rwc`、`sqlite::memory:`）
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(database_url)
        .await?;
    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;
    Ok(pool)
}
