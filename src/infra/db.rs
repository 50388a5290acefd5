use crate::types::{InfraError, InfraResult};
use sqlx::PgPool;
use tracing::info;

/// データベース接続プールを作成
pub async fn create_pool(database_url: &str) -> InfraResult<PgPool> {
    PgPool::connect(database_url)
        .await
        .map_err(InfraError::database_connection)
}

/// データベースの初期化（マイグレーション実行）
pub async fn initialize_database(pool: &PgPool) -> InfraResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(InfraError::migration)
}

/// プールの作成とデータベース初期化を一括で行う便利関数
pub async fn setup_database(database_url: &str) -> InfraResult<PgPool> {
    let pool = create_pool(database_url).await?;
    initialize_database(&pool).await?;
    info!("データベース接続とマイグレーションが完了しました");
    Ok(pool)
}
