use crate::infra::api::cloudinary::AssetStore;
use sqlx::PgPool;
use std::sync::Arc;

/// ハンドラ間で共有する状態
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub store: Arc<dyn AssetStore>,
    /// セクション画像を同時にアップロードする最大数
    pub upload_concurrency: usize,
    pub slug_max_attempts: u32,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        store: Arc<dyn AssetStore>,
        upload_concurrency: usize,
        slug_max_attempts: u32,
    ) -> Self {
        Self {
            pool,
            store,
            upload_concurrency,
            slug_max_attempts,
        }
    }
}
