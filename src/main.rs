use anyhow::{Context, Result};
use blogvault::http::{build_router, AppState};
use blogvault::infra::api::{AssetStore, CloudinaryClient};
use blogvault::infra::db::setup_database;
use blogvault::infra::logging::init_tracing;
use blogvault::types::AppConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 環境変数を読み込み（.envファイルがあれば使用）
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::from_env().context("設定の読み込みに失敗しました")?;

    let pool = setup_database(&config.database_url)
        .await
        .context("データベースの準備に失敗しました")?;

    let store = CloudinaryClient::new(config.cloudinary.clone());
    // 疎通確認の失敗は起動を止めない
    match store.ping().await {
        Ok(()) => info!(cloud_name = %config.cloudinary.cloud_name, "Cloudinaryへの接続に成功しました"),
        Err(e) => error!(error = %e, "Cloudinaryへの接続に失敗しました"),
    }

    let state = AppState::new(
        pool,
        Arc::new(store),
        config.upload_concurrency,
        config.slug_max_attempts,
    );
    let app = build_router(state, &config.cors_origin, config.max_upload_bytes)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("ポート{}のバインドに失敗しました", config.port))?;
    info!(%addr, "サーバーを起動しました");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("サーバーが異常終了しました")?;

    info!("サーバーを停止しました");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "シグナルの待機に失敗しました");
    }
}
