//! HTTP層
//!
//! axumのルーター、ハンドラ、multipartの読み込み、レスポンス形式をまとめる。

pub mod handlers;
pub mod multipart;
pub mod response;
pub mod state;

pub use response::ApiError;
pub use state::AppState;

use crate::types::{ConfigError, ConfigResult};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// 全ルートのマウント先
pub const MOUNT_PATH: &str = "/api/routes/markdown";

/// 許可したオリジンのみを通すCORS設定
pub fn cors_layer(origin: &str) -> ConfigResult<CorsLayer> {
    let origin = HeaderValue::from_str(origin)
        .map_err(|_| ConfigError::invalid_value(format!("CORS_ORIGIN が不正です: {}", origin)))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true))
}

/// ルーターを構築する
pub fn build_router(
    state: AppState,
    cors_origin: &str,
    max_upload_bytes: usize,
) -> ConfigResult<Router> {
    let routes = Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload_markdown_file))
        .route("/upload/images", post(handlers::missing_slug))
        .route("/upload/images/:slug", post(handlers::upload_article_images))
        .route("/check-or-generate-slug", get(handlers::missing_slug))
        .route(
            "/check-or-generate-slug/:slug",
            get(handlers::check_or_generate_slug),
        )
        .route("/save", post(handlers::missing_slug))
        .route("/save/:slug", post(handlers::save_markdown))
        .route("/articles", get(handlers::list_articles));

    Ok(Router::new()
        .nest(MOUNT_PATH, routes)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors_layer(cors_origin)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
