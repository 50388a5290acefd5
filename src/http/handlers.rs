use super::multipart::read_multipart;
use super::response::{success, success_message, success_with_fields, ApiError};
use super::state::AppState;
use crate::domain::article::{save_markdown_article, NewArticle};
use crate::domain::asset::{generate_unique_slug, upload_article_assets, AssetBatch, MAX_SECTION_IMAGES};
use crate::domain::markdown::{list_markdown_resources, upload_markdown_document};
use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

pub const FIELD_FILE: &str = "file";
pub const FIELD_MARKDOWN: &str = "markdown";
pub const FIELD_SECTION_IMAGES: &str = "imagesSections";
pub const FIELD_TITLE_IMAGE: &str = "imageTitleData";

type ApiResult = Result<Json<Value>, ApiError>;

fn require_slug(slug: &str) -> Result<&str, ApiError> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(ApiError::bad_request("スラッグが指定されていません"));
    }
    Ok(slug)
}

/// GET / : 疎通確認用の固定レスポンス
pub async fn index() -> Json<Value> {
    success_message("Markdown APIは稼働中です")
}

/// スラッグなしで呼ばれたルート用
pub async fn missing_slug() -> ApiError {
    ApiError::bad_request("スラッグが指定されていません")
}

/// POST /upload : Markdownファイル1件をアップロードし、記録を保存する
pub async fn upload_markdown_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult {
    let mut form = read_multipart(&mut multipart, &[(FIELD_FILE, 1)]).await?;
    let file = form
        .take_file(FIELD_FILE)
        .ok_or_else(|| ApiError::bad_request("ファイルが送信されていません"))?;
    let title = form
        .text("title")
        .ok_or_else(|| ApiError::bad_request("titleが指定されていません"))?;
    let category = form
        .text("category")
        .ok_or_else(|| ApiError::bad_request("categoryが指定されていません"))?;

    let document = upload_markdown_document(state.store.as_ref(), &state.pool, &file, title, category)
        .await
        .map_err(|e| ApiError::from_service("アップロードに失敗しました", e))?;

    Ok(success("Markdownファイルを保存しました", document))
}

/// POST /upload/images/:slug : 記事の画像（とMarkdown）を配置する
pub async fn upload_article_images(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    mut multipart: Multipart,
) -> ApiResult {
    let slug = require_slug(&slug)?;
    let mut form = read_multipart(
        &mut multipart,
        &[
            (FIELD_MARKDOWN, 1),
            (FIELD_SECTION_IMAGES, MAX_SECTION_IMAGES),
            (FIELD_TITLE_IMAGE, 1),
        ],
    )
    .await?;

    let batch = AssetBatch {
        title_image: form.take_file(FIELD_TITLE_IMAGE),
        section_images: form.take_files(FIELD_SECTION_IMAGES),
        markdown: form.take_file(FIELD_MARKDOWN),
    };
    if !batch.has_images() {
        return Err(ApiError::bad_request("画像が送信されていません"));
    }

    let outcome = upload_article_assets(state.store.as_ref(), slug, &batch, state.upload_concurrency)
        .await
        .map_err(|e| ApiError::from_service("画像のアップロードに失敗しました", e))?;
    info!(slug = %outcome.slug, sections = outcome.secure_urls.len(), "画像アップロード完了");

    Ok(success_with_fields(
        "画像をアップロードしました",
        json!({
            "secure_urls": outcome.secure_urls,
            "image_title_url": outcome.image_title_url,
            "markdown_url": outcome.markdown_url,
            "slug": outcome.slug,
        }),
    ))
}

/// GET /check-or-generate-slug/:slug : スラッグの使用状況と空き候補を返す
pub async fn check_or_generate_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult {
    let slug = require_slug(&slug)?;
    let resolution = generate_unique_slug(state.store.as_ref(), slug, state.slug_max_attempts)
        .await
        .map_err(|e| ApiError::from_service("スラッグの確認に失敗しました", e))?;

    Ok(success_with_fields(
        "スラッグを確認しました",
        json!({
            "exists": resolution.exists,
            "uniqueSlug": resolution.unique_slug,
        }),
    ))
}

/// POST /save/:slug : Markdownを `<slug>.md` として保存し、記事メタデータを登録する
pub async fn save_markdown(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    mut multipart: Multipart,
) -> ApiResult {
    let slug = require_slug(&slug)?;
    let mut form = read_multipart(&mut multipart, &[(FIELD_MARKDOWN, 1)]).await?;
    let file = form
        .take_file(FIELD_MARKDOWN)
        .ok_or_else(|| ApiError::bad_request("Markdownファイルが送信されていません"))?;

    let mut metadata = NewArticle::default();
    for (name, value) in form.into_text_fields() {
        if !value.trim().is_empty() {
            metadata.set_field(&name, value);
        }
    }

    let markdown_url =
        save_markdown_article(state.store.as_ref(), &state.pool, slug, &file, metadata)
            .await
            .map_err(|e| ApiError::from_service("Markdownの保存に失敗しました", e))?;

    Ok(success_with_fields(
        "Markdownを保存しました",
        json!({ "markdownUrl": markdown_url }),
    ))
}

/// GET /articles : ストア上のMarkdown（raw）リソースを一覧する
pub async fn list_articles(State(state): State<AppState>) -> ApiResult {
    let resources = list_markdown_resources(state.store.as_ref())
        .await
        .map_err(|e| ApiError::from_service("記事一覧の取得に失敗しました", e))?;

    if resources.is_empty() {
        return Err(ApiError::not_found("記事が見つかりません"));
    }
    Ok(success("記事一覧を取得しました", resources))
}
