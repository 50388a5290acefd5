use super::model::{MarkdownDocument, NewMarkdownDocument};
use super::repository::insert_markdown_document;
use crate::domain::asset::{ArticleResource, IncomingFile};
use crate::infra::api::cloudinary::{AssetStore, ResourceType, UploadRequest};
use crate::types::{ServiceError, ServiceResult};
use sqlx::PgPool;
use tracing::info;

/// 一覧取得で返すリソースの最大件数
pub const ARTICLE_LISTING_LIMIT: u32 = 50;

/// Markdownファイルをrawとしてアップロードし、その記録を保存する
/// public_idはストア側の採番に任せる
pub async fn upload_markdown_document(
    store: &dyn AssetStore,
    pool: &PgPool,
    file: &IncomingFile,
    title: &str,
    category: &str,
) -> ServiceResult<MarkdownDocument> {
    let uploaded = store
        .upload(UploadRequest {
            resource_type: ResourceType::Raw,
            folder: None,
            public_id: None,
            file_name: file.file_name.clone(),
            bytes: file.bytes.clone(),
            transformation: None,
        })
        .await
        .map_err(|e| ServiceError::upload(file.file_name.clone(), e))?;

    let document = insert_markdown_document(
        &NewMarkdownDocument {
            title: title.to_string(),
            category: category.to_string(),
            url: uploaded.secure_url,
        },
        pool,
    )
    .await?;
    info!(id = document.id, "Markdownファイルを保存しました");

    Ok(document)
}

/// リモートストアにあるraw形式（Markdown）のリソースを一覧する
pub async fn list_markdown_resources(store: &dyn AssetStore) -> ServiceResult<Vec<ArticleResource>> {
    let resources = store
        .list_resources(ResourceType::Raw, ARTICLE_LISTING_LIMIT)
        .await
        .map_err(|source| ServiceError::Listing { source })?;

    Ok(resources
        .into_iter()
        .map(|resource| ArticleResource {
            public_id: resource.public_id,
            url: resource.secure_url,
            format: resource.format,
        })
        .collect())
}
