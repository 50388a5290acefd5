use super::model::NewArticle;
use super::repository::insert_article;
use crate::domain::asset::IncomingFile;
use crate::infra::api::cloudinary::{AssetStore, ResourceType, UploadRequest};
use crate::types::{ServiceError, ServiceResult};
use sqlx::PgPool;
use tracing::info;

/// Markdownファイルを `<slug>.md` としてアップロードし、記事メタデータを保存する
///
/// ## 引数
/// - `metadata`: multipartのテキスト欄から集めたメタデータ（slugとmarkdownUrlは上書きする）
///
/// ## 戻り値
/// アップロードしたMarkdownのURL
///
/// ## エラー
/// アップロード後にDB保存が失敗しても、アップロード済みのファイルは削除しない。
pub async fn save_markdown_article(
    store: &dyn AssetStore,
    pool: &PgPool,
    slug: &str,
    file: &IncomingFile,
    metadata: NewArticle,
) -> ServiceResult<String> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(ServiceError::invalid_input("スラッグが空です"));
    }

    let public_id = format!("{}.md", slug);
    let uploaded = store
        .upload(UploadRequest {
            resource_type: ResourceType::Raw,
            folder: None,
            public_id: Some(public_id.clone()),
            file_name: file.file_name.clone(),
            bytes: file.bytes.clone(),
            transformation: None,
        })
        .await
        .map_err(|e| ServiceError::upload(public_id, e))?;

    let article = NewArticle {
        slug: Some(slug.to_string()),
        markdown_url: Some(uploaded.secure_url.clone()),
        ..metadata
    };
    let saved = insert_article(&article, pool).await?;
    info!(id = saved.id, %slug, "記事メタデータを保存しました");

    Ok(uploaded.secure_url)
}
