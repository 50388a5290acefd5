use super::model::{MarkdownDocument, NewMarkdownDocument};
use crate::types::{ServiceError, ServiceResult};
use sqlx::PgPool;

/// Markdownファイルの記録を保存する
pub async fn insert_markdown_document(
    document: &NewMarkdownDocument,
    pool: &PgPool,
) -> ServiceResult<MarkdownDocument> {
    sqlx::query_as::<_, MarkdownDocument>(
        r#"
        INSERT INTO markdowns (title, category, url)
        VALUES ($1, $2, $3)
        RETURNING id, title, category, url, created_at
        "#,
    )
    .bind(&document.title)
    .bind(&document.category)
    .bind(&document.url)
    .fetch_one(pool)
    .await
    .map_err(|e| ServiceError::repository("Markdown記録の保存", e))
}

/// Markdownファイルの記録を新しい順に取得する
pub async fn list_markdown_documents(pool: &PgPool) -> ServiceResult<Vec<MarkdownDocument>> {
    sqlx::query_as::<_, MarkdownDocument>(
        "SELECT id, title, category, url, created_at FROM markdowns ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| ServiceError::repository("Markdown記録一覧の取得", e))
}
