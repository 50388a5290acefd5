use super::model::{Article, NewArticle};
use crate::types::{ServiceError, ServiceResult};
use sqlx::PgPool;

/// 記事メタデータを保存する。
/// slugはUNIQUE制約があるため、重複した場合はエラーになる。
pub async fn insert_article(article: &NewArticle, pool: &PgPool) -> ServiceResult<Article> {
    sqlx::query_as::<_, Article>(
        r#"
        INSERT INTO blogs (title, author, date, category, resume, slug, image, card_image, markdown_url)
        VALUES ($1, $2, COALESCE($3, CURRENT_TIMESTAMP), $4, $5, $6, $7, $8, $9)
        RETURNING id, title, author, date, category, resume, slug, image, card_image, markdown_url
        "#,
    )
    .bind(&article.title)
    .bind(&article.author)
    .bind(article.date)
    .bind(&article.category)
    .bind(&article.resume)
    .bind(&article.slug)
    .bind(&article.image)
    .bind(&article.card_image)
    .bind(&article.markdown_url)
    .fetch_one(pool)
    .await
    .map_err(|e| ServiceError::repository("記事メタデータの保存", e))
}

/// slugで記事メタデータを1件取得する
pub async fn find_article_by_slug(slug: &str, pool: &PgPool) -> ServiceResult<Option<Article>> {
    sqlx::query_as::<_, Article>(
        r#"
        SELECT id, title, author, date, category, resume, slug, image, card_image, markdown_url
        FROM blogs
        WHERE slug = $1
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
    .map_err(|e| ServiceError::repository("記事メタデータの取得", e))
}
