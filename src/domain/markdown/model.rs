use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// アップロード済みMarkdownファイルの記録（markdownsテーブルと一致）
// blogsテーブルとは紐づかない独立した記録
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownDocument {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMarkdownDocument {
    pub title: String,
    pub category: String,
    pub url: String,
}
