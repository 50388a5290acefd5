use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ブログ記事のメタデータ（blogsテーブルと一致）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: DateTime<Utc>,
    pub category: Option<String>,
    pub resume: Option<String>,
    pub slug: Option<String>,
    pub image: Option<String>,
    pub card_image: Option<String>,
    pub markdown_url: Option<String>,
}

// 保存前の記事メタデータ。全フィールド任意（dateは未指定なら保存時刻）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub resume: Option<String>,
    pub slug: Option<String>,
    pub image: Option<String>,
    pub card_image: Option<String>,
    pub markdown_url: Option<String>,
}

impl NewArticle {
    /// multipartのテキスト欄名から値を設定する。未知の欄名はfalseを返す
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "title" => &mut self.title,
            "author" => &mut self.author,
            "category" => &mut self.category,
            "resume" => &mut self.resume,
            "image" => &mut self.image,
            "cardImage" => &mut self.card_image,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}
