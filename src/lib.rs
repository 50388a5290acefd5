//! ブログ用のアセットAPIサーバー
//!
//! Markdownと画像をCloudinaryに配置し、記事のメタデータをPostgreSQLに保存する。

pub mod domain;
pub mod http;
pub mod infra;
pub mod types;
