//! 型定義モジュール
//!
//! アプリケーション全体で使用される共通的な型定義を管理します。
//! - 設定: 環境変数から読み込むアプリケーション設定
//! - エラー: インフラ層、リモートストア、ドメインサービスのエラー

pub mod config;
pub mod error;
pub mod infra;

// 便利な再エクスポート
pub use config::{AppConfig, CloudinaryConfig, ConfigError, ConfigResult, SignatureAlgorithm};
pub use error::{ServiceError, ServiceResult};
pub use infra::{InfraError, InfraResult, StoreError, StoreResult};
