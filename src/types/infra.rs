use crate::types::ConfigError;
use thiserror::Error;

/// インフラストラクチャ層のエラー型
/// データベース接続、マイグレーションなど基盤的なエラーを定義
#[derive(Error, Debug)]
pub enum InfraError {
    /// データベース接続エラー
    #[error("データベース接続エラー: {source}")]
    DatabaseConnection {
        #[source]
        source: sqlx::Error,
    },

    /// データベースクエリエラー
    #[error("データベースクエリエラー: {operation} - {source}")]
    DatabaseQuery {
        operation: String,
        #[source]
        source: sqlx::Error,
    },

    /// マイグレーションエラー
    #[error("データベースマイグレーションエラー: {source}")]
    Migration {
        #[source]
        source: sqlx::migrate::MigrateError,
    },

    /// 設定エラー
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl InfraError {
    /// データベース接続エラーを作成
    pub fn database_connection(source: sqlx::Error) -> Self {
        Self::DatabaseConnection { source }
    }

    /// データベースクエリエラーを作成
    pub fn database_query<O: Into<String>>(operation: O, source: sqlx::Error) -> Self {
        Self::DatabaseQuery {
            operation: operation.into(),
            source,
        }
    }

    /// マイグレーションエラーを作成
    pub fn migration(source: sqlx::migrate::MigrateError) -> Self {
        Self::Migration { source }
    }
}

/// インフラエラーのResult型エイリアス
pub type InfraResult<T> = std::result::Result<T, InfraError>;

/// リモートアセットストア（Cloudinary）とのやり取りで発生するエラー
#[derive(Error, Debug)]
pub enum StoreError {
    /// 通信そのものの失敗（接続不可、タイムアウトなど）
    #[error("{operation} の通信に失敗しました: {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    /// ストアがリクエストを拒否した
    #[error("{operation} がステータス{status}で拒否されました: {message}")]
    Rejected {
        operation: String,
        status: u16,
        message: String,
    },

    /// レスポンスの解釈に失敗
    #[error("{operation} のレスポンス解析に失敗しました: {source}")]
    Decode {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
}

impl StoreError {
    pub fn transport<O: Into<String>>(operation: O, source: reqwest::Error) -> Self {
        Self::Transport {
            operation: operation.into(),
            source,
        }
    }

    pub fn rejected<O: Into<String>, M: Into<String>>(operation: O, status: u16, message: M) -> Self {
        Self::Rejected {
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    pub fn decode<O: Into<String>>(operation: O, source: reqwest::Error) -> Self {
        Self::Decode {
            operation: operation.into(),
            source,
        }
    }

    /// ストア側が返したメッセージ（あれば）を取り出す
    pub fn store_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// ストアエラーのResult型エイリアス
pub type StoreResult<T> = std::result::Result<T, StoreError>;
