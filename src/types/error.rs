use crate::types::StoreError;
use thiserror::Error;

/// ドメインサービス（スラッグ生成、アセットアップロード、保存処理）のエラー型
#[derive(Error, Debug)]
pub enum ServiceError {
    /// 呼び出し側の入力が不正
    #[error("入力が不正です: {reason}")]
    InvalidInput { reason: String },

    /// 既存リソースの確認に失敗
    #[error("リソースの存在確認に失敗しました: {path} - {source}")]
    ExistenceCheck {
        path: String,
        #[source]
        source: StoreError,
    },

    /// アップロードに失敗
    #[error("アップロードに失敗しました: {public_id} - {source}")]
    Upload {
        public_id: String,
        #[source]
        source: StoreError,
    },

    /// 一覧取得に失敗
    #[error("リソース一覧の取得に失敗しました: {source}")]
    Listing {
        #[source]
        source: StoreError,
    },

    /// 空きスラッグが上限回数内に見つからない
    #[error("スラッグ '{base}' の空き候補が{attempts}回の試行で見つかりませんでした")]
    SlugExhausted { base: String, attempts: u32 },

    /// データベース操作の失敗
    #[error("データベースエラー: {operation} - {source}")]
    Repository {
        operation: String,
        #[source]
        source: sqlx::Error,
    },
}

impl ServiceError {
    /// 入力不正エラーを作成
    pub fn invalid_input<R: Into<String>>(reason: R) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// 存在確認エラーを作成
    pub fn existence_check<P: Into<String>>(path: P, source: StoreError) -> Self {
        Self::ExistenceCheck {
            path: path.into(),
            source,
        }
    }

    /// アップロードエラーを作成
    pub fn upload<P: Into<String>>(public_id: P, source: StoreError) -> Self {
        Self::Upload {
            public_id: public_id.into(),
            source,
        }
    }

    /// データベースエラーを作成
    pub fn repository<O: Into<String>>(operation: O, source: sqlx::Error) -> Self {
        Self::Repository {
            operation: operation.into(),
            source,
        }
    }

    /// レスポンスの`error`欄に載せる下位エラーの文言
    pub fn detail(&self) -> String {
        match self {
            Self::ExistenceCheck { source, .. }
            | Self::Upload { source, .. }
            | Self::Listing { source } => source.store_message(),
            Self::Repository { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }
}

/// サービスエラーのResult型エイリアス
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
