use std::env;
use std::fmt;
use thiserror::Error;

/// 設定関連のエラー型
/// 環境変数、設定値の検証など設定に関するエラーを定義
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 環境変数が見つからない
    #[error("環境変数が見つかりません: {name}")]
    MissingEnvironmentVariable { name: String },

    /// 設定値が不正
    #[error("設定値が不正です: {reason}")]
    InvalidValue { reason: String },
}

impl ConfigError {
    /// 環境変数不足エラーを作成
    pub fn missing_env_var<N: Into<String>>(name: N) -> Self {
        Self::MissingEnvironmentVariable { name: name.into() }
    }

    /// 不正な設定値エラーを作成
    pub fn invalid_value<R: Into<String>>(reason: R) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }
}

/// 設定エラーのResult型エイリアス
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8000";
pub const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";
pub const DEFAULT_CLOUDINARY_DELIVERY_BASE: &str = "https://res.cloudinary.com";
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;
pub const DEFAULT_SLUG_MAX_ATTEMPTS: u32 = 1000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Upload APIの署名に使うハッシュ関数
///
/// Cloudinaryアカウントの既定はSHA-1。アカウント側で切り替えた場合のみSHA-256を使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl std::str::FromStr for SignatureAlgorithm {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(ConfigError::invalid_value(format!(
                "CLOUDINARY_SIGNATURE_ALGORITHM は sha1 か sha256 です: {}",
                other
            ))),
        }
    }
}

/// Cloudinaryの接続情報
///
/// プロセス起動時に一度だけ構築し、クライアント生成時に明示的に渡す。
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Upload/Admin APIのベースURL
    pub api_base: String,
    /// 配信URL（res.cloudinary.com）のベース
    pub delivery_base: String,
    pub signature_algorithm: SignatureAlgorithm,
}

// api_secretをログに出さないため手動実装
impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .field("api_base", &self.api_base)
            .field("delivery_base", &self.delivery_base)
            .field("signature_algorithm", &self.signature_algorithm)
            .finish()
    }
}

impl CloudinaryConfig {
    /// テストやローカル検証用に任意のエンドポイントで設定を作成
    pub fn with_endpoints(
        cloud_name: &str,
        api_key: &str,
        api_secret: &str,
        api_base: &str,
        delivery_base: &str,
    ) -> Self {
        Self {
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            delivery_base: delivery_base.trim_end_matches('/').to_string(),
            signature_algorithm: SignatureAlgorithm::default(),
        }
    }

    pub fn with_signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }
}

/// アプリケーション全体の設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub cloudinary: CloudinaryConfig,
    pub port: u16,
    pub cors_origin: String,
    /// セクション画像を同時にアップロードする最大数
    pub upload_concurrency: usize,
    /// スラッグ候補を試行する上限回数
    pub slug_max_attempts: u32,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    /// .envファイルの読み込みは呼び出し側で行う
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意のキー検索関数から設定を構築する
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> ConfigResult<String> {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::missing_env_var(name))
        };
        let optional = |name: &str, default: &str| -> String {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let cloudinary = CloudinaryConfig::with_endpoints(
            &required("CLOUDINARY_CLOUD_NAME")?,
            &required("CLOUDINARY_API_KEY")?,
            &required("CLOUDINARY_API_SECRET")?,
            &optional("CLOUDINARY_API_BASE", DEFAULT_CLOUDINARY_API_BASE),
            &optional("CLOUDINARY_DELIVERY_BASE", DEFAULT_CLOUDINARY_DELIVERY_BASE),
        )
        .with_signature_algorithm(parse_or_default(
            &lookup,
            "CLOUDINARY_SIGNATURE_ALGORITHM",
            SignatureAlgorithm::default(),
        )?);

        let port = parse_or_default(&lookup, "PORT", DEFAULT_PORT)?;
        let upload_concurrency =
            parse_or_default(&lookup, "UPLOAD_CONCURRENCY", DEFAULT_UPLOAD_CONCURRENCY)?;
        if upload_concurrency == 0 {
            return Err(ConfigError::invalid_value(
                "UPLOAD_CONCURRENCY は1以上である必要があります",
            ));
        }
        let slug_max_attempts =
            parse_or_default(&lookup, "SLUG_MAX_ATTEMPTS", DEFAULT_SLUG_MAX_ATTEMPTS)?;
        if slug_max_attempts == 0 {
            return Err(ConfigError::invalid_value(
                "SLUG_MAX_ATTEMPTS は1以上である必要があります",
            ));
        }
        let max_upload_bytes =
            parse_or_default(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            cloudinary,
            port,
            cors_origin: optional("CORS_ORIGIN", DEFAULT_CORS_ORIGIN),
            upload_concurrency,
            slug_max_attempts,
            max_upload_bytes,
        })
    }
}

fn parse_or_default<F, T>(lookup: &F, name: &str, default: T) -> ConfigResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name).filter(|value| !value.trim().is_empty()) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            ConfigError::invalid_value(format!("{} の値を解釈できません: {}", name, raw))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn required_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgres://localhost/blog"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
        ]
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_from(&required_pairs())).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.cors_origin, DEFAULT_CORS_ORIGIN);
        assert_eq!(config.upload_concurrency, DEFAULT_UPLOAD_CONCURRENCY);
        assert_eq!(config.slug_max_attempts, DEFAULT_SLUG_MAX_ATTEMPTS);
        assert_eq!(config.cloudinary.api_base, DEFAULT_CLOUDINARY_API_BASE);
        assert_eq!(config.cloudinary.cloud_name, "demo");
    }

    #[test]
    fn test_missing_required_variable() {
        let pairs: Vec<_> = required_pairs()
            .into_iter()
            .filter(|(k, _)| *k != "CLOUDINARY_API_SECRET")
            .collect();
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::MissingEnvironmentVariable { ref name } if name == "CLOUDINARY_API_SECRET"
        ));
    }

    #[test]
    fn test_invalid_port_and_zero_concurrency() {
        let mut pairs = required_pairs();
        pairs.push(("PORT", "abc"));
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        let mut pairs = required_pairs();
        pairs.push(("UPLOAD_CONCURRENCY", "0"));
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_signature_algorithm_defaults_to_sha1() {
        let config = AppConfig::from_lookup(lookup_from(&required_pairs())).unwrap();
        assert_eq!(config.cloudinary.signature_algorithm, SignatureAlgorithm::Sha1);

        let mut pairs = required_pairs();
        pairs.push(("CLOUDINARY_SIGNATURE_ALGORITHM", "SHA256"));
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.cloudinary.signature_algorithm, SignatureAlgorithm::Sha256);

        let mut pairs = required_pairs();
        pairs.push(("CLOUDINARY_SIGNATURE_ALGORITHM", "md5"));
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("CLOUDINARY_SIGNATURE_ALGORITHM"));
    }

    #[test]
    fn test_secret_is_not_printed() {
        let config = AppConfig::from_lookup(lookup_from(&required_pairs())).unwrap();
        let printed = format!("{:?}", config);

        assert!(!printed.contains("secret\""));
        assert!(printed.contains("***"));
    }
}
