use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// tracingの購読者を初期化する
///
/// `RUST_LOG` でフィルタを指定できる（未指定時は `info`）。
/// `LOG_JSON=1` の場合はJSON形式で出力する。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = matches!(
        std::env::var("LOG_JSON").as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE")
    );

    let registry = tracing_subscriber::registry().with(filter);
    // 二重初期化（テストなど）はエラーになるだけなので無視する
    if json {
        let _ = registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init();
    } else {
        let _ = registry.with(tracing_subscriber::fmt::layer()).try_init();
    }
}
