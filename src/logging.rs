use tracing_subscriber::EnvFilter;

/// tracing のサブスクライバを設定
///
/// RUST_LOG があればそちらを優先し、なければ `default_filter` を使う。
/// 2回目以降の呼び出しは何もしない。
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
