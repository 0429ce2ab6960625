// ==========================================
// 日誌系統初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支援環境變數配置日誌級別
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日誌系統
///
/// # 環境變數
/// - RUST_LOG: 日誌級別過濾器（預設: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=waste_manifest_system=trace
pub fn init() {
    // 從環境變數讀取日誌級別，預設為 info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // 配置日誌格式
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 初始化測試環境的日誌系統
///
/// 使用更詳細的日誌級別，便於除錯
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
