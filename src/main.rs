// ==========================================
// 廢棄物清運聯單管理系統 - 服務主入口
// ==========================================
// 技術棧: axum + rusqlite
// ==========================================

use std::sync::{Arc, Mutex};

use waste_manifest_system::api::{router, AppState};
use waste_manifest_system::auth::RoleHierarchy;
use waste_manifest_system::config::AppConfig;
use waste_manifest_system::{db, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日誌系統
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", waste_manifest_system::APP_NAME);
    tracing::info!("系統版本: {}", waste_manifest_system::VERSION);
    tracing::info!("==================================================");

    // 載入配置
    let config = AppConfig::load();
    tracing::info!(db_path = %config.db_path, "使用資料庫");

    // 開啟資料庫並建立結構
    let conn = db::open_sqlite_connection(&config.db_path)?;
    db::init_schema(&conn)?;

    // 權限層級表於啟動時注入授權元件
    let hierarchy = RoleHierarchy::new(config.roles.clone());
    let state = AppState::new(Arc::new(Mutex::new(conn)), hierarchy);

    let app = router(state);
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "聯單管理服務啟動");

    axum::serve(listener, app).await?;
    Ok(())
}
