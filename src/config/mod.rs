// ==========================================
// 廢棄物清運聯單管理系統 - 配置層
// ==========================================
// 職責: 服務啟動配置（監聽位址、資料庫路徑、權限層級表）
// 來源: 環境變數覆寫 + 內建預設值
// ==========================================

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use crate::auth::RoleHierarchy;

/// HTTP 服務配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// 應用程式配置
///
/// 權限層級表在啟動時注入授權元件，不使用全域可變常數
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub db_path: String,
    pub roles: Vec<(String, i32)>,
}

impl AppConfig {
    /// 載入配置
    ///
    /// # 環境變數
    /// - WMS_HOST: 監聽位址（預設 127.0.0.1）
    /// - WMS_PORT: 監聽埠號（預設 8000）
    /// - WMS_DB_PATH: 資料庫檔案路徑（預設為使用者資料目錄下的 manifest.db）
    pub fn load() -> Self {
        let host = std::env::var("WMS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("WMS_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8000);
        let db_path = std::env::var("WMS_DB_PATH").unwrap_or_else(|_| default_db_path());

        Self {
            server: ServerConfig { host, port },
            db_path,
            roles: RoleHierarchy::default_table(),
        }
    }
}

/// 預設資料庫路徑（使用者資料目錄下的 waste-manifest-system/manifest.db）
pub fn default_db_path() -> String {
    let mut dir: PathBuf = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.push("waste-manifest-system");
    // 目錄不存在時先建立，失敗則退回當前目錄
    if std::fs::create_dir_all(&dir).is_err() {
        dir = PathBuf::from(".");
    }
    dir.push("manifest.db");
    dir.to_string_lossy().to_string()
}
