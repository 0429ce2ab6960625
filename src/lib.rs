// ==========================================
// 廢棄物清運聯單管理系統 - 核心庫
// ==========================================
// 技術棧: axum + rusqlite
// 系統定位: 聯單（清除/再利用）追蹤、CSV 匯入匯出與查詢
// ==========================================

// ==========================================
// 模組聲明
// ==========================================

// 領域層 - 實體與類型
pub mod domain;

// 資料倉儲層 - 資料存取
pub mod repository;

// 匯入層 - 外部資料
pub mod importer;

// 查詢層 - 篩選條件組裝
pub mod query;

// 授權層 - 身分組層級
pub mod auth;

// 配置層 - 服務配置
pub mod config;

// 資料庫基礎設施（連線初始化/PRAGMA 統一/內嵌結構）
pub mod db;

// 日誌系統
pub mod logging;

// API 層 - HTTP 介面
pub mod api;

// ==========================================
// 重導出核心類型
// ==========================================

// 領域類型
pub use domain::types::{ConflictResolution, FilterLogic, ManifestType, SubstanceType};

// 領域實體
pub use domain::{
    Company, ImportHistory, Manifest, ManifestKey, RawManifestRecord, WasteSubstance,
};

// 授權
pub use auth::RoleHierarchy;

// 匯入
pub use importer::{ImportOutcome, ManifestImporter};

// API
pub use api::{router, AppState};

// ==========================================
// 常量定義
// ==========================================

// 系統版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系統名稱
pub const APP_NAME: &str = "廢棄物清運聯單管理系統";
