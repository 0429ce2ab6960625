// ==========================================
// 廢棄物清運聯單管理系統 - 資料倉儲層
// ==========================================
// 職責: 提供資料存取介面，屏蔽資料庫細節
// 約束: 所有查詢使用參數化，防止 SQL 注入
// 紅線: Repository 不含業務邏輯
// ==========================================

pub mod error;
pub mod import_history_repo;
pub mod lookup;
pub mod manifest_repo;

// 重導出核心倉儲
pub use error::{RepositoryError, RepositoryResult};
pub use import_history_repo::{insert_import_history_tx, ImportHistoryRepository};
pub use lookup::{find_or_create, LookupEntity};
pub use manifest_repo::{
    ExportRow, ManifestDetail, ManifestPage, ManifestRepository, ManifestSummary,
};
