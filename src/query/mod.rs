// ==========================================
// 廢棄物清運聯單管理系統 - 查詢層
// ==========================================
// 職責: 篩選條件組裝（SQL 生成），供倉儲層與匯出共用
// ==========================================

pub mod filter;

pub use filter::{ManifestFilter, PAGE_SIZE};
