// ==========================================
// 廢棄物清運聯單管理系統 - API 層
// ==========================================
// 職責: HTTP 介面（路由、請求/回應結構、錯誤轉換、CSV 匯出）
// ==========================================

pub mod dto;
pub mod error;
pub mod export;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::{router, AppState};
