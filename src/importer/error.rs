// ==========================================
// 廢棄物清運聯單管理系統 - 匯入模組錯誤類型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 匯入模組錯誤類型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 上傳驗證錯誤（不改變任何狀態）=====
    #[error("檔案格式不支援: {0}（僅支援 .csv/.xlsx）")]
    UnsupportedFormat(String),

    #[error("檔案大小不得超過 {limit_mb}MB（實際 {actual} bytes）")]
    FileTooLarge { limit_mb: usize, actual: usize },

    #[error("檔案內容為空")]
    EmptyFile,

    // ===== 檔案解析錯誤 =====
    #[error("檔案編碼錯誤: 內容不是有效的 UTF-8")]
    InvalidEncoding,

    #[error("CSV 解析失敗: {0}")]
    CsvParseError(String),

    #[error("Excel 解析失敗: {0}")]
    ExcelParseError(String),

    // ===== 資料庫錯誤 =====
    #[error("資料庫查詢失敗: {0}")]
    DatabaseQueryError(String),

    #[error("資料庫事務失敗: {0}")]
    DatabaseTransactionError(String),

    #[error("資料庫鎖取得失敗: {0}")]
    LockError(String),

    // ===== 通用錯誤 =====
    #[error("內部錯誤: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 實現 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseQueryError(err.to_string())
    }
}

// 實現 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 實現 From<RepositoryError>
impl From<crate::repository::RepositoryError> for ImportError {
    fn from(err: crate::repository::RepositoryError) -> Self {
        ImportError::DatabaseQueryError(err.to_string())
    }
}

/// Result 類型別名
pub type ImportResult<T> = Result<T, ImportError>;
