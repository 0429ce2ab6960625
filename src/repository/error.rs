// ==========================================
// 廢棄物清運聯單管理系統 - 倉儲層錯誤類型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 倉儲層錯誤類型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 資料庫錯誤 =====
    #[error("記錄未找到: {entity} (id={id})")]
    NotFound { entity: String, id: String },

    #[error("資料庫連線失敗: {0}")]
    DatabaseConnectionError(String),

    #[error("資料庫鎖取得失敗: {0}")]
    LockError(String),

    #[error("資料庫事務失敗: {0}")]
    DatabaseTransactionError(String),

    #[error("資料庫查詢失敗: {0}")]
    DatabaseQueryError(String),

    #[error("唯一約束違反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外鍵約束違反: {0}")]
    ForeignKeyViolation(String),

    // ===== 資料品質錯誤 =====
    #[error("資料驗證失敗: {0}")]
    ValidationError(String),

    #[error("欄位值錯誤 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== 通用錯誤 =====
    #[error("內部錯誤: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 實現 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

/// Result 類型別名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
