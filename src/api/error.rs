// ==========================================
// 廢棄物清運聯單管理系統 - API 層錯誤類型
// ==========================================
// 職責: 匯入/倉儲層錯誤 → 使用者可讀的 HTTP 回應
// 約束: 驗證類錯誤回 400、未找到回 404、其餘回 500；
//       授權重導向不屬於錯誤，但為了 `?` 傳遞在此包裝
// ==========================================

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthRedirect;
use crate::importer::ImportError;
use crate::repository::RepositoryError;

/// API 層錯誤類型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("資料驗證失敗: {0}")]
    ValidationError(String),

    #[error("無效輸入: {0}")]
    InvalidInput(String),

    #[error("資源未找到: {0}")]
    NotFound(String),

    #[error("檔案匯入失敗: {0}")]
    ImportFailed(String),

    #[error("資料庫錯誤: {0}")]
    DatabaseError(String),

    #[error("未授權: {}", .0.message)]
    Unauthorized(AuthRedirect),

    #[error("內部錯誤: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<AuthRedirect> for ApiError {
    fn from(redirect: AuthRedirect) -> Self {
        ApiError::Unauthorized(redirect)
    }
}

// 匯入層錯誤轉換: 上傳內容問題歸為驗證錯誤
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::UnsupportedFormat(_)
            | ImportError::FileTooLarge { .. }
            | ImportError::EmptyFile
            | ImportError::InvalidEncoding
            | ImportError::CsvParseError(_)
            | ImportError::ExcelParseError(_) => ApiError::ValidationError(err.to_string()),
            ImportError::DatabaseQueryError(msg)
            | ImportError::DatabaseTransactionError(msg)
            | ImportError::LockError(msg) => ApiError::DatabaseError(msg),
            other => ApiError::ImportFailed(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("欄位{}錯誤: {}", field, message))
            }
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // 授權失敗: 維持重導向語意
        if let ApiError::Unauthorized(redirect) = &self {
            return redirect.clone().into_response();
        }

        let status = match &self {
            ApiError::ValidationError(_) | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Result 類型別名
pub type ApiResult<T> = Result<T, ApiError>;
