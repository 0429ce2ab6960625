// ==========================================
// 廢棄物清運聯單管理系統 - HTTP 路由與處理器
// ==========================================
// 職責: 路由組裝 + 各端點處理器
// 授權: 聯單相關端點要求 importer 以上；帳號刪除要求 moderator 以上
// ==========================================

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rusqlite::Connection;
use serde_json::json;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::api::dto::{
    AutocompleteQuery, DeleteAccountRequest, DeleteRequest, DeleteResponse, ImportPayload,
    ImportResponse, ListQuery, ResolveRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::export;
use crate::auth::{authorize, RoleHierarchy};
use crate::domain::types::{ConflictResolution, ManifestType};
use crate::importer::{
    decode_utf8, parse_csv_text, parse_upload, validate_upload, ConflictScanner, ManifestImporter,
};
use crate::repository::{ImportHistoryRepository, ManifestRepository};

/// 應用程式共享狀態
#[derive(Clone)]
pub struct AppState {
    pub conn: Arc<Mutex<Connection>>,
    pub hierarchy: Arc<RoleHierarchy>,
}

impl AppState {
    pub fn new(conn: Arc<Mutex<Connection>>, hierarchy: RoleHierarchy) -> Self {
        Self {
            conn,
            hierarchy: Arc::new(hierarchy),
        }
    }
}

/// 組裝路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/api/manifests", get(list_manifests))
        .route("/api/manifests/ids", get(all_manifest_ids))
        .route("/api/manifests/export", get(export_manifests))
        .route("/api/manifests/import", post(import_manifests))
        .route("/api/manifests/resolve_conflicts", post(resolve_conflicts))
        .route("/api/manifests/delete", post(delete_manifests))
        .route(
            "/api/manifests/:manifest_type/:manifest_id/:waste_id",
            get(manifest_detail),
        )
        .route("/api/import_history", get(import_history))
        .route("/api/autocomplete/company_name", get(autocomplete_company_name))
        .route("/api/autocomplete/waste_name", get(autocomplete_waste_name))
        .route("/api/autocomplete/waste_code", get(autocomplete_waste_code))
        .route("/api/accounts/:username", delete(delete_account))
        .with_state(state)
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// 聯單清單（篩選 + 分頁，每頁 20 筆）
async fn list_manifests(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<Response> {
    authorize(&state.hierarchy, &headers, "importer", None)?;

    let repo = ManifestRepository::new(state.conn.clone());
    let page = repo.list_manifests(&query.to_filter(), query.page())?;
    Ok(Json(page).into_response())
}

/// 全選支援: 所有符合條件的識別三元組（不分頁）
async fn all_manifest_ids(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<Response> {
    authorize(&state.hierarchy, &headers, "importer", None)?;

    let repo = ManifestRepository::new(state.conn.clone());
    let manifests = repo.all_manifest_ids(&query.to_filter())?;
    Ok(Json(json!({ "success": true, "manifests": manifests })).into_response())
}

/// 聯單明細
async fn manifest_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((manifest_type, manifest_id, waste_id)): Path<(String, String, String)>,
) -> ApiResult<Response> {
    authorize(&state.hierarchy, &headers, "importer", None)?;

    let manifest_type = ManifestType::from_str(&manifest_type)
        .map_err(ApiError::InvalidInput)?;
    let repo = ManifestRepository::new(state.conn.clone());
    let detail = repo
        .get_detail(manifest_type, &manifest_id, &waste_id)?
        .ok_or_else(|| {
            ApiError::NotFound(format!("聯單 {} (廢棄物ID {}) 不存在", manifest_id, waste_id))
        })?;
    Ok(Json(detail).into_response())
}

/// CSV/XLSX 匯入（multipart 上傳）
///
/// 欄位: csv_file（檔案）、import_type、conflict_resolution
/// conflict_resolution = ask 且偵測到鍵碰撞時回傳衝突清單與原始酬載，
/// 由呼叫端以 resolve_conflicts 二次提交
async fn import_manifests(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    authorize(&state.hierarchy, &headers, "importer", None)?;

    let mut filename = String::new();
    let mut data: Vec<u8> = Vec::new();
    let mut import_type: Option<ManifestType> = None;
    let mut resolution = ConflictResolution::Ask;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("multipart 解析失敗: {}", e)))?
    {
        match field.name() {
            Some("csv_file") => {
                filename = field.file_name().unwrap_or("upload.csv").to_string();
                data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidInput(format!("檔案讀取失敗: {}", e)))?
                    .to_vec();
            }
            Some("import_type") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
                import_type = Some(ManifestType::from_str(&text).map_err(ApiError::InvalidInput)?);
            }
            Some("conflict_resolution") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
                resolution =
                    ConflictResolution::from_str(&text).map_err(ApiError::InvalidInput)?;
            }
            _ => {}
        }
    }

    let import_type =
        import_type.ok_or_else(|| ApiError::InvalidInput("缺少匯入類型".to_string()))?;

    // 上傳驗證: 副檔名 / 大小 / 非空（失敗不改變任何狀態）
    validate_upload(&filename, &data)?;
    let sheet = parse_upload(&filename, &data)?;

    // SCANNING: ask 模式先做只讀預掃描
    if resolution == ConflictResolution::Ask {
        let scanner = ConflictScanner::new(state.conn.clone());
        let conflicts = scanner.scan(&sheet.rows)?;
        if !conflicts.is_empty() {
            info!(file = %filename, conflicts = conflicts.len(), "匯入偵測到鍵碰撞，等待衝突解決");
            // CSV 原文直接回傳；Excel 重新編碼為 CSV 供二次提交
            let csv_data = if filename.to_lowercase().ends_with(".csv") {
                decode_utf8(&data)?
            } else {
                sheet.to_csv_string()?
            };
            return Ok(Json(ImportResponse::Conflicts {
                success: false,
                conflict: true,
                conflicting_records: conflicts,
                import_data: ImportPayload {
                    csv_data,
                    import_type,
                    filename,
                },
            })
            .into_response());
        }
    }

    let importer = ManifestImporter::new(state.conn.clone());
    let outcome = importer.commit(&sheet.rows, import_type, resolution, &filename)?;
    Ok(Json(ImportResponse::Committed(outcome)).into_response())
}

/// 衝突解決（RESOLVING 階段的二次提交）
async fn resolve_conflicts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ResolveRequest>,
) -> ApiResult<Response> {
    authorize(&state.hierarchy, &headers, "importer", None)?;

    if request.apply_to_all {
        debug!("apply_to_all 旗標透傳，逐列處理行為不變");
    }

    let sheet = parse_csv_text(&request.csv_data)?;
    let importer = ManifestImporter::new(state.conn.clone());
    let outcome = importer.commit(
        &sheet.rows,
        request.import_type,
        request.conflict_resolution,
        &request.filename,
    )?;
    Ok(Json(ImportResponse::Committed(outcome)).into_response())
}

/// 批量軟刪除（標記不可見；已不可見的鍵不影響任何列）
async fn delete_manifests(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<Response> {
    authorize(&state.hierarchy, &headers, "importer", None)?;

    if request.manifests.is_empty() {
        return Err(ApiError::InvalidInput("未提供要移除的聯單".to_string()));
    }

    let repo = ManifestRepository::new(state.conn.clone());
    let deleted_count = repo.soft_delete_many(&request.manifests)?;
    info!(deleted = deleted_count, "聯單批量標記不可見");

    Ok(Json(DeleteResponse {
        success: true,
        deleted_count,
        message: format!("成功移除 {} 筆聯單", deleted_count),
    })
    .into_response())
}

/// CSV 匯出（與清單同一篩選形狀，不分頁）
async fn export_manifests(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<Response> {
    authorize(&state.hierarchy, &headers, "importer", None)?;

    let repo = ManifestRepository::new(state.conn.clone());
    let rows = repo.export_rows(&query.to_filter())?;
    let csv_text = export::write_csv(&rows)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"manifests.csv\"",
            ),
        ],
        csv_text,
    )
        .into_response())
}

/// 最近匯入歷史
async fn import_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    authorize(&state.hierarchy, &headers, "importer", None)?;

    let repo = ImportHistoryRepository::new(state.conn.clone());
    let recent = repo.recent(5)?;
    Ok(Json(json!({ "success": true, "recent_imports": recent })).into_response())
}

/// 自動完成: 事業機構名稱
async fn autocomplete_company_name(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> ApiResult<Response> {
    let repo = ManifestRepository::new(state.conn.clone());
    let names = repo.autocomplete_company_names(&query.q)?;
    let results: Vec<_> = names.into_iter().map(|name| json!({ "name": name })).collect();
    Ok(Json(json!({ "results": results })).into_response())
}

/// 自動完成: 廢棄物/物質名稱
async fn autocomplete_waste_name(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> ApiResult<Response> {
    let repo = ManifestRepository::new(state.conn.clone());
    let names = repo.autocomplete_substance_names(&query.q)?;
    let results: Vec<_> = names.into_iter().map(|name| json!({ "name": name })).collect();
    Ok(Json(json!({ "results": results })).into_response())
}

/// 自動完成: 廢棄物/物質代碼
async fn autocomplete_waste_code(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> ApiResult<Response> {
    let repo = ManifestRepository::new(state.conn.clone());
    let codes = repo.autocomplete_substance_codes(&query.q)?;
    let results: Vec<_> = codes.into_iter().map(|code| json!({ "code": code })).collect();
    Ok(Json(json!({ "results": results })).into_response())
}

/// 帳號刪除授權判定
///
/// 帳號儲存與實際移除由前置認證層負責；本端點依層級規則裁決：
/// 操作者最高層級須嚴格大於目標（目標身分組由請求主體提供），且不得刪除自己
async fn delete_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
    payload: Option<Json<DeleteAccountRequest>>,
) -> ApiResult<Response> {
    let principal = authorize(&state.hierarchy, &headers, "moderator", None)?;

    let target_roles = payload.map(|Json(p)| p.roles).unwrap_or_default();

    if principal.username == username {
        return Ok((
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "error": "不能刪除自己的帳號" })),
        )
            .into_response());
    }

    if !state
        .hierarchy
        .can_delete_account(&principal.roles, &target_roles, false)
    {
        return Ok((
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "error": "權限不足，無法刪除此帳號" })),
        )
            .into_response());
    }

    info!(actor = %principal.username, target = %username, "帳號刪除授權通過");
    Ok(Json(json!({ "success": true })).into_response())
}
