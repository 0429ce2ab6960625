// ==========================================
// 廢棄物清運聯單管理系統 - API 請求/回應結構
// ==========================================
// 職責: HTTP 介面的序列化邊界；查詢字串採寬鬆解析
//       （無效的篩選值視為未提供，不使整個請求失敗）
// ==========================================

use crate::domain::manifest::ManifestKey;
use crate::domain::types::{
    ConfirmationStatus, ConflictResolution, FilterLogic, ManifestType,
};
use crate::importer::conflict_scanner::ConflictRecord;
use crate::importer::manifest_importer::ImportOutcome;
use crate::importer::DataCleaner;
use crate::query::filter::ManifestFilter;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 清單/匯出/全選共用的查詢字串
///
/// 欄位全部以字串接收後轉型，空字串與無效值一律視為未提供
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub manifest_type: Option<String>,
    pub manifest_id: Option<String>,
    pub company_name: Option<String>,
    pub waste_code: Option<String>,
    pub waste_name: Option<String>,
    pub report_date_from: Option<String>,
    pub report_date_to: Option<String>,
    pub reported_weight_above: Option<String>,
    pub reported_weight_below: Option<String>,
    pub confirmation_status: Option<String>,
    pub filter_logic: Option<String>,
    pub page: Option<u32>,
}

impl ListQuery {
    pub fn to_filter(&self) -> ManifestFilter {
        let cleaner = DataCleaner;
        ManifestFilter {
            manifest_type: parse_opt::<ManifestType>(&self.manifest_type),
            manifest_id: non_empty(&self.manifest_id),
            company_name: non_empty(&self.company_name),
            waste_code: non_empty(&self.waste_code),
            waste_name: non_empty(&self.waste_name),
            report_date_from: self
                .report_date_from
                .as_deref()
                .and_then(|v| cleaner.parse_date(v)),
            report_date_to: self
                .report_date_to
                .as_deref()
                .and_then(|v| cleaner.parse_date(v)),
            reported_weight_above: parse_weight_opt(&self.reported_weight_above),
            reported_weight_below: parse_weight_opt(&self.reported_weight_below),
            confirmation_status: match self.confirmation_status.as_deref() {
                Some("confirmed") => Some(ConfirmationStatus::Confirmed),
                Some("unconfirmed") => Some(ConfirmationStatus::Unconfirmed),
                _ => None,
            },
            filter_logic: match self.filter_logic.as_deref() {
                Some("or") => FilterLogic::Or,
                _ => FilterLogic::And,
            },
        }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_opt<T: FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref().and_then(|v| v.parse::<T>().ok())
}

fn parse_weight_opt(value: &Option<String>) -> Option<f64> {
    value.as_deref().map(str::trim).and_then(|v| v.parse::<f64>().ok())
}

/// 衝突解決流程回傳給呼叫端的酬載（二次提交時原樣帶回）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPayload {
    pub csv_data: String,
    pub import_type: ManifestType,
    pub filename: String,
}

/// 匯入端點回應: 直接提交結果，或衝突清單 + 酬載
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ImportResponse {
    Conflicts {
        success: bool,
        conflict: bool,
        conflicting_records: Vec<ConflictRecord>,
        import_data: ImportPayload,
    },
    Committed(ImportOutcome),
}

/// 衝突解決請求（RESOLVING 階段）
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveRequest {
    pub csv_data: String,
    pub import_type: ManifestType,
    pub filename: String,
    pub conflict_resolution: ConflictResolution,
    /// 透傳旗標: 對逐列處理無可觀察差異
    #[serde(default)]
    pub apply_to_all: bool,
}

/// 批量軟刪除請求
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRequest {
    pub manifests: Vec<ManifestKey>,
}

/// 批量軟刪除回應
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_count: usize,
    pub message: String,
}

/// 自動完成查詢
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutocompleteQuery {
    #[serde(default)]
    pub q: String,
}

/// 帳號刪除請求: 目標帳號的身分組由前置認證層提供
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteAccountRequest {
    #[serde(default)]
    pub roles: Vec<String>,
}
