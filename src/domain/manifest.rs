// ==========================================
// 廢棄物清運聯單管理系統 - 聯單領域模型
// ==========================================
// 職責: 聯單主記錄 + 各階段子記錄 + 匯入歷史
// 紅線: 聯單不做物理刪除，「刪除」一律標記 is_visible = false；
//       任一 (manifest_id, waste_id) 鍵同時至多一筆可見列
// ==========================================

use crate::domain::types::ManifestType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// 聯單識別三元組（類型 + 聯單編號 + 廢棄物ID）
///
/// 聯單編號會跨廢棄物項目重複，鍵必須含 waste_id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManifestKey {
    #[serde(rename = "type")]
    pub manifest_type: ManifestType,
    #[serde(rename = "manifestId")]
    pub manifest_id: String,
    #[serde(rename = "wasteId")]
    pub waste_id: String,
}

/// 聯單主記錄
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub id: i64, // 代理鍵（同一業務鍵可保留多筆歷史列）
    pub manifest_id: String,
    pub waste_id: String,
    pub manifest_type: ManifestType,
    pub company_id: String,
    pub process_code: String,
    pub from_storage: bool,          // 是否由貯存地起運
    pub origin_location: Option<String>, // 起運地
    pub manifest_confirmation: bool, // 聯單確認
    pub is_visible: bool,            // 可見性標記（false = 已邏輯刪除）
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 申報單（與聯單一對一）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub report_id: i64,
    pub manifest_ref: i64,
    pub report_date: Option<NaiveDate>,
    pub report_time: Option<NaiveTime>,
    pub transport_date: Option<NaiveDate>,
    pub transport_time: Option<NaiveTime>,
    pub reported_weight: f64, // 申報重量（kg）
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 清運單（與聯單一對一；再利用單無清除者時不建立）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transport {
    pub transport_id: i64,
    pub manifest_ref: i64,
    pub carrier_id: String,
    pub vehicle_id: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<NaiveTime>,
    pub carrier_vehicle_number: Option<String>,
    pub carrier_confirmation: bool,
    pub carrier_rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 處理單（僅清除單）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Processing {
    pub processing_id: i64,
    pub manifest_ref: i64,
    pub processor_id: String,
    pub receive_date: Option<NaiveDate>,
    pub receive_time: Option<NaiveTime>,
    pub intermediate_treatment: Option<String>, // 中間處理方式
    pub processing_completion_date: Option<NaiveDate>,
    pub processing_completion_time: Option<NaiveTime>,
    pub final_disposal_method: Option<String>, // 最終處置方式
    pub processor_confirmation: bool,
    pub processor_vehicle: Option<String>,
    pub final_processor_id: Option<String>,
    pub final_processor_name: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub entry_time: Option<NaiveTime>,
    pub entry_number: Option<String>,
    pub final_processor_confirmation: bool,
    pub final_destination: Option<String>, // 最終流向
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 回收單（僅再利用單；無再利用者時不建立）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recycling {
    pub recycling_id: i64,
    pub manifest_ref: i64,
    pub reuser_id: String,
    pub recovery_date: Option<NaiveDate>,
    pub recovery_time: Option<NaiveTime>,
    pub reuse_purpose: Option<String>,
    pub reuse_purpose_description: Option<String>,
    pub reuse_method: Option<String>,
    pub reuse_completion_time: Option<NaiveDateTime>,
    pub reuser_confirmation: bool,
    pub reuser_vehicle: Option<String>,
    pub reuser_rejection_reason: Option<String>,
    pub source_confirmed: bool, // 產源是否已確認申報聯單內容
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 清除單特有資料
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisposalManifestData {
    pub manifest_ref: i64,
    pub substance_id: i64,
    pub waste_code: String,
    pub waste_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 再利用單特有資料
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReuseManifestData {
    pub manifest_ref: i64,
    pub substance_id: i64,
    pub substance_code: String,
    pub substance_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 匯入中間結構體
///
/// 用途: 匯入管線中間產物（檔案解析 → 欄位映射 → 此結構 → 落庫）
/// 生命週期: 僅在匯入流程內；兩種聯單類型共用，未出現的欄位為 None
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawManifestRecord {
    // ===== 識別鍵 =====
    pub manifest_id: Option<String>,
    pub waste_id: Option<String>,

    // ===== 主記錄欄位 =====
    pub company_id: Option<String>,
    pub company_name: Option<String>,
    pub process_code: Option<String>,
    pub process_name: Option<String>,
    pub from_storage: bool,
    pub origin_location: Option<String>,
    pub manifest_confirmation: bool,

    // ===== 物質欄位（清除單: 廢棄物；再利用單: 物質）=====
    pub substance_code: Option<String>,
    pub substance_name: Option<String>,

    // ===== 申報單欄位 =====
    pub report_date: Option<NaiveDate>,
    pub report_time: Option<NaiveTime>,
    pub transport_date: Option<NaiveDate>,
    pub transport_time: Option<NaiveTime>,
    pub reported_weight: f64,

    // ===== 清運單欄位 =====
    pub carrier_id: Option<String>,
    pub carrier_name: Option<String>,
    pub vehicle_number: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<NaiveTime>,
    pub carrier_vehicle_number: Option<String>,
    pub carrier_confirmation: bool,
    pub carrier_rejection_reason: Option<String>,

    // ===== 處理單欄位（僅清除單）=====
    pub processor_id: Option<String>,
    pub processor_name: Option<String>,
    pub receive_date: Option<NaiveDate>,
    pub receive_time: Option<NaiveTime>,
    pub intermediate_treatment: Option<String>,
    pub processing_completion_date: Option<NaiveDate>,
    pub processing_completion_time: Option<NaiveTime>,
    pub final_disposal_method: Option<String>,
    pub processor_confirmation: bool,
    pub processor_vehicle: Option<String>,
    pub final_processor_id: Option<String>,
    pub final_processor_name: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub entry_time: Option<NaiveTime>,
    pub entry_number: Option<String>,
    pub final_processor_confirmation: bool,
    pub final_destination: Option<String>,

    // ===== 回收單欄位（僅再利用單）=====
    pub reuser_id: Option<String>,
    pub reuser_name: Option<String>,
    pub reuser_nature: Option<String>,
    pub recovery_date: Option<NaiveDate>,
    pub recovery_time: Option<NaiveTime>,
    pub reuse_purpose: Option<String>,
    pub reuse_purpose_description: Option<String>,
    pub reuse_method: Option<String>,
    pub reuse_completion_time: Option<NaiveDateTime>,
    pub reuser_confirmation: bool,
    pub reuser_vehicle: Option<String>,
    pub reuser_rejection_reason: Option<String>,
    pub source_confirmed: bool,

    // ===== 元資訊 =====
    pub row_number: usize, // 原始檔案列號（日誌追溯用）
}

/// 匯入歷史（僅追加，每次匯入一筆）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportHistory {
    pub id: i64,
    pub filename: String,
    pub import_type: ManifestType,
    pub total_records: i64,
    pub imported_records: i64,
    pub skipped_records: i64,
    pub import_date: DateTime<Utc>,
}
