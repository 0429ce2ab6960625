// ==========================================
// 廢棄物清運聯單管理系統 - 參與方主檔
// ==========================================
// 職責: 事業機構 / 製程 / 物質 / 清除者 / 處理者 / 再利用者 / 車輛
// 生命週期: 匯入時依自然鍵 find-or-create，屬性建立後不回寫
// ==========================================

use crate::domain::types::{OwnerType, SubstanceType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 事業機構
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub company_id: String,   // 事業機構代碼（自然鍵）
    pub company_name: String, // 事業機構名稱
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 製程
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub process_code: String, // 製程代碼（自然鍵）
    pub process_name: String, // 製程名稱
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 廢棄物/再利用物質
///
/// 同一 substance_code 可依 substance_type 對應不同物質，
/// 自然鍵為 (substance_code, substance_type)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteSubstance {
    pub substance_id: i64,
    pub substance_code: String,
    pub substance_name: String,
    pub substance_type: SubstanceType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 清除者
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carrier {
    pub carrier_id: String,
    pub carrier_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 處理者
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Processor {
    pub processor_id: String,
    pub processor_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 再利用者
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reuser {
    pub reuser_id: String,
    pub reuser_name: String,
    pub reuser_nature: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 運輸車輛（可選地隸屬於清除者/處理者/再利用者）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_id: String,
    pub vehicle_type: Option<String>,
    pub vehicle_capacity: Option<f64>, // 載重量（公噸）
    pub vehicle_owner_id: Option<String>,
    pub owner_type: Option<OwnerType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
