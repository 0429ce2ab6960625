// ==========================================
// 廢棄物清運聯單管理系統 - 領域枚舉類型
// ==========================================
// 職責: 聯單類型 / 物質類型 / 車輛擁有者類型 / 衝突處理方式
// 約束: 與資料表 CHECK 約束及 CSV 介面值保持一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 聯單類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestType {
    /// 清除單
    Disposal,
    /// 再利用單
    Reuse,
}

impl ManifestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestType::Disposal => "disposal",
            ManifestType::Reuse => "reuse",
        }
    }

    /// 顯示名稱（zh-TW）
    pub fn display_name(&self) -> &'static str {
        match self {
            ManifestType::Disposal => "清除單",
            ManifestType::Reuse => "再利用單",
        }
    }
}

impl fmt::Display for ManifestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManifestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disposal" => Ok(ManifestType::Disposal),
            "reuse" => Ok(ManifestType::Reuse),
            other => Err(format!("未知的聯單類型: {}", other)),
        }
    }
}

/// 物質類型（同一代碼可依類型對應不同物質）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstanceType {
    /// 廢棄物
    Waste,
    /// 再利用物質
    Reuse,
}

impl SubstanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubstanceType::Waste => "waste",
            SubstanceType::Reuse => "reuse",
        }
    }
}

/// 車輛擁有者類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerType {
    Carrier,
    Processor,
    Reuser,
}

impl OwnerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerType::Carrier => "carrier",
            OwnerType::Processor => "processor",
            OwnerType::Reuser => "reuser",
        }
    }
}

/// 匯入衝突處理方式
///
/// keep_both / smart_merge 的落庫行為等同「直接新增、不動既有資料」，
/// 不做欄位合併（介面保留選項，語意以實際落庫為準）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// 詢問如何處理（預掃描後由呼叫端二次提交）
    Ask,
    /// 略過重複資料
    Skip,
    /// 覆蓋重複資料（舊列標記不可見後新增）
    Replace,
    /// 保留兩者
    KeepBoth,
    /// 智慧合併
    SmartMerge,
    /// 取消（將該列計入略過）
    Cancel,
}

impl FromStr for ConflictResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ask" => Ok(ConflictResolution::Ask),
            "skip" => Ok(ConflictResolution::Skip),
            "replace" => Ok(ConflictResolution::Replace),
            "keep_both" => Ok(ConflictResolution::KeepBoth),
            "smart_merge" => Ok(ConflictResolution::SmartMerge),
            "cancel" => Ok(ConflictResolution::Cancel),
            other => Err(format!("未知的衝突處理方式: {}", other)),
        }
    }
}

/// 確認狀態篩選
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
    Confirmed,
    Unconfirmed,
}

/// 子字串篩選條件的組合邏輯
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLogic {
    /// 所有條件皆滿足
    #[default]
    And,
    /// 其中一個滿足即可
    Or,
}
