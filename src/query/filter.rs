// ==========================================
// 廢棄物清運聯單管理系統 - 聯單篩選條件
// ==========================================
// 職責: 將查詢參數組裝為 SQL 條件（只查可見聯單）
// 約束: 子字串條件不分大小寫，依 filter_logic 以 AND/OR 組合；
//       其餘條件一律為 AND
// ==========================================

use crate::domain::types::{ConfirmationStatus, FilterLogic, ManifestType};
use chrono::NaiveDate;
use rusqlite::types::Value;
use serde::Deserialize;

/// 每頁筆數
pub const PAGE_SIZE: u32 = 20;

/// 聯單篩選條件（所有欄位皆可省略）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestFilter {
    pub manifest_type: Option<ManifestType>,
    pub manifest_id: Option<String>,
    pub company_name: Option<String>,
    pub waste_code: Option<String>,
    pub waste_name: Option<String>,
    pub report_date_from: Option<NaiveDate>,
    pub report_date_to: Option<NaiveDate>,
    pub reported_weight_above: Option<f64>,
    pub reported_weight_below: Option<f64>,
    pub confirmation_status: Option<ConfirmationStatus>,
    #[serde(default)]
    pub filter_logic: FilterLogic,
}

impl ManifestFilter {
    /// 組裝 WHERE 子句（含 is_visible 條件）與對應參數
    ///
    /// 欄位別名約定: m=manifest, c=company, r=report,
    /// dd=disposal_data, rd=reuse_data
    pub fn build_where(&self) -> (String, Vec<Value>) {
        let mut conditions: Vec<String> = vec!["m.is_visible = 1".to_string()];
        let mut params: Vec<Value> = Vec::new();

        if let Some(manifest_type) = self.manifest_type {
            conditions.push("m.manifest_type = ?".to_string());
            params.push(Value::Text(manifest_type.as_str().to_string()));
        }

        // 子字串條件依 filter_logic 組合
        let mut substring: Vec<String> = Vec::new();
        if let Some(manifest_id) = non_empty(&self.manifest_id) {
            substring.push("lower(m.manifest_id) LIKE '%' || lower(?) || '%'".to_string());
            params.push(Value::Text(manifest_id.to_string()));
        }
        if let Some(company_name) = non_empty(&self.company_name) {
            substring.push("lower(c.company_name) LIKE '%' || lower(?) || '%'".to_string());
            params.push(Value::Text(company_name.to_string()));
        }
        if let Some(waste_code) = non_empty(&self.waste_code) {
            // 清除單與再利用單的代碼欄位擇一命中
            substring.push(
                "(lower(COALESCE(dd.waste_code, '')) LIKE '%' || lower(?) || '%' \
                 OR lower(COALESCE(rd.substance_code, '')) LIKE '%' || lower(?) || '%')"
                    .to_string(),
            );
            params.push(Value::Text(waste_code.to_string()));
            params.push(Value::Text(waste_code.to_string()));
        }
        if let Some(waste_name) = non_empty(&self.waste_name) {
            substring.push(
                "(lower(COALESCE(dd.waste_name, '')) LIKE '%' || lower(?) || '%' \
                 OR lower(COALESCE(rd.substance_name, '')) LIKE '%' || lower(?) || '%')"
                    .to_string(),
            );
            params.push(Value::Text(waste_name.to_string()));
            params.push(Value::Text(waste_name.to_string()));
        }
        if !substring.is_empty() {
            let joiner = match self.filter_logic {
                FilterLogic::And => " AND ",
                FilterLogic::Or => " OR ",
            };
            conditions.push(format!("({})", substring.join(joiner)));
        }

        if let Some(from) = self.report_date_from {
            conditions.push("r.report_date >= ?".to_string());
            params.push(Value::Text(from.to_string()));
        }
        if let Some(to) = self.report_date_to {
            conditions.push("r.report_date <= ?".to_string());
            params.push(Value::Text(to.to_string()));
        }
        if let Some(above) = self.reported_weight_above {
            conditions.push("r.reported_weight >= ?".to_string());
            params.push(Value::Real(above));
        }
        if let Some(below) = self.reported_weight_below {
            conditions.push("r.reported_weight <= ?".to_string());
            params.push(Value::Real(below));
        }
        match self.confirmation_status {
            Some(ConfirmationStatus::Confirmed) => {
                conditions.push("m.manifest_confirmation = 1".to_string());
            }
            Some(ConfirmationStatus::Unconfirmed) => {
                conditions.push("m.manifest_confirmation = 0".to_string());
            }
            None => {}
        }

        (conditions.join(" AND "), params)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_only_visibility() {
        let filter = ManifestFilter::default();
        let (clause, params) = filter.build_where();
        assert_eq!(clause, "m.is_visible = 1");
        assert!(params.is_empty());
    }

    #[test]
    fn test_type_and_date_range() {
        let filter = ManifestFilter {
            manifest_type: Some(ManifestType::Disposal),
            report_date_from: NaiveDate::from_ymd_opt(2024, 1, 1),
            report_date_to: NaiveDate::from_ymd_opt(2024, 12, 31),
            ..Default::default()
        };
        let (clause, params) = filter.build_where();
        assert!(clause.contains("m.manifest_type = ?"));
        assert!(clause.contains("r.report_date >= ?"));
        assert!(clause.contains("r.report_date <= ?"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_substring_or_logic() {
        let filter = ManifestFilter {
            manifest_id: Some("2024".to_string()),
            company_name: Some("醫院".to_string()),
            filter_logic: FilterLogic::Or,
            ..Default::default()
        };
        let (clause, params) = filter.build_where();
        assert!(clause.contains(" OR "));
        // OR 僅作用於子字串群組，外層仍為 AND
        assert!(clause.starts_with("m.is_visible = 1 AND ("));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_waste_code_matches_both_subtables() {
        let filter = ManifestFilter {
            waste_code: Some("D-18".to_string()),
            ..Default::default()
        };
        let (clause, params) = filter.build_where();
        assert!(clause.contains("dd.waste_code"));
        assert!(clause.contains("rd.substance_code"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_blank_substring_ignored() {
        let filter = ManifestFilter {
            manifest_id: Some("   ".to_string()),
            ..Default::default()
        };
        let (clause, params) = filter.build_where();
        assert_eq!(clause, "m.is_visible = 1");
        assert!(params.is_empty());
    }
}
