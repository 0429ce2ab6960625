// ==========================================
// 廢棄物清運聯單管理系統 - 欄位映射器
// ==========================================
// 職責: CSV 表頭（zh-TW 自然語言欄名）→ 內部欄位識別子 + 類型轉換
// 約束: 識別鍵以外的欄位採寬鬆解析，單欄失敗不淘汰整列
// ==========================================

use crate::domain::manifest::RawManifestRecord;
use crate::domain::types::ManifestType;
use crate::importer::data_cleaner::DataCleaner;
use std::collections::HashMap;

/// 固定欄名對照表（部署地區語系）
///
/// 匯出檔使用合併欄名（廢棄物/物質代碼），匯入時以別名接受
pub mod columns {
    pub const MANIFEST_ID: &str = "聯單編號";
    pub const WASTE_ID: &str = "廢棄物ID";
    pub const COMPANY_ID: &str = "事業機構代碼";
    pub const COMPANY_NAME: &str = "事業機構名稱";
    pub const PROCESS_CODE: &str = "製程代碼";
    pub const PROCESS_NAME: &str = "製程名稱";
    pub const FROM_STORAGE: &str = "是否由貯存地起運";
    pub const ORIGIN_LOCATION: &str = "起運地";
    pub const MANIFEST_CONFIRMATION: &str = "聯單確認";

    pub const WASTE_CODE: &str = "廢棄物代碼";
    pub const WASTE_NAME: &str = "廢棄物名稱";
    pub const SUBSTANCE_CODE: &str = "物質代碼";
    pub const SUBSTANCE_NAME: &str = "物質名稱";
    pub const MERGED_CODE: &str = "廢棄物/物質代碼";
    pub const MERGED_NAME: &str = "廢棄物/物質名稱";

    pub const REPORT_DATE: &str = "申報日期";
    pub const REPORT_TIME: &str = "申報時間";
    pub const TRANSPORT_DATE: &str = "清運日期";
    pub const TRANSPORT_TIME: &str = "清運時間";
    pub const REPORTED_WEIGHT: &str = "申報重量";

    pub const CARRIER_ID: &str = "清除者代碼";
    pub const CARRIER_NAME: &str = "清除者名稱";
    pub const VEHICLE_NUMBER: &str = "運載車號";
    pub const DELIVERY_DATE: &str = "運送日期";
    pub const DELIVERY_TIME: &str = "運送時間";
    pub const CARRIER_VEHICLE_NUMBER: &str = "清除者運載車號";
    pub const CARRIER_ACTUAL_VEHICLE: &str = "清除者實際運載車號";
    pub const CARRIER_CONFIRMATION: &str = "清除者確認";
    pub const CARRIER_REJECTION_REASON: &str = "清除者不接受原因";

    pub const PROCESSOR_ID: &str = "處理者代碼";
    pub const PROCESSOR_NAME: &str = "處理者名稱";
    pub const RECEIVE_DATE: &str = "收受日期";
    pub const RECEIVE_TIME: &str = "收受時間";
    pub const INTERMEDIATE_TREATMENT: &str = "中間處理方式";
    pub const PROCESSING_COMPLETION_DATE: &str = "處理完成日期";
    pub const PROCESSING_COMPLETION_TIME: &str = "處理完成時間";
    pub const FINAL_DISPOSAL_METHOD: &str = "最終處置方式";
    pub const PROCESSOR_CONFIRMATION: &str = "處理者確認";
    pub const PROCESSOR_VEHICLE: &str = "處理者運載車號";
    pub const FINAL_PROCESSOR_ID: &str = "最終處置者代碼";
    pub const FINAL_PROCESSOR_NAME: &str = "最終處置者名稱";
    pub const ENTRY_DATE: &str = "進場日期";
    pub const ENTRY_TIME: &str = "進場時間";
    pub const ENTRY_NUMBER: &str = "進場編號";
    pub const FINAL_PROCESSOR_CONFIRMATION: &str = "最終處置者確認";
    pub const FINAL_DESTINATION: &str = "最終流向";

    pub const REUSER_ID: &str = "再利用者代碼";
    pub const REUSER_NAME: &str = "再利用者名稱";
    pub const REUSER_NATURE: &str = "再利用者性質";
    pub const RECOVERY_DATE: &str = "回收日期";
    pub const RECOVERY_TIME: &str = "回收時間";
    pub const REUSE_PURPOSE: &str = "再利用用途";
    pub const REUSE_PURPOSE_DESCRIPTION: &str = "再利用用途說明";
    pub const REUSE_METHOD: &str = "再利用方式";
    pub const REUSE_COMPLETION_TIME: &str = "再利用完成時間";
    pub const REUSER_CONFIRMATION: &str = "再利用者是否確認";
    pub const REUSER_VEHICLE: &str = "再利用者實際運載車號";
    pub const REUSER_REJECTION_REASON: &str = "再利用者不接受原因";
    pub const SOURCE_CONFIRMED: &str = "產源是否已確認申報聯單內容";

    pub const MANIFEST_TYPE: &str = "聯單類型";
}

pub struct FieldMapper;

impl FieldMapper {
    /// 將單列映射為匯入中間結構
    ///
    /// 日期/時間欄位應先經 DataCleaner::transform_datetime_fields 拆分
    pub fn map_row(
        &self,
        row: &HashMap<String, String>,
        import_type: ManifestType,
        row_number: usize,
    ) -> RawManifestRecord {
        let cleaner = DataCleaner;

        let mut record = RawManifestRecord {
            manifest_id: self.get_string(row, columns::MANIFEST_ID),
            waste_id: self.get_string(row, columns::WASTE_ID),
            company_id: self.get_string(row, columns::COMPANY_ID),
            company_name: self.get_string(row, columns::COMPANY_NAME),
            process_code: self.get_string(row, columns::PROCESS_CODE),
            process_name: self.get_string(row, columns::PROCESS_NAME),
            from_storage: self.get_bool(row, columns::FROM_STORAGE),
            origin_location: self.get_string(row, columns::ORIGIN_LOCATION),
            manifest_confirmation: self.get_bool(row, columns::MANIFEST_CONFIRMATION),

            report_date: self.get_date(row, columns::REPORT_DATE),
            report_time: self.get_time(row, columns::REPORT_TIME),
            transport_date: self.get_date(row, columns::TRANSPORT_DATE),
            transport_time: self.get_time(row, columns::TRANSPORT_TIME),
            reported_weight: row
                .get(columns::REPORTED_WEIGHT)
                .map(|v| cleaner.parse_weight(v))
                .unwrap_or(0.0),

            carrier_id: self.get_string(row, columns::CARRIER_ID),
            carrier_name: self.get_string(row, columns::CARRIER_NAME),
            vehicle_number: self.get_string(row, columns::VEHICLE_NUMBER),
            delivery_date: self.get_date(row, columns::DELIVERY_DATE),
            delivery_time: self.get_time(row, columns::DELIVERY_TIME),
            carrier_confirmation: self.get_bool(row, columns::CARRIER_CONFIRMATION),

            row_number,
            ..Default::default()
        };

        match import_type {
            ManifestType::Disposal => {
                record.substance_code = self.get_string(row, columns::WASTE_CODE);
                record.substance_name = self.get_string(row, columns::WASTE_NAME);
                record.carrier_vehicle_number =
                    self.get_string(row, columns::CARRIER_VEHICLE_NUMBER);

                record.processor_id = self.get_string(row, columns::PROCESSOR_ID);
                record.processor_name = self.get_string(row, columns::PROCESSOR_NAME);
                record.receive_date = self.get_date(row, columns::RECEIVE_DATE);
                record.receive_time = self.get_time(row, columns::RECEIVE_TIME);
                record.intermediate_treatment =
                    self.get_string(row, columns::INTERMEDIATE_TREATMENT);
                record.processing_completion_date =
                    self.get_date(row, columns::PROCESSING_COMPLETION_DATE);
                record.processing_completion_time =
                    self.get_time(row, columns::PROCESSING_COMPLETION_TIME);
                record.final_disposal_method =
                    self.get_string(row, columns::FINAL_DISPOSAL_METHOD);
                record.processor_confirmation =
                    self.get_bool(row, columns::PROCESSOR_CONFIRMATION);
                record.processor_vehicle = self.get_string(row, columns::PROCESSOR_VEHICLE);
                record.final_processor_id = self.get_string(row, columns::FINAL_PROCESSOR_ID);
                record.final_processor_name = self.get_string(row, columns::FINAL_PROCESSOR_NAME);
                record.entry_date = self.get_date(row, columns::ENTRY_DATE);
                record.entry_time = self.get_time(row, columns::ENTRY_TIME);
                record.entry_number = self.get_string(row, columns::ENTRY_NUMBER);
                record.final_processor_confirmation =
                    self.get_bool(row, columns::FINAL_PROCESSOR_CONFIRMATION);
                record.final_destination = self.get_string(row, columns::FINAL_DESTINATION);
            }
            ManifestType::Reuse => {
                record.substance_code = self.get_string(row, columns::SUBSTANCE_CODE);
                record.substance_name = self.get_string(row, columns::SUBSTANCE_NAME);
                record.carrier_vehicle_number =
                    self.get_string(row, columns::CARRIER_ACTUAL_VEHICLE);
                record.carrier_rejection_reason =
                    self.get_string(row, columns::CARRIER_REJECTION_REASON);

                record.reuser_id = self.get_string(row, columns::REUSER_ID);
                record.reuser_name = self.get_string(row, columns::REUSER_NAME);
                record.reuser_nature = self.get_string(row, columns::REUSER_NATURE);
                record.recovery_date = self.get_date(row, columns::RECOVERY_DATE);
                record.recovery_time = self.get_time(row, columns::RECOVERY_TIME);
                record.reuse_purpose = self.get_string(row, columns::REUSE_PURPOSE);
                record.reuse_purpose_description =
                    self.get_string(row, columns::REUSE_PURPOSE_DESCRIPTION);
                record.reuse_method = self.get_string(row, columns::REUSE_METHOD);
                record.reuse_completion_time = row
                    .get(columns::REUSE_COMPLETION_TIME)
                    .and_then(|v| cleaner.parse_datetime(v));
                record.reuser_confirmation = self.get_bool(row, columns::REUSER_CONFIRMATION);
                record.reuser_vehicle = self.get_string(row, columns::REUSER_VEHICLE);
                record.reuser_rejection_reason =
                    self.get_string(row, columns::REUSER_REJECTION_REASON);
                record.source_confirmed = self.get_bool(row, columns::SOURCE_CONFIRMED);
            }
        }

        record
    }

    /// 提取字串欄位（空白視為缺漏），支援欄名別名
    fn get_string(&self, row: &HashMap<String, String>, key: &str) -> Option<String> {
        // 匯出檔的合併欄名作為匯入別名
        let aliases: Vec<&str> = match key {
            columns::WASTE_CODE => vec![columns::WASTE_CODE, columns::MERGED_CODE],
            columns::WASTE_NAME => vec![columns::WASTE_NAME, columns::MERGED_NAME],
            columns::SUBSTANCE_CODE => vec![columns::SUBSTANCE_CODE, columns::MERGED_CODE],
            columns::SUBSTANCE_NAME => vec![columns::SUBSTANCE_NAME, columns::MERGED_NAME],
            _ => vec![key],
        };

        for alias in aliases {
            if let Some(value) = row.get(alias) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }

    fn get_date(&self, row: &HashMap<String, String>, key: &str) -> Option<chrono::NaiveDate> {
        row.get(key).and_then(|v| DataCleaner.parse_date(v))
    }

    fn get_time(&self, row: &HashMap<String, String>, key: &str) -> Option<chrono::NaiveTime> {
        row.get(key).and_then(|v| DataCleaner.parse_time(v))
    }

    fn get_bool(&self, row: &HashMap<String, String>, key: &str) -> bool {
        row.get(key).map(|v| DataCleaner.parse_bool(v)).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_map_disposal_row() {
        let input = row(&[
            ("聯單編號", "M20240501001"),
            ("廢棄物ID", "W01"),
            ("事業機構代碼", "A123"),
            ("事業機構名稱", "某某醫院"),
            ("廢棄物代碼", "D-1801"),
            ("廢棄物名稱", "感染性廢棄物"),
            ("申報日期", "2024/05/01"),
            ("申報時間", "14:30:00"),
            ("申報重量", "120.5"),
            ("聯單確認", "Y"),
            ("清除者代碼", "C01"),
        ]);

        let record = FieldMapper.map_row(&input, ManifestType::Disposal, 1);
        assert_eq!(record.manifest_id.as_deref(), Some("M20240501001"));
        assert_eq!(record.waste_id.as_deref(), Some("W01"));
        assert_eq!(record.substance_code.as_deref(), Some("D-1801"));
        assert_eq!(record.report_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(record.reported_weight, 120.5);
        assert!(record.manifest_confirmation);
        assert_eq!(record.carrier_id.as_deref(), Some("C01"));
    }

    #[test]
    fn test_map_reuse_row_uses_substance_columns() {
        let input = row(&[
            ("聯單編號", "R001"),
            ("廢棄物ID", "W02"),
            ("物質代碼", "R-0201"),
            ("物質名稱", "廢塑膠"),
            ("再利用者代碼", "RU9"),
            ("再利用完成時間", "2024/06/01 10:00:00"),
        ]);

        let record = FieldMapper.map_row(&input, ManifestType::Reuse, 1);
        assert_eq!(record.substance_code.as_deref(), Some("R-0201"));
        assert_eq!(record.reuser_id.as_deref(), Some("RU9"));
        assert!(record.reuse_completion_time.is_some());
    }

    #[test]
    fn test_merged_export_header_alias() {
        let input = row(&[
            ("聯單編號", "M001"),
            ("廢棄物ID", "W01"),
            ("廢棄物/物質代碼", "D-1801"),
            ("廢棄物/物質名稱", "感染性廢棄物"),
        ]);

        let disposal = FieldMapper.map_row(&input, ManifestType::Disposal, 1);
        assert_eq!(disposal.substance_code.as_deref(), Some("D-1801"));

        let reuse = FieldMapper.map_row(&input, ManifestType::Reuse, 1);
        assert_eq!(reuse.substance_name.as_deref(), Some("感染性廢棄物"));
    }

    #[test]
    fn test_bad_date_becomes_none_without_error() {
        let input = row(&[
            ("聯單編號", "M001"),
            ("廢棄物ID", "W01"),
            ("申報日期", "民國113年5月1日"),
        ]);

        let record = FieldMapper.map_row(&input, ManifestType::Disposal, 3);
        assert!(record.report_date.is_none());
        assert_eq!(record.row_number, 3);
    }

    #[test]
    fn test_missing_keys_are_none() {
        let input = row(&[("事業機構代碼", "A123")]);
        let record = FieldMapper.map_row(&input, ManifestType::Disposal, 1);
        assert!(record.manifest_id.is_none());
        assert!(record.waste_id.is_none());
    }
}
