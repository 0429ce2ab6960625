// ==========================================
// 廢棄物清運聯單管理系統 - 聯單 CSV 匯出
// ==========================================
// 職責: 將篩選結果寫成 CSV 文字（欄名與匯入對照表一致）
// 約束: 帶 UTF-8 BOM；匯出檔可用 skip 策略重新匯入而不產生重複
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::columns;
use crate::repository::manifest_repo::ExportRow;

/// 匯出欄位（固定順序）
const EXPORT_HEADERS: [&str; 11] = [
    columns::MANIFEST_TYPE,
    columns::MANIFEST_ID,
    columns::WASTE_ID,
    columns::COMPANY_ID,
    columns::COMPANY_NAME,
    columns::REPORT_DATE,
    columns::REPORT_TIME,
    columns::MERGED_CODE,
    columns::MERGED_NAME,
    columns::REPORTED_WEIGHT,
    columns::MANIFEST_CONFIRMATION,
];

/// 將匯出列寫成 CSV 文字（含 BOM）
pub fn write_csv(rows: &[ExportRow]) -> ImportResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS)?;

    for row in rows {
        let record = vec![
            row.manifest_type.display_name().to_string(),
            row.manifest_id.clone(),
            row.waste_id.clone(),
            row.company_id.clone(),
            row.company_name.clone(),
            row.report_date
                .map(|d| d.format("%Y/%m/%d").to_string())
                .unwrap_or_default(),
            row.report_time
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_default(),
            row.waste_code.clone().unwrap_or_default(),
            row.waste_name.clone().unwrap_or_default(),
            row.reported_weight.to_string(),
            if row.manifest_confirmation { "Y" } else { "N" }.to_string(),
        ];
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::CsvParseError(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|_| ImportError::InvalidEncoding)?;

    Ok(format!("\u{feff}{}", text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ManifestType;
    use crate::importer::file_parser::{decode_utf8, parse_csv_text};
    use chrono::{NaiveDate, NaiveTime};

    fn sample_row() -> ExportRow {
        ExportRow {
            manifest_type: ManifestType::Disposal,
            manifest_id: "M20240501001".to_string(),
            waste_id: "W01".to_string(),
            company_id: "A123".to_string(),
            company_name: "某某醫院".to_string(),
            report_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            report_time: NaiveTime::from_hms_opt(14, 30, 0),
            waste_code: Some("D-1801".to_string()),
            waste_name: Some("感染性廢棄物".to_string()),
            reported_weight: 120.5,
            manifest_confirmation: true,
        }
    }

    #[test]
    fn test_export_csv_reimportable() {
        let text = write_csv(&[sample_row()]).unwrap();
        // BOM 在重新匯入時剝除
        let decoded = decode_utf8(text.as_bytes()).unwrap();
        let sheet = parse_csv_text(&decoded).unwrap();

        assert_eq!(sheet.rows.len(), 1);
        let row = &sheet.rows[0];
        assert_eq!(row.get("聯單編號"), Some(&"M20240501001".to_string()));
        assert_eq!(row.get("廢棄物ID"), Some(&"W01".to_string()));
        assert_eq!(row.get("廢棄物/物質代碼"), Some(&"D-1801".to_string()));
        assert_eq!(row.get("申報日期"), Some(&"2024/05/01".to_string()));
    }
}
