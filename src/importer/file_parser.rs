// ==========================================
// 廢棄物清運聯單管理系統 - 上傳檔案解析器
// ==========================================
// 支援: CSV (.csv) / Excel (.xlsx)
// 輸出: 保留輸入順序的列映射（欄名 → 值），全空白列剔除
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{Reader, Xlsx};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Cursor;

/// 上傳大小上限（5 MB）
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// UTF-8 BOM
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// 解析後的表格（表頭順序 + 依輸入順序的列映射）
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl ParsedSheet {
    /// 重新編碼為 CSV 文字（衝突解決流程回傳酬載用）
    ///
    /// 欄位順序依原始表頭；缺欄輸出空字串
    pub fn to_csv_string(&self) -> ImportResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            let record: Vec<&str> = self
                .headers
                .iter()
                .map(|h| row.get(h).map(String::as_str).unwrap_or(""))
                .collect();
            writer.write_record(&record)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ImportError::CsvParseError(e.to_string()))?;
        String::from_utf8(bytes).map_err(|_| ImportError::InvalidEncoding)
    }
}

/// 上傳前驗證: 副檔名 / 大小 / 非空
pub fn validate_upload(filename: &str, data: &[u8]) -> ImportResult<()> {
    let lowered = filename.to_lowercase();
    if !(lowered.ends_with(".csv") || lowered.ends_with(".xlsx")) {
        let ext = lowered.rsplit('.').next().unwrap_or("").to_string();
        return Err(ImportError::UnsupportedFormat(ext));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(ImportError::FileTooLarge {
            limit_mb: MAX_UPLOAD_BYTES / (1024 * 1024),
            actual: data.len(),
        });
    }
    if data.is_empty() {
        return Err(ImportError::EmptyFile);
    }
    Ok(())
}

/// 依副檔名自動選擇解析器
pub fn parse_upload(filename: &str, data: &[u8]) -> ImportResult<ParsedSheet> {
    let lowered = filename.to_lowercase();
    if lowered.ends_with(".csv") {
        let text = decode_utf8(data)?;
        parse_csv_text(&text)
    } else if lowered.ends_with(".xlsx") {
        parse_xlsx_bytes(data)
    } else {
        let ext = lowered.rsplit('.').next().unwrap_or("").to_string();
        Err(ImportError::UnsupportedFormat(ext))
    }
}

/// 以 UTF-8 解碼（容忍 BOM）
pub fn decode_utf8(data: &[u8]) -> ImportResult<String> {
    let stripped = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    std::str::from_utf8(stripped)
        .map(str::to_string)
        .map_err(|_| ImportError::InvalidEncoding)
}

/// 解析 CSV 文字為列映射序列
pub fn parse_csv_text(text: &str) -> ImportResult<ParsedSheet> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // 允許列長度不一致
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row_map = HashMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            if let Some(header) = headers.get(col_idx) {
                row_map.insert(header.clone(), value.trim().to_string());
            }
        }

        // 跳過完全空白的列
        if row_map.values().all(|v| v.is_empty()) {
            continue;
        }
        rows.push(row_map);
    }

    Ok(ParsedSheet { headers, rows })
}

/// 解析 Excel (.xlsx) 第一個工作表
pub fn parse_xlsx_bytes(data: &[u8]) -> ImportResult<ParsedSheet> {
    let cursor = Cursor::new(data.to_vec());
    let mut workbook: Xlsx<_> =
        Xlsx::new(cursor).map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| ImportError::ExcelParseError("Excel 檔案無工作表".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let header_row = sheet_rows
        .next()
        .ok_or_else(|| ImportError::ExcelParseError("Excel 檔案無資料列".to_string()))?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for data_row in sheet_rows {
        let mut row_map = HashMap::new();
        for (col_idx, cell) in data_row.iter().enumerate() {
            if let Some(header) = headers.get(col_idx) {
                row_map.insert(header.clone(), cell.to_string().trim().to_string());
            }
        }
        if row_map.values().all(|v| v.is_empty()) {
            continue;
        }
        rows.push(row_map);
    }

    Ok(ParsedSheet { headers, rows })
}
