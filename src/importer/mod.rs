// ==========================================
// 廢棄物清運聯單管理系統 - 匯入層
// ==========================================
// 職責: 上傳檔案 → 聯單資料落庫
// 流程: 驗證 → 解析 → 日期時間拆分 → 衝突預掃描 → 批次提交
// ==========================================

pub mod conflict_scanner;
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod manifest_importer;

// 重導出核心類型
pub use conflict_scanner::{ConflictRecord, ConflictScanner};
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use field_mapper::{columns, FieldMapper};
pub use file_parser::{
    decode_utf8, parse_csv_text, parse_upload, parse_xlsx_bytes, validate_upload, ParsedSheet,
    MAX_UPLOAD_BYTES,
};
pub use manifest_importer::{ImportOutcome, ManifestImporter, BATCH_SIZE};
