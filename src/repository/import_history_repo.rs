// ==========================================
// 廢棄物清運聯單管理系統 - 匯入歷史倉儲
// ==========================================
// 職責: 匯入歷史的追加與查詢（僅追加，不更新不刪除）
// ==========================================

use crate::domain::manifest::ImportHistory;
use crate::domain::types::ManifestType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// 在既有連線（事務內）追加一筆匯入歷史
///
/// 匯入流程在外層事務內呼叫，與該次匯入的資料寫入同時提交
pub fn insert_import_history_tx(
    conn: &Connection,
    filename: &str,
    import_type: ManifestType,
    total: usize,
    imported: usize,
    skipped: usize,
) -> RepositoryResult<()> {
    conn.execute(
        "INSERT INTO import_history \
         (filename, import_type, total_records, imported_records, skipped_records, import_date) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            filename,
            import_type.as_str(),
            total as i64,
            imported as i64,
            skipped as i64,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// 匯入歷史倉儲
pub struct ImportHistoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ImportHistoryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 查詢最近的匯入歷史（新到舊）
    pub fn recent(&self, limit: usize) -> RepositoryResult<Vec<ImportHistory>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT id, filename, import_type, total_records, imported_records, \
             skipped_records, import_date \
             FROM import_history ORDER BY import_date DESC, id DESC LIMIT ?1",
        )?;
        let histories = stmt
            .query_map(params![limit as i64], |row| {
                let type_raw: String = row.get(2)?;
                Ok(ImportHistory {
                    id: row.get(0)?,
                    filename: row.get(1)?,
                    import_type: ManifestType::from_str(&type_raw)
                        .unwrap_or(ManifestType::Disposal),
                    total_records: row.get(3)?,
                    imported_records: row.get(4)?,
                    skipped_records: row.get(5)?,
                    import_date: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(histories)
    }
}
