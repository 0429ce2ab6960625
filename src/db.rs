// ==========================================
// 廢棄物清運聯單管理系統 - SQLite 連線初始化
// ==========================================
// 目標:
// - 統一所有 Connection::open 的 PRAGMA 行為，避免「部分模組外鍵開啟/部分不開啟」
// - 統一 busy_timeout，減少併發寫入時的偶發 busy 錯誤
// - 內嵌資料表結構，首次啟動即可建庫
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 預設 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 資料表結構
///
/// 說明：
/// - manifest 以代理鍵 id 為主鍵；(manifest_id, waste_id) 不設唯一約束，
///   因為替換匯入會保留多筆不可見的歷史列，僅要求「可見列」至多一筆
/// - 各階段子表（report/transport/processing/recycling）與聯單一對一
/// - 日期以 ISO 格式 TEXT 儲存（YYYY-MM-DD / HH:MM:SS）
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS company (
    company_id    TEXT PRIMARY KEY,
    company_name  TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS process (
    process_code  TEXT PRIMARY KEY,
    process_name  TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS waste_substance (
    substance_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    substance_code  TEXT NOT NULL,
    substance_name  TEXT NOT NULL,
    substance_type  TEXT NOT NULL CHECK (substance_type IN ('waste', 'reuse')),
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    UNIQUE (substance_code, substance_type)
);

CREATE TABLE IF NOT EXISTS carrier (
    carrier_id    TEXT PRIMARY KEY,
    carrier_name  TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS processor (
    processor_id    TEXT PRIMARY KEY,
    processor_name  TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reuser (
    reuser_id      TEXT PRIMARY KEY,
    reuser_name    TEXT NOT NULL,
    reuser_nature  TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vehicle (
    vehicle_id        TEXT PRIMARY KEY,
    vehicle_type      TEXT,
    vehicle_capacity  REAL,
    vehicle_owner_id  TEXT,
    owner_type        TEXT CHECK (owner_type IN ('carrier', 'processor', 'reuser')),
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS manifest (
    id                     INTEGER PRIMARY KEY AUTOINCREMENT,
    manifest_id            TEXT NOT NULL,
    waste_id               TEXT NOT NULL,
    manifest_type          TEXT NOT NULL CHECK (manifest_type IN ('disposal', 'reuse')),
    company_id             TEXT NOT NULL REFERENCES company (company_id),
    process_code           TEXT NOT NULL REFERENCES process (process_code),
    from_storage           INTEGER NOT NULL DEFAULT 0,
    origin_location        TEXT,
    manifest_confirmation  INTEGER NOT NULL DEFAULT 0,
    is_visible             INTEGER NOT NULL DEFAULT 1,
    created_at             TEXT NOT NULL,
    updated_at             TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_manifest_key
    ON manifest (manifest_id, waste_id, is_visible);

CREATE TABLE IF NOT EXISTS report (
    report_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    manifest_ref     INTEGER NOT NULL UNIQUE REFERENCES manifest (id) ON DELETE CASCADE,
    report_date      TEXT,
    report_time      TEXT,
    transport_date   TEXT,
    transport_time   TEXT,
    reported_weight  REAL NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transport (
    transport_id             INTEGER PRIMARY KEY AUTOINCREMENT,
    manifest_ref             INTEGER NOT NULL UNIQUE REFERENCES manifest (id) ON DELETE CASCADE,
    carrier_id               TEXT NOT NULL REFERENCES carrier (carrier_id),
    vehicle_id               TEXT REFERENCES vehicle (vehicle_id),
    delivery_date            TEXT,
    delivery_time            TEXT,
    carrier_vehicle_number   TEXT,
    carrier_confirmation     INTEGER NOT NULL DEFAULT 0,
    carrier_rejection_reason TEXT,
    created_at               TEXT NOT NULL,
    updated_at               TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS processing (
    processing_id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    manifest_ref                   INTEGER NOT NULL UNIQUE REFERENCES manifest (id) ON DELETE CASCADE,
    processor_id                   TEXT NOT NULL REFERENCES processor (processor_id),
    receive_date                   TEXT,
    receive_time                   TEXT,
    intermediate_treatment         TEXT,
    processing_completion_date     TEXT,
    processing_completion_time     TEXT,
    final_disposal_method          TEXT,
    processor_confirmation         INTEGER NOT NULL DEFAULT 0,
    processor_vehicle              TEXT,
    final_processor_id             TEXT,
    final_processor_name           TEXT,
    entry_date                     TEXT,
    entry_time                     TEXT,
    entry_number                   TEXT,
    final_processor_confirmation   INTEGER NOT NULL DEFAULT 0,
    final_destination              TEXT,
    created_at                     TEXT NOT NULL,
    updated_at                     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS recycling (
    recycling_id             INTEGER PRIMARY KEY AUTOINCREMENT,
    manifest_ref             INTEGER NOT NULL UNIQUE REFERENCES manifest (id) ON DELETE CASCADE,
    reuser_id                TEXT NOT NULL REFERENCES reuser (reuser_id),
    recovery_date            TEXT,
    recovery_time            TEXT,
    reuse_purpose            TEXT,
    reuse_purpose_description TEXT,
    reuse_method             TEXT,
    reuse_completion_time    TEXT,
    reuser_confirmation      INTEGER NOT NULL DEFAULT 0,
    reuser_vehicle           TEXT,
    reuser_rejection_reason  TEXT,
    source_confirmed         INTEGER NOT NULL DEFAULT 0,
    created_at               TEXT NOT NULL,
    updated_at               TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS disposal_data (
    manifest_ref  INTEGER PRIMARY KEY REFERENCES manifest (id) ON DELETE CASCADE,
    substance_id  INTEGER NOT NULL REFERENCES waste_substance (substance_id),
    waste_code    TEXT NOT NULL,
    waste_name    TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reuse_data (
    manifest_ref    INTEGER PRIMARY KEY REFERENCES manifest (id) ON DELETE CASCADE,
    substance_id    INTEGER NOT NULL REFERENCES waste_substance (substance_id),
    substance_code  TEXT NOT NULL,
    substance_name  TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS import_history (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    filename          TEXT NOT NULL,
    import_type       TEXT NOT NULL CHECK (import_type IN ('disposal', 'reuse')),
    total_records     INTEGER NOT NULL DEFAULT 0,
    imported_records  INTEGER NOT NULL DEFAULT 0,
    skipped_records   INTEGER NOT NULL DEFAULT 0,
    import_date       TEXT NOT NULL
);
"#;

/// 配置 SQLite 連線的統一 PRAGMA
///
/// 說明：
/// - foreign_keys 需要「每個連線」單獨開啟
/// - busy_timeout 需要「每個連線」單獨配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打開 SQLite 連線並套用統一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建立資料表結構（冪等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        // 重複執行不應報錯
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='manifest'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
