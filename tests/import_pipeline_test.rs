// ==========================================
// 匯入管線整合測試
// ==========================================
// 驗證: 首次匯入落庫、skip/replace/keep_both 衝突策略、
//       識別鍵缺漏略過、匯入歷史、批次部分失敗
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use waste_manifest_system::domain::types::{ConflictResolution, ManifestType};
use waste_manifest_system::importer::{parse_csv_text, ImportOutcome, ManifestImporter};

use test_helpers::{
    create_test_db, disposal_csv, import_history_count, reuse_csv, total_count, visible_count,
};

fn import(
    conn: &Arc<Mutex<Connection>>,
    csv: &str,
    import_type: ManifestType,
    resolution: ConflictResolution,
) -> ImportOutcome {
    let sheet = parse_csv_text(csv).unwrap();
    ManifestImporter::new(conn.clone())
        .commit(&sheet.rows, import_type, resolution, "test.csv")
        .unwrap()
}

/// 首次匯入: 聯單主記錄與各階段子記錄一併建立，複合日期時間欄位已拆分
#[test]
fn test_first_import_creates_manifest_and_stages() {
    let (_temp, conn) = create_test_db().unwrap();

    let outcome = import(
        &conn,
        &disposal_csv(&[("M20240501001", "W01")]),
        ManifestType::Disposal,
        ConflictResolution::Skip,
    );

    assert!(outcome.success);
    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(visible_count(&conn, "M20240501001", "W01"), 1);

    let locked = conn.lock().unwrap();
    let (report_date, report_time, weight): (String, String, f64) = locked
        .query_row(
            "SELECT r.report_date, r.report_time, r.reported_weight \
             FROM report r JOIN manifest m ON m.id = r.manifest_ref \
             WHERE m.manifest_id = 'M20240501001'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    // 「2024/05/01 下午 02:30:00」須拆分為日期與 24 小時制時間
    assert_eq!(report_date, "2024-05-01");
    assert_eq!(report_time, "14:30:00");
    assert_eq!(weight, 120.5);

    let (transports, processings, disposal_rows): (i64, i64, i64) = locked
        .query_row(
            "SELECT (SELECT COUNT(*) FROM transport), \
             (SELECT COUNT(*) FROM processing), \
             (SELECT COUNT(*) FROM disposal_data)",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(transports, 1);
    assert_eq!(processings, 1);
    assert_eq!(disposal_rows, 1);
}

/// skip 策略: 既有可見鍵重複匯入時略過數 +1 且不新增任何列
#[test]
fn test_skip_policy_preserves_existing() {
    let (_temp, conn) = create_test_db().unwrap();
    let csv = disposal_csv(&[("M001", "W01")]);

    import(&conn, &csv, ManifestType::Disposal, ConflictResolution::Skip);
    let second = import(&conn, &csv, ManifestType::Disposal, ConflictResolution::Skip);

    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(visible_count(&conn, "M001", "W01"), 1);
    assert_eq!(total_count(&conn, "M001", "W01"), 1);
}

/// replace 策略: 舊列標記不可見，替換後該鍵恰有一筆可見列
#[test]
fn test_replace_policy_soft_deletes_old_row() {
    let (_temp, conn) = create_test_db().unwrap();
    let csv = disposal_csv(&[("M001", "W01")]);

    import(&conn, &csv, ManifestType::Disposal, ConflictResolution::Skip);
    let second = import(&conn, &csv, ManifestType::Disposal, ConflictResolution::Replace);

    assert_eq!(second.imported, 1);
    assert_eq!(second.skipped, 0);
    // 歷史列保留，可見列唯一
    assert_eq!(visible_count(&conn, "M001", "W01"), 1);
    assert_eq!(total_count(&conn, "M001", "W01"), 2);
}

/// keep_both: 不動既有資料直接並存新增（落庫行為不做欄位合併）
#[test]
fn test_keep_both_inserts_alongside_existing() {
    let (_temp, conn) = create_test_db().unwrap();
    let csv = disposal_csv(&[("M001", "W01")]);

    import(&conn, &csv, ManifestType::Disposal, ConflictResolution::Skip);
    let second = import(&conn, &csv, ManifestType::Disposal, ConflictResolution::KeepBoth);

    assert_eq!(second.imported, 1);
    assert_eq!(visible_count(&conn, "M001", "W01"), 2);
}

/// 衝突檢查以聯單類型為界: 同鍵不同類型的匯入不構成衝突
#[test]
fn test_conflict_check_is_type_scoped() {
    let (_temp, conn) = create_test_db().unwrap();

    import(
        &conn,
        &disposal_csv(&[("M001", "W01")]),
        ManifestType::Disposal,
        ConflictResolution::Skip,
    );
    let outcome = import(
        &conn,
        &reuse_csv(&[("M001", "W01")]),
        ManifestType::Reuse,
        ConflictResolution::Skip,
    );

    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(visible_count(&conn, "M001", "W01"), 2);
}

/// 再利用單: 無清除者欄位時不建立清運單，有再利用者時建立回收單
#[test]
fn test_reuse_import_optional_stages() {
    let (_temp, conn) = create_test_db().unwrap();

    let outcome = import(
        &conn,
        &reuse_csv(&[("R001", "W02")]),
        ManifestType::Reuse,
        ConflictResolution::Skip,
    );
    assert_eq!(outcome.imported, 1);

    let locked = conn.lock().unwrap();
    let (transports, recyclings, reuse_rows): (i64, i64, i64) = locked
        .query_row(
            "SELECT (SELECT COUNT(*) FROM transport), \
             (SELECT COUNT(*) FROM recycling), \
             (SELECT COUNT(*) FROM reuse_data)",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(transports, 0);
    assert_eq!(recyclings, 1);
    assert_eq!(reuse_rows, 1);
}

/// 識別鍵缺漏的列靜默略過，不影響其餘列
#[test]
fn test_missing_key_rows_are_skipped() {
    let (_temp, conn) = create_test_db().unwrap();

    let csv = "聯單編號,廢棄物ID,事業機構代碼,事業機構名稱\n\
               M001,W01,A123,仁心醫院\n\
               M002,,A123,仁心醫院\n\
               ,W03,A123,仁心醫院\n";
    let outcome = import(&conn, csv, ManifestType::Disposal, ConflictResolution::Skip);

    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.skipped, 2);
    assert_eq!(visible_count(&conn, "M001", "W01"), 1);
}

/// 匯入歷史: 即使全數略過也要留一筆，計數與結果一致
#[test]
fn test_import_history_written_even_if_all_skipped() {
    let (_temp, conn) = create_test_db().unwrap();
    let csv = disposal_csv(&[("M001", "W01")]);

    import(&conn, &csv, ManifestType::Disposal, ConflictResolution::Skip);
    import(&conn, &csv, ManifestType::Disposal, ConflictResolution::Skip);

    assert_eq!(import_history_count(&conn), 2);

    let locked = conn.lock().unwrap();
    let (total, imported, skipped): (i64, i64, i64) = locked
        .query_row(
            "SELECT total_records, imported_records, skipped_records \
             FROM import_history ORDER BY id DESC LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(imported, 0);
    assert_eq!(skipped, 1);
}

/// 批次部分失敗: 第 150 列觸發資料庫錯誤時，
/// 其所在批次（101-200）整批計入略過，前後批次照常提交
#[test]
fn test_batch_partial_failure_skips_only_failing_batch() {
    let (_temp, conn) = create_test_db().unwrap();

    // 以觸發器模擬第 150 列的非預期資料庫失敗
    conn.lock()
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER simulate_row_failure BEFORE INSERT ON manifest \
             WHEN NEW.manifest_id = 'M0150' \
             BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
        )
        .unwrap();

    let keys: Vec<(String, String)> = (1..=300)
        .map(|i| (format!("M{:04}", i), "W01".to_string()))
        .collect();
    let key_refs: Vec<(&str, &str)> = keys
        .iter()
        .map(|(m, w)| (m.as_str(), w.as_str()))
        .collect();

    let outcome = import(
        &conn,
        &disposal_csv(&key_refs),
        ManifestType::Disposal,
        ConflictResolution::Skip,
    );

    assert_eq!(outcome.total, 300);
    assert_eq!(outcome.imported, 200);
    assert_eq!(outcome.skipped, 100);

    // 第一批（1-100）與第三批（201-300）維持有效
    assert_eq!(visible_count(&conn, "M0001", "W01"), 1);
    assert_eq!(visible_count(&conn, "M0100", "W01"), 1);
    assert_eq!(visible_count(&conn, "M0201", "W01"), 1);
    assert_eq!(visible_count(&conn, "M0300", "W01"), 1);
    // 失敗批次（101-200）整批回滾
    assert_eq!(visible_count(&conn, "M0101", "W01"), 0);
    assert_eq!(visible_count(&conn, "M0150", "W01"), 0);
    assert_eq!(visible_count(&conn, "M0200", "W01"), 0);

    // 匯入歷史仍記錄本次結果
    assert_eq!(import_history_count(&conn), 1);
}
