// ==========================================
// 衝突預掃描整合測試
// ==========================================
// 驗證: 預掃描只讀不寫、衝突清單內容、無鍵列不參與掃描
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use waste_manifest_system::domain::types::{ConflictResolution, ManifestType};
use waste_manifest_system::importer::{parse_csv_text, ConflictScanner, ManifestImporter};

use test_helpers::{create_test_db, disposal_csv, import_history_count, total_count};

fn seed(conn: &Arc<Mutex<Connection>>, keys: &[(&str, &str)]) {
    let sheet = parse_csv_text(&disposal_csv(keys)).unwrap();
    ManifestImporter::new(conn.clone())
        .commit(&sheet.rows, ManifestType::Disposal, ConflictResolution::Skip, "seed.csv")
        .unwrap();
}

/// 預掃描: 僅回報與可見聯單的鍵碰撞，且不寫入任何資料
#[test]
fn test_scan_reports_collisions_without_writes() {
    let (_temp, conn) = create_test_db().unwrap();
    seed(&conn, &[("M001", "W01")]);

    let history_before = import_history_count(&conn);

    // 一列碰撞 + 一列新鍵
    let sheet = parse_csv_text(&disposal_csv(&[("M001", "W01"), ("M002", "W01")])).unwrap();
    let conflicts = ConflictScanner::new(conn.clone()).scan(&sheet.rows).unwrap();

    assert_eq!(conflicts.len(), 1);
    let conflict = &conflicts[0];
    assert_eq!(conflict.manifest_id, "M001");
    assert_eq!(conflict.waste_id, "W01");
    // 既有記錄欄位值供呼叫端比對
    assert_eq!(
        conflict.existing_data.get("事業機構名稱"),
        Some(&"仁心醫院".to_string())
    );
    assert_eq!(
        conflict.existing_data.get("廢棄物代碼"),
        Some(&"D-1801".to_string())
    );
    assert_eq!(
        conflict.existing_data.get("申報日期"),
        Some(&"2024/05/01".to_string())
    );
    // 上傳列的非空欄位
    assert_eq!(conflict.new_data.get("清除者代碼"), Some(&"C01".to_string()));

    // 掃描不產生任何寫入
    assert_eq!(total_count(&conn, "M002", "W01"), 0);
    assert_eq!(import_history_count(&conn), history_before);
}

/// 已標記不可見的聯單不構成衝突
#[test]
fn test_invisible_rows_do_not_conflict() {
    let (_temp, conn) = create_test_db().unwrap();
    seed(&conn, &[("M001", "W01")]);

    conn.lock()
        .unwrap()
        .execute("UPDATE manifest SET is_visible = 0 WHERE manifest_id = 'M001'", [])
        .unwrap();

    let sheet = parse_csv_text(&disposal_csv(&[("M001", "W01")])).unwrap();
    let conflicts = ConflictScanner::new(conn.clone()).scan(&sheet.rows).unwrap();
    assert!(conflicts.is_empty());
}

/// 識別鍵不全的列不參與掃描
#[test]
fn test_rows_without_keys_are_not_scanned() {
    let (_temp, conn) = create_test_db().unwrap();
    seed(&conn, &[("M001", "W01")]);

    let csv = "聯單編號,廢棄物ID\nM001,\n,W01\n";
    let sheet = parse_csv_text(csv).unwrap();
    let conflicts = ConflictScanner::new(conn.clone()).scan(&sheet.rows).unwrap();
    assert!(conflicts.is_empty());
}
