// ==========================================
// 廢棄物清運聯單管理系統 - 聯單匯入器
// ==========================================
// 職責: 匯入提交階段 - 逐列落庫與批次事務控制
// 流程: 拆分日期時間 → 欄位映射 → 鍵檢查 → 衝突處理 → 參與方 upsert
//       → 聯單與階段子記錄落庫 → 匯入歷史
// 事務: 外層單一事務，每 100 列一個 SAVEPOINT；
//       批次內任一列拋出資料庫錯誤時僅回滾該批次（整批計入略過），
//       已提交批次維持有效，匯入繼續
// ==========================================

use crate::domain::manifest::RawManifestRecord;
use crate::domain::types::{ConflictResolution, ManifestType, OwnerType, SubstanceType};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::repository::import_history_repo::insert_import_history_tx;
use crate::repository::lookup::{find_or_create, LookupEntity};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 每批列數（一批一個 SAVEPOINT）
pub const BATCH_SIZE: usize = 100;

/// 匯入結果
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub success: bool,
    pub message: String,
    pub imported: usize,
    pub skipped: usize,
    pub total: usize,
}

/// 聯單匯入器
pub struct ManifestImporter {
    conn: Arc<Mutex<Connection>>,
}

impl ManifestImporter {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 提交匯入（衝突預掃描已於呼叫端完成或被指定的處理方式略過）
    ///
    /// 列層級例外會被記錄並計入略過，不會傳播至呼叫端；
    /// 回傳的 Err 僅來自連線/外層事務層級的失敗
    pub fn commit(
        &self,
        rows: &[HashMap<String, String>],
        import_type: ManifestType,
        resolution: ConflictResolution,
        filename: &str,
    ) -> ImportResult<ImportOutcome> {
        let import_id = Uuid::new_v4();
        let total = rows.len();
        info!(
            import_id = %import_id,
            file = filename,
            import_type = import_type.as_str(),
            total,
            "開始匯入聯單"
        );

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::LockError(e.to_string()))?;
        let mut tx = conn
            .transaction()
            .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;

        let mut imported = 0usize;
        let mut skipped = 0usize;

        for (batch_index, batch) in rows.chunks(BATCH_SIZE).enumerate() {
            let start_row = batch_index * BATCH_SIZE + 1;
            let sp = tx
                .savepoint()
                .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;

            match commit_batch(&sp, batch, start_row, import_type, resolution) {
                Ok((batch_imported, batch_skipped)) => {
                    sp.commit()
                        .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;
                    imported += batch_imported;
                    skipped += batch_skipped;
                    debug!(
                        import_id = %import_id,
                        batch = batch_index + 1,
                        imported = batch_imported,
                        skipped = batch_skipped,
                        "批次提交完成"
                    );
                }
                Err(e) => {
                    // 批次失敗: SAVEPOINT 回滾，整批計入略過，匯入繼續
                    warn!(
                        import_id = %import_id,
                        batch = batch_index + 1,
                        rows = batch.len(),
                        error = %e,
                        "批次處理失敗，整批略過"
                    );
                    skipped += batch.len();
                }
            }
        }

        // 匯入歷史: 即使全數略過也要留一筆
        insert_import_history_tx(&tx, filename, import_type, total, imported, skipped)?;
        tx.commit()
            .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;

        info!(
            import_id = %import_id,
            total,
            imported,
            skipped,
            "聯單匯入完成"
        );

        Ok(ImportOutcome {
            success: true,
            message: format!("成功匯入 {} 筆資料，跳過 {} 筆資料", imported, skipped),
            imported,
            skipped,
            total,
        })
    }
}

/// 處理一個批次（在 SAVEPOINT 內執行）
fn commit_batch(
    conn: &Connection,
    batch: &[HashMap<String, String>],
    start_row: usize,
    import_type: ManifestType,
    resolution: ConflictResolution,
) -> ImportResult<(usize, usize)> {
    let cleaner = DataCleaner;
    let mapper = FieldMapper;

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for (offset, raw_row) in batch.iter().enumerate() {
        let row_number = start_row + offset;
        let transformed = cleaner.transform_datetime_fields(raw_row);
        let record = mapper.map_row(&transformed, import_type, row_number);

        if commit_row(conn, &record, import_type, resolution)? {
            imported += 1;
        } else {
            skipped += 1;
        }
    }

    Ok((imported, skipped))
}

/// 逐列落庫
///
/// # 回傳
/// - Ok(true): 已新增
/// - Ok(false): 略過（識別鍵缺漏或衝突處理方式判定略過）
/// - Err: 資料庫層級失敗（由批次層回滾）
fn commit_row(
    conn: &Connection,
    record: &RawManifestRecord,
    import_type: ManifestType,
    resolution: ConflictResolution,
) -> ImportResult<bool> {
    // 識別鍵缺漏: 靜默略過
    let (Some(manifest_id), Some(waste_id)) =
        (record.manifest_id.as_deref(), record.waste_id.as_deref())
    else {
        return Ok(false);
    };

    // 同類型可見聯單的鍵碰撞檢查
    let existing_id: Option<i64> = conn
        .query_row(
            "SELECT id FROM manifest \
             WHERE manifest_id = ?1 AND waste_id = ?2 \
               AND manifest_type = ?3 AND is_visible = 1 \
             LIMIT 1",
            params![manifest_id, waste_id, import_type.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(existing) = existing_id {
        match resolution {
            ConflictResolution::Skip | ConflictResolution::Cancel => return Ok(false),
            ConflictResolution::Replace => {
                // 覆蓋: 舊列標記不可見，保留歷史
                conn.execute(
                    "UPDATE manifest SET is_visible = 0, updated_at = ?1 WHERE id = ?2",
                    params![Utc::now().to_rfc3339(), existing],
                )?;
            }
            // ask 於預掃描階段處理; keep_both / smart_merge 與既有資料並存新增
            ConflictResolution::Ask
            | ConflictResolution::KeepBoth
            | ConflictResolution::SmartMerge => {}
        }
    }

    let now = Utc::now().to_rfc3339();

    // 參與方 upsert（依自然鍵 find-or-create）
    find_or_create(
        conn,
        &LookupEntity::company(
            record.company_id.as_deref().unwrap_or(""),
            record.company_name.as_deref().unwrap_or(""),
        ),
    )?;
    find_or_create(
        conn,
        &LookupEntity::process(
            record.process_code.as_deref().unwrap_or("0"),
            record.process_name.as_deref().unwrap_or("無資料"),
        ),
    )?;

    let substance_type = match import_type {
        ManifestType::Disposal => SubstanceType::Waste,
        ManifestType::Reuse => SubstanceType::Reuse,
    };
    let substance_id = find_or_create(
        conn,
        &LookupEntity::substance(
            record.substance_code.as_deref().unwrap_or(""),
            substance_type,
            record.substance_name.as_deref().unwrap_or(""),
        ),
    )?;

    if let Some(vehicle_number) = record.vehicle_number.as_deref() {
        find_or_create(
            conn,
            &LookupEntity::vehicle(
                vehicle_number,
                record.carrier_id.as_deref(),
                Some(OwnerType::Carrier),
            ),
        )?;
    }

    // 聯單主記錄
    conn.execute(
        "INSERT INTO manifest \
         (manifest_id, waste_id, manifest_type, company_id, process_code, from_storage, \
          origin_location, manifest_confirmation, is_visible, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?10)",
        params![
            manifest_id,
            waste_id,
            import_type.as_str(),
            record.company_id.as_deref().unwrap_or(""),
            record.process_code.as_deref().unwrap_or("0"),
            record.from_storage,
            record.origin_location,
            record.manifest_confirmation,
            now,
            now,
        ],
    )?;
    let manifest_ref = conn.last_insert_rowid();

    // 申報單
    conn.execute(
        "INSERT INTO report \
         (manifest_ref, report_date, report_time, transport_date, transport_time, \
          reported_weight, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            manifest_ref,
            record.report_date,
            record.report_time,
            record.transport_date,
            record.transport_time,
            record.reported_weight,
            now,
            now,
        ],
    )?;

    match import_type {
        ManifestType::Disposal => {
            commit_disposal_stages(conn, record, manifest_ref, substance_id, &now)?
        }
        ManifestType::Reuse => {
            commit_reuse_stages(conn, record, manifest_ref, substance_id, &now)?
        }
    }

    Ok(true)
}

/// 清除單階段子記錄（清運單與處理單必建）
fn commit_disposal_stages(
    conn: &Connection,
    record: &RawManifestRecord,
    manifest_ref: i64,
    substance_id: i64,
    now: &str,
) -> ImportResult<()> {
    conn.execute(
        "INSERT INTO disposal_data \
         (manifest_ref, substance_id, waste_code, waste_name, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            manifest_ref,
            substance_id,
            record.substance_code.as_deref().unwrap_or(""),
            record.substance_name.as_deref().unwrap_or(""),
            now,
            now,
        ],
    )?;

    let carrier_id = record.carrier_id.as_deref().unwrap_or("");
    find_or_create(
        conn,
        &LookupEntity::carrier(carrier_id, record.carrier_name.as_deref().unwrap_or("")),
    )?;
    conn.execute(
        "INSERT INTO transport \
         (manifest_ref, carrier_id, vehicle_id, delivery_date, delivery_time, \
          carrier_vehicle_number, carrier_confirmation, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            manifest_ref,
            carrier_id,
            record.vehicle_number,
            record.delivery_date,
            record.delivery_time,
            record.carrier_vehicle_number,
            record.carrier_confirmation,
            now,
            now,
        ],
    )?;

    let processor_id = record.processor_id.as_deref().unwrap_or("");
    find_or_create(
        conn,
        &LookupEntity::processor(processor_id, record.processor_name.as_deref().unwrap_or("")),
    )?;
    conn.execute(
        "INSERT INTO processing \
         (manifest_ref, processor_id, receive_date, receive_time, intermediate_treatment, \
          processing_completion_date, processing_completion_time, final_disposal_method, \
          processor_confirmation, processor_vehicle, final_processor_id, final_processor_name, \
          entry_date, entry_time, entry_number, final_processor_confirmation, final_destination, \
          created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
                 ?18, ?19)",
        params![
            manifest_ref,
            processor_id,
            record.receive_date,
            record.receive_time,
            record.intermediate_treatment,
            record.processing_completion_date,
            record.processing_completion_time,
            record.final_disposal_method,
            record.processor_confirmation,
            record.processor_vehicle,
            record.final_processor_id,
            record.final_processor_name,
            record.entry_date,
            record.entry_time,
            record.entry_number,
            record.final_processor_confirmation,
            record.final_destination,
            now,
            now,
        ],
    )?;

    Ok(())
}

/// 再利用單階段子記錄（無清除者則無清運單；無再利用者則無回收單）
fn commit_reuse_stages(
    conn: &Connection,
    record: &RawManifestRecord,
    manifest_ref: i64,
    substance_id: i64,
    now: &str,
) -> ImportResult<()> {
    conn.execute(
        "INSERT INTO reuse_data \
         (manifest_ref, substance_id, substance_code, substance_name, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            manifest_ref,
            substance_id,
            record.substance_code.as_deref().unwrap_or(""),
            record.substance_name.as_deref().unwrap_or(""),
            now,
            now,
        ],
    )?;

    if let Some(carrier_id) = record.carrier_id.as_deref() {
        find_or_create(
            conn,
            &LookupEntity::carrier(carrier_id, record.carrier_name.as_deref().unwrap_or("")),
        )?;
        conn.execute(
            "INSERT INTO transport \
             (manifest_ref, carrier_id, vehicle_id, delivery_date, delivery_time, \
              carrier_vehicle_number, carrier_confirmation, carrier_rejection_reason, \
              created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                manifest_ref,
                carrier_id,
                record.vehicle_number,
                record.delivery_date,
                record.delivery_time,
                record.carrier_vehicle_number,
                record.carrier_confirmation,
                record.carrier_rejection_reason,
                now,
                now,
            ],
        )?;
    }

    if let Some(reuser_id) = record.reuser_id.as_deref() {
        find_or_create(
            conn,
            &LookupEntity::reuser(
                reuser_id,
                record.reuser_name.as_deref().unwrap_or(""),
                record.reuser_nature.as_deref(),
            ),
        )?;
        conn.execute(
            "INSERT INTO recycling \
             (manifest_ref, reuser_id, recovery_date, recovery_time, reuse_purpose, \
              reuse_purpose_description, reuse_method, reuse_completion_time, \
              reuser_confirmation, reuser_vehicle, reuser_rejection_reason, source_confirmed, \
              created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                manifest_ref,
                reuser_id,
                record.recovery_date,
                record.recovery_time,
                record.reuse_purpose,
                record.reuse_purpose_description,
                record.reuse_method,
                record.reuse_completion_time,
                record.reuser_confirmation,
                record.reuser_vehicle,
                record.reuser_rejection_reason,
                record.source_confirmed,
                now,
                now,
            ],
        )?;
    }

    Ok(())
}
