// ==========================================
// 廢棄物清運聯單管理系統 - 匯入衝突預掃描
// ==========================================
// 職責: 偵測上傳列與既有「可見」聯單的 (聯單編號, 廢棄物ID) 鍵碰撞
// 約束: 預掃描只讀不寫；衝突時回傳既有記錄欄位值供呼叫端比對
// ==========================================

use crate::domain::types::ManifestType;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::columns;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// 一筆衝突: 上傳列 + 既有可見記錄的欄位值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub manifest_id: String,
    pub waste_id: String,
    pub company_name: String,
    pub report_date: String,
    /// 上傳列的非空欄位
    pub new_data: BTreeMap<String, String>,
    /// 既有可見記錄的欄位值（欄名與上傳檔一致）
    pub existing_data: BTreeMap<String, String>,
}

/// 既有記錄的查詢投影
struct ExistingManifest {
    manifest_type: String,
    company_id: String,
    company_name: String,
    report_date: Option<chrono::NaiveDate>,
    reported_weight: Option<f64>,
    waste_code: Option<String>,
    waste_name: Option<String>,
    substance_code: Option<String>,
    substance_name: Option<String>,
}

pub struct ConflictScanner {
    conn: Arc<Mutex<Connection>>,
}

impl ConflictScanner {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 掃描所有帶識別鍵的列，回傳鍵碰撞清單（保持輸入順序）
    pub fn scan(&self, rows: &[HashMap<String, String>]) -> ImportResult<Vec<ConflictRecord>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::LockError(e.to_string()))?;

        let mut conflicts = Vec::new();
        for row in rows {
            let manifest_id = row.get(columns::MANIFEST_ID).map(String::as_str).unwrap_or("");
            let waste_id = row.get(columns::WASTE_ID).map(String::as_str).unwrap_or("");
            if manifest_id.is_empty() || waste_id.is_empty() {
                continue;
            }

            let existing = query_existing(&conn, manifest_id, waste_id)?;
            let Some(existing) = existing else { continue };

            let new_data: BTreeMap<String, String> = row
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            conflicts.push(ConflictRecord {
                manifest_id: manifest_id.to_string(),
                waste_id: waste_id.to_string(),
                company_name: row
                    .get(columns::COMPANY_NAME)
                    .cloned()
                    .unwrap_or_default(),
                report_date: row.get(columns::REPORT_DATE).cloned().unwrap_or_default(),
                new_data,
                existing_data: existing_data_map(manifest_id, waste_id, &existing),
            });
        }

        Ok(conflicts)
    }
}

fn query_existing(
    conn: &Connection,
    manifest_id: &str,
    waste_id: &str,
) -> ImportResult<Option<ExistingManifest>> {
    let existing = conn
        .query_row(
            "SELECT m.manifest_type, m.company_id, c.company_name, \
             r.report_date, r.reported_weight, \
             dd.waste_code, dd.waste_name, rd.substance_code, rd.substance_name \
             FROM manifest m \
             JOIN company c ON c.company_id = m.company_id \
             LEFT JOIN report r ON r.manifest_ref = m.id \
             LEFT JOIN disposal_data dd ON dd.manifest_ref = m.id \
             LEFT JOIN reuse_data rd ON rd.manifest_ref = m.id \
             WHERE m.manifest_id = ?1 AND m.waste_id = ?2 AND m.is_visible = 1 \
             LIMIT 1",
            params![manifest_id, waste_id],
            |row| {
                Ok(ExistingManifest {
                    manifest_type: row.get(0)?,
                    company_id: row.get(1)?,
                    company_name: row.get(2)?,
                    report_date: row.get(3)?,
                    reported_weight: row.get(4)?,
                    waste_code: row.get(5)?,
                    waste_name: row.get(6)?,
                    substance_code: row.get(7)?,
                    substance_name: row.get(8)?,
                })
            },
        )
        .optional()?;
    Ok(existing)
}

/// 組裝既有記錄的對照欄位（欄名依聯單類型選用）
fn existing_data_map(
    manifest_id: &str,
    waste_id: &str,
    existing: &ExistingManifest,
) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();
    data.insert(columns::MANIFEST_ID.to_string(), manifest_id.to_string());
    data.insert(columns::WASTE_ID.to_string(), waste_id.to_string());
    data.insert(columns::COMPANY_ID.to_string(), existing.company_id.clone());
    data.insert(
        columns::COMPANY_NAME.to_string(),
        existing.company_name.clone(),
    );
    data.insert(
        columns::REPORT_DATE.to_string(),
        existing
            .report_date
            .map(|d| d.format("%Y/%m/%d").to_string())
            .unwrap_or_default(),
    );
    data.insert(
        columns::REPORTED_WEIGHT.to_string(),
        existing
            .reported_weight
            .map(|w| w.to_string())
            .unwrap_or_default(),
    );

    if existing.manifest_type == ManifestType::Disposal.as_str() {
        data.insert(
            columns::WASTE_CODE.to_string(),
            existing.waste_code.clone().unwrap_or_default(),
        );
        data.insert(
            columns::WASTE_NAME.to_string(),
            existing.waste_name.clone().unwrap_or_default(),
        );
    } else {
        data.insert(
            columns::SUBSTANCE_CODE.to_string(),
            existing.substance_code.clone().unwrap_or_default(),
        );
        data.insert(
            columns::SUBSTANCE_NAME.to_string(),
            existing.substance_name.clone().unwrap_or_default(),
        );
    }

    data
}
