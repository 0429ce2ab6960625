// ==========================================
// 廢棄物清運聯單管理系統 - 聯單倉儲
// ==========================================
// 職責: 聯單清單/明細/批量標記不可見/自動完成等資料存取
// 紅線: Repository 不含業務規則，只做資料 CRUD
// ==========================================

use crate::domain::manifest::{
    DisposalManifestData, Manifest, ManifestKey, Processing, Recycling, Report, ReuseManifestData,
    Transport,
};
use crate::domain::types::ManifestType;
use crate::query::filter::{ManifestFilter, PAGE_SIZE};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// 清單/匯出共用的查詢主體
const FROM_CLAUSE: &str = "FROM manifest m \
     JOIN company c ON c.company_id = m.company_id \
     LEFT JOIN report r ON r.manifest_ref = m.id \
     LEFT JOIN disposal_data dd ON dd.manifest_ref = m.id \
     LEFT JOIN reuse_data rd ON rd.manifest_ref = m.id";

/// 清單列摘要
#[derive(Debug, Clone, Serialize)]
pub struct ManifestSummary {
    pub manifest_type: ManifestType,
    pub type_display: &'static str,
    pub manifest_id: String,
    pub waste_id: String,
    pub company_name: String,
    pub report_date: Option<NaiveDate>,
    pub waste_code: Option<String>,
    pub waste_name: Option<String>,
    pub reported_weight: f64,
    pub manifest_confirmation: bool,
}

/// 分頁清單結果
#[derive(Debug, Clone, Serialize)]
pub struct ManifestPage {
    pub items: Vec<ManifestSummary>,
    pub total_count: i64,
    pub disposal_count: i64,
    pub reuse_count: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// 聯單明細（含各階段子記錄與參與方名稱）
#[derive(Debug, Clone, Serialize)]
pub struct ManifestDetail {
    pub manifest: Manifest,
    pub company_name: String,
    pub process_name: String,
    pub report: Option<Report>,
    pub transport: Option<Transport>,
    pub carrier_name: Option<String>,
    pub processing: Option<Processing>,
    pub processor_name: Option<String>,
    pub recycling: Option<Recycling>,
    pub reuser_name: Option<String>,
    pub disposal_data: Option<DisposalManifestData>,
    pub reuse_data: Option<ReuseManifestData>,
}

/// CSV 匯出列（欄位與清單頁一致）
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub manifest_type: ManifestType,
    pub manifest_id: String,
    pub waste_id: String,
    pub company_id: String,
    pub company_name: String,
    pub report_date: Option<NaiveDate>,
    pub report_time: Option<chrono::NaiveTime>,
    pub waste_code: Option<String>,
    pub waste_name: Option<String>,
    pub reported_weight: f64,
    pub manifest_confirmation: bool,
}

/// 聯單倉儲
pub struct ManifestRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ManifestRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 分頁查詢可見聯單（依申報日期新到舊）
    pub fn list_manifests(
        &self,
        filter: &ManifestFilter,
        page: u32,
    ) -> RepositoryResult<ManifestPage> {
        let conn = self.lock()?;
        let (where_clause, params_values) = filter.build_where();

        // 統計總數與各類型筆數
        let count_sql = format!(
            "SELECT COUNT(*), \
             COALESCE(SUM(CASE WHEN m.manifest_type = 'disposal' THEN 1 ELSE 0 END), 0), \
             COALESCE(SUM(CASE WHEN m.manifest_type = 'reuse' THEN 1 ELSE 0 END), 0) \
             {} WHERE {}",
            FROM_CLAUSE, where_clause
        );
        let (total_count, disposal_count, reuse_count) = conn.query_row(
            &count_sql,
            params_from_iter(params_values.iter()),
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?)),
        )?;

        let page = page.max(1);
        let offset = (page - 1) * PAGE_SIZE;
        let list_sql = format!(
            "SELECT m.manifest_type, m.manifest_id, m.waste_id, c.company_name, \
             r.report_date, \
             COALESCE(dd.waste_code, rd.substance_code), \
             COALESCE(dd.waste_name, rd.substance_name), \
             COALESCE(r.reported_weight, 0), m.manifest_confirmation \
             {} WHERE {} ORDER BY r.report_date DESC LIMIT ? OFFSET ?",
            FROM_CLAUSE, where_clause
        );

        let mut all_params: Vec<Value> = params_values;
        all_params.push(Value::Integer(i64::from(PAGE_SIZE)));
        all_params.push(Value::Integer(i64::from(offset)));

        let mut stmt = conn.prepare(&list_sql)?;
        let items = stmt
            .query_map(params_from_iter(all_params.iter()), map_summary_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let total_pages = ((total_count as u32) + PAGE_SIZE - 1) / PAGE_SIZE;

        Ok(ManifestPage {
            items,
            total_count,
            disposal_count,
            reuse_count,
            page,
            page_size: PAGE_SIZE,
            total_pages,
        })
    }

    /// 取得所有符合條件的識別三元組（全選功能，不分頁）
    pub fn all_manifest_ids(&self, filter: &ManifestFilter) -> RepositoryResult<Vec<ManifestKey>> {
        let conn = self.lock()?;
        let (where_clause, params_values) = filter.build_where();

        let sql = format!(
            "SELECT m.manifest_type, m.manifest_id, m.waste_id {} WHERE {} \
             ORDER BY r.report_date DESC",
            FROM_CLAUSE, where_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let keys = stmt
            .query_map(params_from_iter(params_values.iter()), |row| {
                let type_raw: String = row.get(0)?;
                Ok((type_raw, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(type_raw, manifest_id, waste_id)| ManifestKey {
                manifest_type: parse_manifest_type(&type_raw),
                manifest_id,
                waste_id,
            })
            .collect();

        Ok(keys)
    }

    /// 依 (類型, 聯單編號, 廢棄物ID) 取得可見聯單明細
    pub fn get_detail(
        &self,
        manifest_type: ManifestType,
        manifest_id: &str,
        waste_id: &str,
    ) -> RepositoryResult<Option<ManifestDetail>> {
        let conn = self.lock()?;

        let header = conn
            .query_row(
                "SELECT m.id, m.manifest_id, m.waste_id, m.manifest_type, m.company_id, \
                 m.process_code, m.from_storage, m.origin_location, m.manifest_confirmation, \
                 m.is_visible, m.created_at, m.updated_at, c.company_name, p.process_name \
                 FROM manifest m \
                 JOIN company c ON c.company_id = m.company_id \
                 JOIN process p ON p.process_code = m.process_code \
                 WHERE m.manifest_id = ?1 AND m.waste_id = ?2 \
                   AND m.manifest_type = ?3 AND m.is_visible = 1 \
                 LIMIT 1",
                params![manifest_id, waste_id, manifest_type.as_str()],
                |row| {
                    Ok((
                        Manifest {
                            id: row.get(0)?,
                            manifest_id: row.get(1)?,
                            waste_id: row.get(2)?,
                            manifest_type: parse_manifest_type(&row.get::<_, String>(3)?),
                            company_id: row.get(4)?,
                            process_code: row.get(5)?,
                            from_storage: row.get(6)?,
                            origin_location: row.get(7)?,
                            manifest_confirmation: row.get(8)?,
                            is_visible: row.get(9)?,
                            created_at: row.get(10)?,
                            updated_at: row.get(11)?,
                        },
                        row.get::<_, String>(12)?,
                        row.get::<_, String>(13)?,
                    ))
                },
            )
            .optional()?;

        let (manifest, company_name, process_name) = match header {
            Some(found) => found,
            None => return Ok(None),
        };
        let manifest_ref = manifest.id;

        let report = conn
            .query_row(
                "SELECT report_id, manifest_ref, report_date, report_time, transport_date, \
                 transport_time, reported_weight, created_at, updated_at \
                 FROM report WHERE manifest_ref = ?1",
                params![manifest_ref],
                |row| {
                    Ok(Report {
                        report_id: row.get(0)?,
                        manifest_ref: row.get(1)?,
                        report_date: row.get(2)?,
                        report_time: row.get(3)?,
                        transport_date: row.get(4)?,
                        transport_time: row.get(5)?,
                        reported_weight: row.get(6)?,
                        created_at: row.get(7)?,
                        updated_at: row.get(8)?,
                    })
                },
            )
            .optional()?;

        let transport_row = conn
            .query_row(
                "SELECT t.transport_id, t.manifest_ref, t.carrier_id, t.vehicle_id, \
                 t.delivery_date, t.delivery_time, t.carrier_vehicle_number, \
                 t.carrier_confirmation, t.carrier_rejection_reason, t.created_at, t.updated_at, \
                 ca.carrier_name \
                 FROM transport t JOIN carrier ca ON ca.carrier_id = t.carrier_id \
                 WHERE t.manifest_ref = ?1",
                params![manifest_ref],
                |row| {
                    Ok((
                        Transport {
                            transport_id: row.get(0)?,
                            manifest_ref: row.get(1)?,
                            carrier_id: row.get(2)?,
                            vehicle_id: row.get(3)?,
                            delivery_date: row.get(4)?,
                            delivery_time: row.get(5)?,
                            carrier_vehicle_number: row.get(6)?,
                            carrier_confirmation: row.get(7)?,
                            carrier_rejection_reason: row.get(8)?,
                            created_at: row.get(9)?,
                            updated_at: row.get(10)?,
                        },
                        row.get::<_, String>(11)?,
                    ))
                },
            )
            .optional()?;
        let (transport, carrier_name) = match transport_row {
            Some((t, name)) => (Some(t), Some(name)),
            None => (None, None),
        };

        let processing_row = conn
            .query_row(
                "SELECT p.processing_id, p.manifest_ref, p.processor_id, p.receive_date, \
                 p.receive_time, p.intermediate_treatment, p.processing_completion_date, \
                 p.processing_completion_time, p.final_disposal_method, p.processor_confirmation, \
                 p.processor_vehicle, p.final_processor_id, p.final_processor_name, p.entry_date, \
                 p.entry_time, p.entry_number, p.final_processor_confirmation, p.final_destination, \
                 p.created_at, p.updated_at, pr.processor_name \
                 FROM processing p JOIN processor pr ON pr.processor_id = p.processor_id \
                 WHERE p.manifest_ref = ?1",
                params![manifest_ref],
                |row| {
                    Ok((
                        Processing {
                            processing_id: row.get(0)?,
                            manifest_ref: row.get(1)?,
                            processor_id: row.get(2)?,
                            receive_date: row.get(3)?,
                            receive_time: row.get(4)?,
                            intermediate_treatment: row.get(5)?,
                            processing_completion_date: row.get(6)?,
                            processing_completion_time: row.get(7)?,
                            final_disposal_method: row.get(8)?,
                            processor_confirmation: row.get(9)?,
                            processor_vehicle: row.get(10)?,
                            final_processor_id: row.get(11)?,
                            final_processor_name: row.get(12)?,
                            entry_date: row.get(13)?,
                            entry_time: row.get(14)?,
                            entry_number: row.get(15)?,
                            final_processor_confirmation: row.get(16)?,
                            final_destination: row.get(17)?,
                            created_at: row.get(18)?,
                            updated_at: row.get(19)?,
                        },
                        row.get::<_, String>(20)?,
                    ))
                },
            )
            .optional()?;
        let (processing, processor_name) = match processing_row {
            Some((p, name)) => (Some(p), Some(name)),
            None => (None, None),
        };

        let recycling_row = conn
            .query_row(
                "SELECT rc.recycling_id, rc.manifest_ref, rc.reuser_id, rc.recovery_date, \
                 rc.recovery_time, rc.reuse_purpose, rc.reuse_purpose_description, rc.reuse_method, \
                 rc.reuse_completion_time, rc.reuser_confirmation, rc.reuser_vehicle, \
                 rc.reuser_rejection_reason, rc.source_confirmed, rc.created_at, rc.updated_at, \
                 ru.reuser_name \
                 FROM recycling rc JOIN reuser ru ON ru.reuser_id = rc.reuser_id \
                 WHERE rc.manifest_ref = ?1",
                params![manifest_ref],
                |row| {
                    Ok((
                        Recycling {
                            recycling_id: row.get(0)?,
                            manifest_ref: row.get(1)?,
                            reuser_id: row.get(2)?,
                            recovery_date: row.get(3)?,
                            recovery_time: row.get(4)?,
                            reuse_purpose: row.get(5)?,
                            reuse_purpose_description: row.get(6)?,
                            reuse_method: row.get(7)?,
                            reuse_completion_time: row.get(8)?,
                            reuser_confirmation: row.get(9)?,
                            reuser_vehicle: row.get(10)?,
                            reuser_rejection_reason: row.get(11)?,
                            source_confirmed: row.get(12)?,
                            created_at: row.get(13)?,
                            updated_at: row.get(14)?,
                        },
                        row.get::<_, String>(15)?,
                    ))
                },
            )
            .optional()?;
        let (recycling, reuser_name) = match recycling_row {
            Some((r, name)) => (Some(r), Some(name)),
            None => (None, None),
        };

        let disposal_data = conn
            .query_row(
                "SELECT manifest_ref, substance_id, waste_code, waste_name, created_at, updated_at \
                 FROM disposal_data WHERE manifest_ref = ?1",
                params![manifest_ref],
                |row| {
                    Ok(DisposalManifestData {
                        manifest_ref: row.get(0)?,
                        substance_id: row.get(1)?,
                        waste_code: row.get(2)?,
                        waste_name: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            )
            .optional()?;

        let reuse_data = conn
            .query_row(
                "SELECT manifest_ref, substance_id, substance_code, substance_name, created_at, \
                 updated_at FROM reuse_data WHERE manifest_ref = ?1",
                params![manifest_ref],
                |row| {
                    Ok(ReuseManifestData {
                        manifest_ref: row.get(0)?,
                        substance_id: row.get(1)?,
                        substance_code: row.get(2)?,
                        substance_name: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            )
            .optional()?;

        Ok(Some(ManifestDetail {
            manifest,
            company_name,
            process_name,
            report,
            transport,
            carrier_name,
            processing,
            processor_name,
            recycling,
            reuser_name,
            disposal_data,
            reuse_data,
        }))
    }

    /// 批量標記聯單為不可見（軟刪除）
    ///
    /// 已不可見的鍵不影響任何列（冪等），回傳實際標記筆數
    pub fn soft_delete_many(&self, keys: &[ManifestKey]) -> RepositoryResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        let mut deleted = 0usize;
        for key in keys {
            deleted += tx.execute(
                "UPDATE manifest SET is_visible = 0, updated_at = ?1 \
                 WHERE manifest_id = ?2 AND waste_id = ?3 AND manifest_type = ?4 \
                   AND is_visible = 1",
                params![now, key.manifest_id, key.waste_id, key.manifest_type.as_str()],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(deleted)
    }

    /// 自動完成: 事業機構名稱（不分大小寫子字串，至多 20 筆）
    pub fn autocomplete_company_names(&self, query: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT company_name FROM company \
             WHERE lower(company_name) LIKE '%' || lower(?1) || '%' \
             ORDER BY company_name LIMIT 20",
        )?;
        let names = stmt
            .query_map(params![query], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// 自動完成: 廢棄物/物質名稱
    pub fn autocomplete_substance_names(&self, query: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT substance_name FROM waste_substance \
             WHERE lower(substance_name) LIKE '%' || lower(?1) || '%' \
             ORDER BY substance_name LIMIT 20",
        )?;
        let names = stmt
            .query_map(params![query], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// 自動完成: 廢棄物/物質代碼
    pub fn autocomplete_substance_codes(&self, query: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT substance_code FROM waste_substance \
             WHERE lower(substance_code) LIKE '%' || lower(?1) || '%' \
             ORDER BY substance_code LIMIT 20",
        )?;
        let codes = stmt
            .query_map(params![query], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(codes)
    }

    /// 匯出查詢（與清單同一篩選形狀，不分頁）
    pub fn export_rows(&self, filter: &ManifestFilter) -> RepositoryResult<Vec<ExportRow>> {
        let conn = self.lock()?;
        let (where_clause, params_values) = filter.build_where();

        let sql = format!(
            "SELECT m.manifest_type, m.manifest_id, m.waste_id, m.company_id, c.company_name, \
             r.report_date, r.report_time, \
             COALESCE(dd.waste_code, rd.substance_code), \
             COALESCE(dd.waste_name, rd.substance_name), \
             COALESCE(r.reported_weight, 0), m.manifest_confirmation \
             {} WHERE {} ORDER BY r.report_date DESC",
            FROM_CLAUSE, where_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params_values.iter()), |row| {
                let type_raw: String = row.get(0)?;
                Ok(ExportRow {
                    manifest_type: parse_manifest_type(&type_raw),
                    manifest_id: row.get(1)?,
                    waste_id: row.get(2)?,
                    company_id: row.get(3)?,
                    company_name: row.get(4)?,
                    report_date: row.get(5)?,
                    report_time: row.get(6)?,
                    waste_code: row.get(7)?,
                    waste_name: row.get(8)?,
                    reported_weight: row.get(9)?,
                    manifest_confirmation: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn map_summary_row(row: &Row<'_>) -> rusqlite::Result<ManifestSummary> {
    let type_raw: String = row.get(0)?;
    let manifest_type = parse_manifest_type(&type_raw);
    Ok(ManifestSummary {
        manifest_type,
        type_display: manifest_type.display_name(),
        manifest_id: row.get(1)?,
        waste_id: row.get(2)?,
        company_name: row.get(3)?,
        report_date: row.get(4)?,
        waste_code: row.get(5)?,
        waste_name: row.get(6)?,
        reported_weight: row.get(7)?,
        manifest_confirmation: row.get(8)?,
    })
}

// CHECK 約束保證資料表內只有合法值；解析失敗視為清除單以避免讀取中斷
fn parse_manifest_type(raw: &str) -> ManifestType {
    ManifestType::from_str(raw).unwrap_or(ManifestType::Disposal)
}
