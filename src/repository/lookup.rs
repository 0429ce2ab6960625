// ==========================================
// 廢棄物清運聯單管理系統 - 自然鍵 find-or-create
// ==========================================
// 職責: 參與方主檔的「依自然鍵查找，不存在則建立」通用操作
// 約束: 已存在時直接重用，不回寫屬性（get-or-create 語意）
// ==========================================

use crate::domain::types::{OwnerType, SubstanceType};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::repository::error::RepositoryResult;

/// 一筆待 find-or-create 的主檔描述
///
/// - key_cols: 自然鍵欄位（查找與插入皆使用）
/// - extra_cols: 僅在建立時寫入的其餘欄位
#[derive(Debug)]
pub struct LookupEntity {
    pub table: &'static str,
    pub key_cols: Vec<(&'static str, String)>,
    pub extra_cols: Vec<(&'static str, Option<String>)>,
}

impl LookupEntity {
    pub fn company(company_id: &str, company_name: &str) -> Self {
        Self {
            table: "company",
            key_cols: vec![("company_id", company_id.to_string())],
            extra_cols: vec![("company_name", Some(company_name.to_string()))],
        }
    }

    pub fn process(process_code: &str, process_name: &str) -> Self {
        Self {
            table: "process",
            key_cols: vec![("process_code", process_code.to_string())],
            extra_cols: vec![("process_name", Some(process_name.to_string()))],
        }
    }

    pub fn substance(code: &str, substance_type: SubstanceType, name: &str) -> Self {
        Self {
            table: "waste_substance",
            key_cols: vec![
                ("substance_code", code.to_string()),
                ("substance_type", substance_type.as_str().to_string()),
            ],
            extra_cols: vec![("substance_name", Some(name.to_string()))],
        }
    }

    pub fn carrier(carrier_id: &str, carrier_name: &str) -> Self {
        Self {
            table: "carrier",
            key_cols: vec![("carrier_id", carrier_id.to_string())],
            extra_cols: vec![("carrier_name", Some(carrier_name.to_string()))],
        }
    }

    pub fn processor(processor_id: &str, processor_name: &str) -> Self {
        Self {
            table: "processor",
            key_cols: vec![("processor_id", processor_id.to_string())],
            extra_cols: vec![("processor_name", Some(processor_name.to_string()))],
        }
    }

    pub fn reuser(reuser_id: &str, reuser_name: &str, reuser_nature: Option<&str>) -> Self {
        Self {
            table: "reuser",
            key_cols: vec![("reuser_id", reuser_id.to_string())],
            extra_cols: vec![
                ("reuser_name", Some(reuser_name.to_string())),
                ("reuser_nature", reuser_nature.map(str::to_string)),
            ],
        }
    }

    pub fn vehicle(vehicle_id: &str, owner_id: Option<&str>, owner_type: Option<OwnerType>) -> Self {
        Self {
            table: "vehicle",
            key_cols: vec![("vehicle_id", vehicle_id.to_string())],
            extra_cols: vec![
                ("vehicle_owner_id", owner_id.map(str::to_string)),
                ("owner_type", owner_type.map(|t| t.as_str().to_string())),
            ],
        }
    }
}

/// 依自然鍵查找，不存在則建立，回傳 rowid
///
/// waste_substance 的 substance_id 即 rowid；TEXT 主鍵表的 rowid
/// 僅作為存在性回傳值使用
pub fn find_or_create(conn: &Connection, entity: &LookupEntity) -> RepositoryResult<i64> {
    let key_predicate = entity
        .key_cols
        .iter()
        .map(|(col, _)| format!("{} = ?", col))
        .collect::<Vec<_>>()
        .join(" AND ");

    let select_sql = format!(
        "SELECT rowid FROM {} WHERE {} LIMIT 1",
        entity.table, key_predicate
    );
    let key_values: Vec<Value> = entity
        .key_cols
        .iter()
        .map(|(_, v)| Value::Text(v.clone()))
        .collect();

    let existing: Option<i64> = conn
        .query_row(&select_sql, params_from_iter(key_values.iter()), |row| row.get(0))
        .map(Some)
        .or_else(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    if let Some(rowid) = existing {
        return Ok(rowid);
    }

    let now = Utc::now().to_rfc3339();
    let mut columns: Vec<&str> = entity.key_cols.iter().map(|(col, _)| *col).collect();
    let mut values: Vec<Value> = key_values;
    for (col, value) in &entity.extra_cols {
        columns.push(col);
        values.push(match value {
            Some(v) => Value::Text(v.clone()),
            None => Value::Null,
        });
    }
    columns.push("created_at");
    values.push(Value::Text(now.clone()));
    columns.push("updated_at");
    values.push(Value::Text(now));

    let placeholders = vec!["?"; columns.len()].join(", ");
    let insert_sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        entity.table,
        columns.join(", "),
        placeholders
    );
    conn.execute(&insert_sql, params_from_iter(values.iter()))?;

    Ok(conn.last_insert_rowid())
}
