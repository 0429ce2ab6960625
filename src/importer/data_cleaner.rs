// ==========================================
// 廢棄物清運聯單管理系統 - 資料清洗器
// ==========================================
// 職責: 複合日期時間欄位拆分（含 12 小時制標記正規化）、
//       日期/時間/重量/布林值的寬鬆解析
// 約束: 單一欄位解析失敗只保留原文，不中斷整批匯入
// ==========================================

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;

/// 複合日期時間欄位與其對應的時間子欄位
///
/// 來源資料常將「日期 時間」寫在日期欄內，需拆分後分別入庫
const DATETIME_FIELDS: [(&str, &str); 6] = [
    ("申報日期", "申報時間"),
    ("清運日期", "清運時間"),
    ("運送日期", "運送時間"),
    ("收受日期", "收受時間"),
    ("回收日期", "回收時間"),
    ("處理完成日期", "處理完成時間"),
];

pub struct DataCleaner;

impl DataCleaner {
    /// 拆分列中的複合日期時間欄位
    ///
    /// 回傳列的複本；任一欄位無法解析時保留該欄原文
    pub fn transform_datetime_fields(
        &self,
        row: &HashMap<String, String>,
    ) -> HashMap<String, String> {
        let mut transformed = row.clone();

        for (date_key, time_key) in DATETIME_FIELDS {
            let Some(value) = row.get(date_key) else { continue };
            let value = value.trim();
            if value.is_empty() || !value.contains(char::is_whitespace) {
                continue;
            }

            // 以第一段空白切開；時間段可能帶 上午/下午/AM/PM 標記
            let Some((date_part, time_part)) = value.split_once(char::is_whitespace) else {
                continue;
            };
            match normalize_time_text(time_part.trim()) {
                Some(time_text) => {
                    transformed.insert(date_key.to_string(), date_part.trim().to_string());
                    transformed.insert(time_key.to_string(), time_text);
                }
                // 解析失敗: 保留原文
                None => continue,
            }
        }

        transformed
    }

    /// 解析日期（YYYY/MM/DD 或 YYYY-MM-DD，容忍帶時間的殘留）
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        for format in ["%Y/%m/%d", "%Y-%m-%d"] {
            if let Ok(date) = NaiveDate::parse_from_str(value, format) {
                return Some(date);
            }
        }
        for format in ["%Y/%m/%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
                return Some(datetime.date());
            }
        }
        None
    }

    /// 解析時間（HH:MM:SS 或 HH:MM）
    pub fn parse_time(&self, value: &str) -> Option<NaiveTime> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        for format in ["%H:%M:%S", "%H:%M"] {
            if let Ok(time) = NaiveTime::parse_from_str(value, format) {
                return Some(time);
            }
        }
        None
    }

    /// 解析日期時間
    pub fn parse_datetime(&self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        for format in [
            "%Y/%m/%d %H:%M:%S",
            "%Y-%m-%d %H:%M:%S",
            "%Y/%m/%d %H:%M",
            "%Y-%m-%d %H:%M",
        ] {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
                return Some(datetime);
            }
        }
        None
    }

    /// 解析重量（失敗回傳 0.0）
    pub fn parse_weight(&self, value: &str) -> f64 {
        value.trim().parse::<f64>().unwrap_or(0.0)
    }

    /// 解析布林旗標（Y / TRUE / 1 視為真，不分大小寫）
    pub fn parse_bool(&self, value: &str) -> bool {
        let upper = value.trim().to_uppercase();
        upper == "Y" || upper == "TRUE" || upper == "1"
    }

    /// 空白字串標準化為 None
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// 將可能帶 12 小時制標記的時間文字正規化為 24 小時制 HH:MM:SS
///
/// 支援的標記: 上午/下午（前綴，zh-TW 慣例）與 AM/PM（前綴或後綴）
fn normalize_time_text(text: &str) -> Option<String> {
    let mut remainder = text.trim();
    let mut meridiem: Option<bool> = None; // Some(true) = 下午

    for (marker, is_pm) in [("上午", false), ("下午", true)] {
        if let Some(stripped) = remainder.strip_prefix(marker) {
            meridiem = Some(is_pm);
            remainder = stripped.trim();
        }
    }
    if meridiem.is_none() {
        let upper = remainder.to_uppercase();
        for (marker, is_pm) in [("AM", false), ("PM", true)] {
            if let Some(stripped) = upper.strip_prefix(marker) {
                meridiem = Some(is_pm);
                remainder = &remainder[remainder.len() - stripped.len()..];
                remainder = remainder.trim();
                break;
            }
            if let Some(stripped) = upper.strip_suffix(marker) {
                meridiem = Some(is_pm);
                remainder = &remainder[..stripped.len()];
                remainder = remainder.trim();
                break;
            }
        }
    }

    let parsed = NaiveTime::parse_from_str(remainder, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(remainder, "%H:%M"))
        .ok()?;

    let time = match meridiem {
        Some(true) => {
            // 下午: 12 時維持不變，其餘加 12
            let hour = parsed.format("%H").to_string().parse::<u32>().ok()?;
            if hour < 12 {
                parsed.overflowing_add_signed(chrono::Duration::hours(12)).0
            } else {
                parsed
            }
        }
        Some(false) => {
            // 上午: 12 時視為 0 時
            let hour = parsed.format("%H").to_string().parse::<u32>().ok()?;
            if hour == 12 {
                parsed.overflowing_sub_signed(chrono::Duration::hours(12)).0
            } else {
                parsed
            }
        }
        None => parsed,
    };

    Some(time.format("%H:%M:%S").to_string())
}
