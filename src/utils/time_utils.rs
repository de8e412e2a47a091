use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// 东八区偏移秒数
pub const BJ_OFFSET_SECONDS: i32 = 8 * 3600;

/// 返回东八区 `FixedOffset` 对象
#[inline]
pub fn bj_offset() -> FixedOffset {
    FixedOffset::east_opt(BJ_OFFSET_SECONDS).expect("Valid offset")
}

/// 当前北京时间 `DateTime<FixedOffset>`
#[inline]
pub fn now_bj() -> DateTime<FixedOffset> {
    Local::now().with_timezone(&bj_offset())
}

/// 将 `DateTime<Utc>` 转换为北京时间
#[inline]
pub fn to_bj(dt: DateTime<Utc>) -> DateTime<FixedOffset> {
    dt.with_timezone(&bj_offset())
}

/// 将任意时区 DateTime 格式化为北京时间字符串
#[inline]
pub fn format_bj<Tz: TimeZone>(dt: DateTime<Tz>, fmt: &str) -> String {
    dt.with_timezone(&bj_offset()).format(fmt).to_string()
}

/// 解析时间戳字符串，兼容导出文件里常见的几种写法
///
/// 依次尝试 RFC3339、`YYYY-MM-DD HH:MM:SS`、`YYYY/MM/DD HH:MM:SS`，
/// 无时区标记的按UTC处理
pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    None
}

/// 将单元格原始值解析为时间戳
///
/// 数值按毫秒时间戳处理，字符串走 [`parse_timestamp_str`]，
/// 解析不了时回退到 `fallback`
pub fn cell_to_timestamp(value: &Value, fallback: DateTime<Utc>) -> DateTime<Utc> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or(fallback),
        Value::String(s) => parse_timestamp_str(s).unwrap_or(fallback),
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_common_formats() {
        assert!(parse_timestamp_str("2025-06-01T08:30:00Z").is_some());
        assert!(parse_timestamp_str("2025-06-01 08:30:00").is_some());
        assert!(parse_timestamp_str("2025/06/01 08:30:00").is_some());
        assert!(parse_timestamp_str("昨天").is_none());
        assert!(parse_timestamp_str("").is_none());
    }

    #[test]
    fn test_cell_to_timestamp_fallback() {
        let fallback = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(cell_to_timestamp(&Value::Null, fallback), fallback);
        assert_eq!(cell_to_timestamp(&json!("not a time"), fallback), fallback);

        let parsed = cell_to_timestamp(&json!("2025-06-01 08:30:00"), fallback);
        assert_eq!(parsed.to_rfc3339(), "2025-06-01T08:30:00+00:00");
    }

    #[test]
    fn test_cell_to_timestamp_millis() {
        let fallback = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let ts = cell_to_timestamp(&json!(1_700_000_000_000i64), fallback);
        assert_eq!(ts.timestamp_millis(), 1_700_000_000_000);
    }
}
