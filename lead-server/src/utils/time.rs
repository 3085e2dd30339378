//! 时间工具函数
//!
//! 所有日期→时间戳转换统一在 API handler 层完成，
//! repository 层只接收 `i64` Unix millis。
//!
//! 约定：
//! - 聚合区间边界使用带时区的瞬时值 (RFC 3339)，避免午夜边界差一天
//! - 支出业务日期使用 "YYYY-MM-DD" 字符串，字典序即时间序

use chrono::{DateTime, NaiveDate, Utc};

use super::{AppError, AppResult};

/// 当前 Unix 时间戳 (毫秒)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 解析 RFC 3339 瞬时值 → Unix millis
///
/// 拒绝裸日期 ("2025-03-01")：区间边界必须带时区。
pub fn parse_instant(value: &str) -> AppResult<i64> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp_millis())
        .map_err(|_| {
            AppError::validation(format!(
                "Invalid instant '{}', expected RFC 3339 (e.g. 2025-03-01T00:00:00Z)",
                value
            ))
        })
}

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// Unix millis → UTC 日历日 ("YYYY-MM-DD")
pub fn day_key(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "1970-01-01".to_string())
}

/// 闭区间日期范围，应用于 lead 的创建时间戳
///
/// 不变量: `from <= to`，构造时校验。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// 区间起点 (含)，Unix millis
    pub from: i64,
    /// 区间终点 (含)，Unix millis
    pub to: i64,
}

impl DateRange {
    /// 从毫秒边界构造，校验 `from <= to`
    pub fn new(from: i64, to: i64) -> AppResult<Self> {
        if from > to {
            return Err(AppError::validation(format!(
                "Invalid date range: from ({}) is after to ({})",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// 从 RFC 3339 字符串边界构造
    pub fn parse(from: &str, to: &str) -> AppResult<Self> {
        Self::new(parse_instant(from)?, parse_instant(to)?)
    }

    /// 时间戳是否落在区间内
    pub fn contains(&self, millis: i64) -> bool {
        millis >= self.from && millis <= self.to
    }

    /// 区间起点所在的 UTC 日历日
    pub fn from_day(&self) -> String {
        day_key(self.from)
    }

    /// 区间终点所在的 UTC 日历日
    pub fn to_day(&self) -> String {
        day_key(self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_instants() {
        let millis = parse_instant("2025-03-01T00:00:00Z").expect("valid instant");
        assert_eq!(day_key(millis), "2025-03-01");

        // Offset-aware instants land on the correct UTC day
        let late = parse_instant("2025-03-01T23:30:00-02:00").expect("valid instant");
        assert_eq!(day_key(late), "2025-03-02");
    }

    #[test]
    fn rejects_bare_dates_and_garbage() {
        assert!(parse_instant("2025-03-01").is_err());
        assert!(parse_instant("yesterday").is_err());
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let from = parse_instant("2025-03-02T00:00:00Z").unwrap();
        let to = parse_instant("2025-03-01T00:00:00Z").unwrap();
        assert!(DateRange::new(from, to).is_err());
        assert!(DateRange::new(to, from).is_ok());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = DateRange::parse("2025-03-01T00:00:00Z", "2025-03-31T23:59:59Z").unwrap();
        assert!(range.contains(range.from));
        assert!(range.contains(range.to));
        assert!(!range.contains(range.from - 1));
        assert!(!range.contains(range.to + 1));
    }
}
