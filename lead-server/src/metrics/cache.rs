//! Version-stamped aggregate cache
//!
//! 聚合结果按 (作用域, 日期范围) 缓存，条目记下计算时的集合版本号。
//! 变更只推进版本号，过期条目在下一次读取时重算，符合
//! recompute-on-next-read 的失效契约。

use super::DashboardMetrics;
use super::staff::StaffPerformanceRow;
use super::trend::TrendPoint;
use crate::auth::LeadScope;
use crate::utils::time::DateRange;
use dashmap::DashMap;

/// Collection versions an entry was computed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Versions {
    pub lead: u64,
    pub expense: u64,
}

/// Shared cache key for one scope and range
pub fn range_key(scope: &LeadScope, range: DateRange) -> String {
    format!("{}|{}|{}", scope.cache_key(), range.from, range.to)
}

#[derive(Debug, Default)]
pub struct MetricsCache {
    dashboard: DashMap<String, (Versions, DashboardMetrics)>,
    // Staff and trend aggregates read no expenses, they stamp lead versions only
    staff: DashMap<String, (u64, Vec<StaffPerformanceRow>)>,
    trend: DashMap<String, (u64, Vec<TrendPoint>)>,
}

impl MetricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_dashboard(&self, key: &str, current: Versions) -> Option<DashboardMetrics> {
        self.dashboard
            .get(key)
            .filter(|entry| entry.0 == current)
            .map(|entry| entry.1.clone())
    }

    pub fn put_dashboard(&self, key: String, versions: Versions, value: DashboardMetrics) {
        self.dashboard.insert(key, (versions, value));
    }

    pub fn get_staff(&self, key: &str, lead_version: u64) -> Option<Vec<StaffPerformanceRow>> {
        self.staff
            .get(key)
            .filter(|entry| entry.0 == lead_version)
            .map(|entry| entry.1.clone())
    }

    pub fn put_staff(&self, key: String, lead_version: u64, rows: Vec<StaffPerformanceRow>) {
        self.staff.insert(key, (lead_version, rows));
    }

    pub fn get_trend(&self, key: &str, lead_version: u64) -> Option<Vec<TrendPoint>> {
        self.trend
            .get(key)
            .filter(|entry| entry.0 == lead_version)
            .map(|entry| entry.1.clone())
    }

    pub fn put_trend(&self, key: String, lead_version: u64, points: Vec<TrendPoint>) {
        self.trend.insert(key, (lead_version, points));
    }

    /// Drop entries computed at older versions. Reads stay correct without
    /// this (the version check rejects stale entries), it only bounds memory.
    pub fn evict_stale(&self, current: Versions) {
        self.dashboard.retain(|_, entry| entry.0 == current);
        self.staff.retain(|_, entry| entry.0 == current.lead);
        self.trend.retain(|_, entry| entry.0 == current.lead);
    }

    pub fn len(&self) -> usize {
        self.dashboard.len() + self.staff.len() + self.trend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
