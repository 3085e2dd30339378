//! Daily lead trend over a date range

use crate::db::models::LeadSnapshot;
use crate::utils::time::{self, DateRange};
use serde::Serialize;
use std::collections::HashMap;

const DAY_MILLIS: i64 = 86_400_000;

/// One UTC day on the trend chart. Days with no leads still appear,
/// the chart axis is continuous.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// "YYYY-MM-DD"
    pub date: String,
    pub total_leads: usize,
}

/// Bucket pre-scoped snapshots by creation day, zero-filling empty days.
pub fn compute_lead_trend(leads: &[LeadSnapshot], range: DateRange) -> Vec<TrendPoint> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for lead in leads {
        *counts.entry(time::day_key(lead.created_at)).or_default() += 1;
    }

    let mut points = Vec::new();
    // Floor to UTC midnight, then walk whole days across the range
    let mut day_start = range.from - range.from.rem_euclid(DAY_MILLIS);
    while day_start <= range.to {
        let date = time::day_key(day_start);
        let total_leads = counts.get(&date).copied().unwrap_or_default();
        points.push(TrendPoint { date, total_leads });
        day_start += DAY_MILLIS;
    }
    points
}
