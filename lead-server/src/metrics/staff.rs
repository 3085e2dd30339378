//! Per-staff performance aggregation

use super::percentage;
use crate::db::models::{LeadSnapshot, SurveyStatus};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

/// Which attribution column performance rows group by.
/// 部署级配置 (STAFF_GROUPING)，调用方不能自行切换。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaffGrouping {
    #[default]
    FieldRep,
    AccountManager,
}

impl StaffGrouping {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffGrouping::FieldRep => "field_rep",
            StaffGrouping::AccountManager => "account_manager",
        }
    }
}

impl FromStr for StaffGrouping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "field_rep" => Ok(StaffGrouping::FieldRep),
            "account_manager" => Ok(StaffGrouping::AccountManager),
            _ => Err(format!("unknown staff grouping: {}", s)),
        }
    }
}

/// One staff member's counts over the scoped, date-filtered lead set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffPerformanceRow {
    pub staff_name: String,
    pub total_leads: usize,
    pub good_surveys: usize,
    pub bad_surveys: usize,
    pub sold_surveys: usize,
    pub conversion_rate: f64,
}

#[derive(Default)]
struct Bucket {
    total: usize,
    good: usize,
    bad: usize,
    sold: usize,
}

/// Group pre-scoped snapshots by the configured attribution column.
/// Leads with a blank attribution name are skipped; every returned row has
/// at least one lead. Row order is unspecified, consumers sort.
pub fn compute_staff_performance(
    leads: &[LeadSnapshot],
    grouping: StaffGrouping,
) -> Vec<StaffPerformanceRow> {
    let mut buckets: HashMap<&str, Bucket> = HashMap::new();

    for lead in leads {
        let name = match grouping {
            StaffGrouping::FieldRep => lead.field_rep.as_deref(),
            StaffGrouping::AccountManager => lead.account_manager.as_deref(),
        };
        let Some(name) = name else { continue };
        if name.trim().is_empty() {
            continue;
        }

        let bucket = buckets.entry(name).or_default();
        bucket.total += 1;
        match lead.effective_survey_status() {
            Some(SurveyStatus::Good) => bucket.good += 1,
            Some(SurveyStatus::Bad) => bucket.bad += 1,
            Some(SurveyStatus::Sold) => bucket.sold += 1,
            Some(SurveyStatus::Pending) | None => {}
        }
    }

    buckets
        .into_iter()
        .map(|(name, bucket)| StaffPerformanceRow {
            staff_name: name.to_string(),
            total_leads: bucket.total,
            good_surveys: bucket.good,
            bad_surveys: bucket.bad,
            sold_surveys: bucket.sold,
            conversion_rate: percentage(bucket.sold, bucket.total),
        })
        .collect()
}
