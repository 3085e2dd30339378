//! Metrics aggregation using rust_decimal for precision
//!
//! Pure functions over lead and expense snapshots. Scope and date filtering
//! happen in the repository; nothing here looks at roles. All money and
//! percentage arithmetic is done with `Decimal` internally, then converted
//! to `f64` for serialization.

pub mod cache;
pub mod staff;
pub mod trend;

pub use cache::{MetricsCache, Versions, range_key};
pub use staff::{StaffGrouping, StaffPerformanceRow, compute_staff_performance};
pub use trend::{TrendPoint, compute_lead_trend};

#[cfg(test)]
mod tests;

use crate::db::models::{ExpenseSnapshot, LeadSnapshot, LeadSource, SurveyStatus};
use rust_decimal::prelude::*;
use serde::Serialize;

/// Rounding for monetary values and percentages (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert f64 to Decimal for calculations
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 rounded to 2 decimal places
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        // SAFETY: Decimal rounded to 2dp is always within f64 representable range
        .expect("Decimal rounded to 2dp is always representable as f64")
}

/// numerator / denominator * 100, 0 when the denominator is 0
fn percentage(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let ratio =
        Decimal::from(numerator as u64) * Decimal::from(100) / Decimal::from(denominator as u64);
    to_f64(ratio)
}

/// amount / count, 0 when count is 0
fn per_unit(amount: Decimal, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    to_f64(amount / Decimal::from(count as u64))
}

/// Check the expense amount invariants: every amount finite and
/// non-negative, and the online/field split summing to the total.
pub fn validate_expense_split(total: f64, online: f64, field: f64) -> Result<(), String> {
    for (name, value) in [
        ("total_amount", total),
        ("online_amount", online),
        ("field_amount", field),
    ] {
        if !value.is_finite() {
            return Err(format!("{} must be a finite number, got {}", name, value));
        }
        if value < 0.0 {
            return Err(format!("{} must be non-negative, got {}", name, value));
        }
    }

    let difference = (to_decimal(online) + to_decimal(field) - to_decimal(total)).abs();
    if difference > MONEY_TOLERANCE {
        return Err(format!(
            "online_amount + field_amount must equal total_amount (difference {})",
            difference
        ));
    }
    Ok(())
}

/// Dashboard funnel counts, conversion percentages and cost-per-lead split
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total_leads: usize,
    pub surveys_booked: usize,
    pub pending_surveys: usize,
    pub good_surveys: usize,
    pub bad_surveys: usize,
    pub sold_surveys: usize,
    pub conversion_leads_to_surveys: f64,
    pub conversion_leads_to_sold: f64,
    pub online_leads: usize,
    pub field_leads: usize,
    pub total_online_expenses: f64,
    pub total_field_expenses: f64,
    pub total_expenses: f64,
    pub cost_per_lead_online: f64,
    pub cost_per_lead_field: f64,
    pub cost_per_lead: f64,
    pub total_lead_cost: f64,
}

/// Aggregate the dashboard metrics over pre-scoped, pre-date-filtered
/// snapshots. An empty lead set yields a fully zeroed result, not an error.
pub fn compute_dashboard_metrics(
    leads: &[LeadSnapshot],
    expenses: &[ExpenseSnapshot],
) -> DashboardMetrics {
    let total_leads = leads.len();

    let mut surveys_booked = 0;
    let mut pending_surveys = 0;
    let mut good_surveys = 0;
    let mut bad_surveys = 0;
    let mut sold_surveys = 0;
    let mut online_leads = 0;
    let mut field_leads = 0;
    let mut total_lead_cost = Decimal::ZERO;

    for lead in leads {
        // The four outcome buckets partition the surveyed subset
        if let Some(status) = lead.effective_survey_status() {
            surveys_booked += 1;
            match status {
                SurveyStatus::Pending => pending_surveys += 1,
                SurveyStatus::Good => good_surveys += 1,
                SurveyStatus::Bad => bad_surveys += 1,
                SurveyStatus::Sold => sold_surveys += 1,
            }
        }
        match lead.lead_source {
            Some(LeadSource::Online) => online_leads += 1,
            Some(LeadSource::Field) => field_leads += 1,
            None => {}
        }
        if let Some(cost) = lead.lead_cost {
            total_lead_cost += to_decimal(cost);
        }
    }

    let total_online_expenses: Decimal = expenses.iter().map(|e| to_decimal(e.online_amount)).sum();
    let total_field_expenses: Decimal = expenses.iter().map(|e| to_decimal(e.field_amount)).sum();
    let total_expenses: Decimal = expenses.iter().map(|e| to_decimal(e.total_amount)).sum();

    DashboardMetrics {
        total_leads,
        surveys_booked,
        pending_surveys,
        good_surveys,
        bad_surveys,
        sold_surveys,
        conversion_leads_to_surveys: percentage(surveys_booked, total_leads),
        conversion_leads_to_sold: percentage(sold_surveys, total_leads),
        online_leads,
        field_leads,
        total_online_expenses: to_f64(total_online_expenses),
        total_field_expenses: to_f64(total_field_expenses),
        total_expenses: to_f64(total_expenses),
        cost_per_lead_online: per_unit(total_online_expenses, online_leads),
        cost_per_lead_field: per_unit(total_field_expenses, field_leads),
        cost_per_lead: per_unit(total_expenses, total_leads),
        total_lead_cost: to_f64(total_lead_cost),
    }
}
