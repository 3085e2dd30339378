use super::cache::{MetricsCache, Versions, range_key};
use super::staff::{StaffGrouping, compute_staff_performance};
use super::trend::compute_lead_trend;
use super::*;
use crate::auth::LeadScope;
use crate::utils::time::DateRange;

const DAY: i64 = 86_400_000;

fn lead(created_at: i64) -> LeadSnapshot {
    LeadSnapshot {
        created_at,
        survey_booked_date: None,
        survey_status: None,
        lead_source: None,
        lead_cost: None,
        account_manager: None,
        field_rep: None,
    }
}

fn booked(created_at: i64, status: SurveyStatus) -> LeadSnapshot {
    LeadSnapshot {
        survey_booked_date: Some(created_at + 1000),
        survey_status: Some(status),
        ..lead(created_at)
    }
}

fn expense(total: f64, online: f64, field: f64) -> ExpenseSnapshot {
    ExpenseSnapshot {
        total_amount: total,
        online_amount: online,
        field_amount: field,
    }
}

#[test]
fn test_to_decimal_precision() {
    // Classic floating point problem: 0.1 + 0.2 != 0.3
    let sum_f64 = 0.1_f64 + 0.2_f64;
    assert_ne!(sum_f64, 0.3);

    let sum_dec = to_decimal(0.1) + to_decimal(0.2);
    assert_eq!(to_f64(sum_dec), 0.3);
}

#[test]
fn test_empty_lead_set_yields_zeroed_metrics() {
    let metrics = compute_dashboard_metrics(&[], &[]);
    assert_eq!(metrics, DashboardMetrics::default());
    // Zero-guards: never NaN, never a division fault
    assert_eq!(metrics.conversion_leads_to_surveys, 0.0);
    assert_eq!(metrics.conversion_leads_to_sold, 0.0);
    assert_eq!(metrics.cost_per_lead_online, 0.0);
}

#[test]
fn test_survey_buckets_partition_the_surveyed_subset() {
    let leads = vec![
        booked(0, SurveyStatus::Pending),
        booked(0, SurveyStatus::Good),
        booked(0, SurveyStatus::Good),
        booked(0, SurveyStatus::Bad),
        booked(0, SurveyStatus::Sold),
        lead(0),
        lead(0),
    ];
    let metrics = compute_dashboard_metrics(&leads, &[]);

    assert_eq!(metrics.total_leads, 7);
    assert_eq!(metrics.surveys_booked, 5);
    assert_eq!(metrics.pending_surveys, 1);
    assert_eq!(metrics.good_surveys, 2);
    assert_eq!(metrics.bad_surveys, 1);
    assert_eq!(metrics.sold_surveys, 1);

    let unbooked = metrics.total_leads - metrics.surveys_booked;
    assert_eq!(
        metrics.total_leads,
        metrics.pending_surveys
            + metrics.good_surveys
            + metrics.bad_surveys
            + metrics.sold_surveys
            + unbooked
    );
}

#[test]
fn test_booked_survey_without_outcome_counts_as_pending() {
    let mut no_outcome = lead(0);
    no_outcome.survey_booked_date = Some(500);
    let metrics = compute_dashboard_metrics(&[no_outcome], &[]);
    assert_eq!(metrics.surveys_booked, 1);
    assert_eq!(metrics.pending_surveys, 1);
}

#[test]
fn test_stray_survey_status_without_booked_date_is_no_survey() {
    let mut stray = lead(0);
    stray.survey_status = Some(SurveyStatus::Sold);
    let metrics = compute_dashboard_metrics(&[stray], &[]);
    assert_eq!(metrics.surveys_booked, 0);
    assert_eq!(metrics.sold_surveys, 0);
    assert_eq!(metrics.conversion_leads_to_sold, 0.0);
}

#[test]
fn test_conversion_percentages_rounded_to_2dp() {
    // 1 of 3 sold: 33.333...% rounds to 33.33
    let leads = vec![booked(0, SurveyStatus::Sold), lead(0), lead(0)];
    let metrics = compute_dashboard_metrics(&leads, &[]);
    assert_eq!(metrics.conversion_leads_to_surveys, 33.33);
    assert_eq!(metrics.conversion_leads_to_sold, 33.33);

    // 2 of 3: 66.666...% rounds half-up to 66.67
    let leads = vec![
        booked(0, SurveyStatus::Sold),
        booked(0, SurveyStatus::Sold),
        lead(0),
    ];
    let metrics = compute_dashboard_metrics(&leads, &[]);
    assert_eq!(metrics.conversion_leads_to_sold, 66.67);
}

#[test]
fn test_account_manager_example_scenario() {
    // Alice's scoped set: one sold+booked lead, one without a survey
    let sold = booked(0, SurveyStatus::Sold);
    let unbooked = lead(0);
    let metrics = compute_dashboard_metrics(&[sold, unbooked], &[]);

    assert_eq!(metrics.total_leads, 2);
    assert_eq!(metrics.surveys_booked, 1);
    assert_eq!(metrics.sold_surveys, 1);
    assert_eq!(metrics.conversion_leads_to_sold, 50.0);
}

#[test]
fn test_cost_per_lead_split() {
    let mut online = lead(0);
    online.lead_source = Some(LeadSource::Online);
    let mut field_a = lead(0);
    field_a.lead_source = Some(LeadSource::Field);
    let mut field_b = lead(0);
    field_b.lead_source = Some(LeadSource::Field);
    // No source: in neither channel, still in the total
    let unsourced = lead(0);

    let expenses = vec![expense(100.0, 60.0, 40.0), expense(50.0, 30.0, 20.0)];
    let metrics =
        compute_dashboard_metrics(&[online, field_a, field_b, unsourced], &expenses);

    assert_eq!(metrics.online_leads, 1);
    assert_eq!(metrics.field_leads, 2);
    assert_eq!(metrics.total_online_expenses, 90.0);
    assert_eq!(metrics.total_field_expenses, 60.0);
    assert_eq!(metrics.total_expenses, 150.0);
    assert_eq!(metrics.cost_per_lead_online, 90.0);
    assert_eq!(metrics.cost_per_lead_field, 30.0);
    // 150 / 4 leads
    assert_eq!(metrics.cost_per_lead, 37.5);
}

#[test]
fn test_cost_per_lead_zero_denominators() {
    let expenses = vec![expense(100.0, 60.0, 40.0)];
    let metrics = compute_dashboard_metrics(&[lead(0)], &expenses);
    // One lead, no channel attribution: both splits guard to zero
    assert_eq!(metrics.cost_per_lead_online, 0.0);
    assert_eq!(metrics.cost_per_lead_field, 0.0);
    assert_eq!(metrics.cost_per_lead, 100.0);
}

#[test]
fn test_total_lead_cost_sums_with_decimal_precision() {
    let mut leads = Vec::new();
    for _ in 0..3 {
        let mut l = lead(0);
        l.lead_cost = Some(0.1);
        leads.push(l);
    }
    let metrics = compute_dashboard_metrics(&leads, &[]);
    assert_eq!(metrics.total_lead_cost, 0.3);
}

#[test]
fn test_expense_split_validation() {
    assert!(validate_expense_split(100.0, 60.0, 40.0).is_ok());
    // Within the 0.01 tolerance
    assert!(validate_expense_split(100.0, 60.0, 39.99).is_ok());
    // Outside it
    assert!(validate_expense_split(100.0, 60.0, 39.98).is_err());
    assert!(validate_expense_split(100.0, 110.0, -10.0).is_err());
    assert!(validate_expense_split(f64::NAN, 0.0, 0.0).is_err());
    assert!(validate_expense_split(100.0, f64::INFINITY, 0.0).is_err());
}

#[test]
fn test_staff_rows_group_by_field_rep() {
    let mut bob_sold = booked(0, SurveyStatus::Sold);
    bob_sold.field_rep = Some("Bob".to_string());
    let mut bob_plain = lead(0);
    bob_plain.field_rep = Some("Bob".to_string());
    let mut carol_bad = booked(0, SurveyStatus::Bad);
    carol_bad.field_rep = Some("Carol".to_string());
    // Unattributed and blank names never form a row
    let unattributed = lead(0);
    let mut blank = lead(0);
    blank.field_rep = Some("   ".to_string());

    let mut rows = compute_staff_performance(
        &[bob_sold, bob_plain, carol_bad, unattributed, blank],
        StaffGrouping::FieldRep,
    );
    rows.sort_by(|a, b| a.staff_name.cmp(&b.staff_name));

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].staff_name, "Bob");
    assert_eq!(rows[0].total_leads, 2);
    assert_eq!(rows[0].sold_surveys, 1);
    assert_eq!(rows[0].conversion_rate, 50.0);
    assert_eq!(rows[1].staff_name, "Carol");
    assert_eq!(rows[1].total_leads, 1);
    assert_eq!(rows[1].bad_surveys, 1);
    assert_eq!(rows[1].conversion_rate, 0.0);
}

#[test]
fn test_staff_grouping_by_account_manager() {
    let mut alice = booked(0, SurveyStatus::Good);
    alice.account_manager = Some("Alice".to_string());
    alice.field_rep = Some("Bob".to_string());

    let rows = compute_staff_performance(&[alice], StaffGrouping::AccountManager);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].staff_name, "Alice");
    assert_eq!(rows[0].good_surveys, 1);
}

#[test]
fn test_staff_grouping_parses_from_config_string() {
    assert_eq!(
        "field_rep".parse::<StaffGrouping>().unwrap(),
        StaffGrouping::FieldRep
    );
    assert_eq!(
        "account_manager".parse::<StaffGrouping>().unwrap(),
        StaffGrouping::AccountManager
    );
    assert!("installer".parse::<StaffGrouping>().is_err());
}

#[test]
fn test_trend_fills_empty_days() {
    let range = DateRange::new(0, 2 * DAY + 1000).unwrap();
    let leads = vec![
        booked(500, SurveyStatus::Sold),
        lead(600),
        // Day two empty, day three one lead
        lead(2 * DAY + 10),
    ];
    let points = compute_lead_trend(&leads, range);

    assert_eq!(points.len(), 3);
    assert_eq!(points[0].date, "1970-01-01");
    assert_eq!(points[0].total_leads, 2);
    assert_eq!(points[1].total_leads, 0);
    assert_eq!(points[2].date, "1970-01-03");
    assert_eq!(points[2].total_leads, 1);

    // Every scoped lead lands in exactly one day bucket
    let summed: usize = points.iter().map(|p| p.total_leads).sum();
    assert_eq!(summed, leads.len());
}

#[test]
fn test_cache_rejects_entries_from_older_versions() {
    let cache = MetricsCache::new();
    let range = DateRange::new(0, DAY).unwrap();
    let key = range_key(&LeadScope::All, range);
    let v1 = Versions { lead: 1, expense: 1 };

    let metrics = compute_dashboard_metrics(&[lead(0)], &[]);
    cache.put_dashboard(key.clone(), v1, metrics.clone());
    assert_eq!(cache.get_dashboard(&key, v1), Some(metrics));

    // A lead mutation moved the version: entry no longer served
    let v2 = Versions { lead: 2, expense: 1 };
    assert_eq!(cache.get_dashboard(&key, v2), None);

    cache.evict_stale(v2);
    assert!(cache.is_empty());
}

#[test]
fn test_cache_keys_separate_scopes_and_ranges() {
    let range = DateRange::new(0, DAY).unwrap();
    let all = range_key(&LeadScope::All, range);
    let alice = range_key(
        &LeadScope::Attribution {
            field: crate::auth::AttributionField::AccountManager,
            name: "Alice".to_string(),
        },
        range,
    );
    let later = range_key(&LeadScope::All, DateRange::new(0, 2 * DAY).unwrap());

    assert_ne!(all, alice);
    assert_ne!(all, later);
    assert_eq!(alice, "account_manager=Alice|0|86400000");
}
