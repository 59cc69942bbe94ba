use chrono::{Datelike, NaiveDate, Weekday};
use contracts::dashboards::d500_accounts_payable::{
    DocumentTypeAmount, FilterOptionsResponse, ForecastActualRow, MonthlyAmount, OverviewResponse,
    PayableRecord, PayableRow, Selection, SupplierTerm, WeeklyAmount, ALL_SENTINEL,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::deadline::{is_overdue, overdue_total};
use crate::shared::format::{format_currency_brl, format_date_br};

// ============================================================================
// Periods
// ============================================================================

/// (year, month) of the month after the given one
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// First and last day of a month, `None` for an invalid month
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next) = next_month(year, month);
    let last = NaiveDate::from_ymd_opt(next_year, next, 1)?.pred_opt()?;
    Some((first, last))
}

fn in_month(date: Option<NaiveDate>, year: i32, month: u32) -> bool {
    matches!(date, Some(d) if d.year() == year && d.month() == month)
}

fn in_range(date: Option<NaiveDate>, start: NaiveDate, end: NaiveDate) -> bool {
    matches!(date, Some(d) if d >= start && d <= end)
}

fn period_label(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

// ============================================================================
// Filtering
// ============================================================================

/// Records whose status and document type are both selected
pub fn filter_records(
    records: &[PayableRecord],
    statuses: &Selection,
    document_types: &Selection,
) -> Vec<PayableRecord> {
    records
        .iter()
        .filter(|r| statuses.matches_status(&r.status) && document_types.matches(&r.document_type))
        .cloned()
        .collect()
}

/// Distinct statuses and document types, sorted, each list led by `Todos`
pub fn filter_options(records: &[PayableRecord]) -> FilterOptionsResponse {
    let statuses: BTreeSet<&str> = records
        .iter()
        .map(|r| r.status.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    let document_types: BTreeSet<&str> = records.iter().map(|r| r.document_type.as_str()).collect();

    FilterOptionsResponse {
        statuses: with_sentinel(statuses),
        document_types: with_sentinel(document_types),
    }
}

fn with_sentinel(values: BTreeSet<&str>) -> Vec<String> {
    std::iter::once(ALL_SENTINEL)
        .chain(values)
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Monthly metrics
// ============================================================================

/// Open balance of records due in the month
pub fn open_balance_by_month(records: &[PayableRecord], year: i32, month: u32) -> f64 {
    records
        .iter()
        .filter(|r| r.is_open() && in_month(r.due_date, year, month))
        .fold(0.0, |total, r| total + r.balance_value)
}

/// Net paid amount (value minus discount) of records settled in the month
pub fn paid_amount_by_month(records: &[PayableRecord], year: i32, month: u32) -> f64 {
    records
        .iter()
        .filter(|r| r.is_settled() && in_month(r.settlement_date, year, month))
        .fold(0.0, |total, r| total + r.net_paid_value())
}

/// Header metrics.
///
/// `filtered` feeds the open balance and overdue figures; the paid amount is
/// computed over `all` records, ignoring the status filter.
pub fn overview(
    filtered: &[PayableRecord],
    all: &[PayableRecord],
    year: i32,
    month: u32,
    today: NaiveDate,
) -> OverviewResponse {
    let open_balance = open_balance_by_month(filtered, year, month);
    let paid_amount = paid_amount_by_month(all, year, month);
    let (overdue_total, overdue_count) = overdue_total(filtered, today);

    OverviewResponse {
        period: period_label(year, month),
        open_balance,
        open_balance_formatted: format_currency_brl(Some(open_balance)),
        paid_amount,
        paid_amount_formatted: format_currency_brl(Some(paid_amount)),
        overdue_total,
        overdue_total_formatted: format_currency_brl(Some(overdue_total)),
        overdue_count,
    }
}

// ============================================================================
// Detail tables
// ============================================================================

/// Open records due within `[start, end]`, earliest first.
///
/// The sort is stable, so records due on the same day keep source order.
pub fn upcoming_due(
    records: &[PayableRecord],
    start: NaiveDate,
    end: NaiveDate,
    document_types: &Selection,
) -> Vec<PayableRecord> {
    let mut rows: Vec<PayableRecord> = records
        .iter()
        .filter(|r| {
            r.is_open() && in_range(r.due_date, start, end) && document_types.matches(&r.document_type)
        })
        .cloned()
        .collect();
    rows.sort_by_key(|r| r.due_date);
    rows
}

pub fn to_payable_row(record: &PayableRecord, today: NaiveDate) -> PayableRow {
    PayableRow {
        supplier: record.supplier.clone(),
        document_number: record.document_number.clone(),
        document_type: record.document_type.clone(),
        due_date: record.due_date,
        due_date_formatted: format_date_br(record.due_date),
        balance_value: record.balance_value,
        balance_value_formatted: format_currency_brl(Some(record.balance_value)),
        is_overdue: is_overdue(record, today),
    }
}

// ============================================================================
// Time series
// ============================================================================

/// Gross document value of records settled in `[start, end]`, per month.
///
/// Unlike [`paid_amount_by_month`] the discount is not subtracted here.
/// Only months with at least one settlement appear.
pub fn payments_by_period(
    records: &[PayableRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<MonthlyAmount> {
    let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();

    for record in records {
        if !record.is_settled() || !in_range(record.settlement_date, start, end) {
            continue;
        }
        if let Some(settled) = record.settlement_date {
            *by_month.entry((settled.year(), settled.month())).or_insert(0.0) +=
                record.document_value;
        }
    }

    by_month
        .into_iter()
        .map(|((year, month), value)| MonthlyAmount {
            period: period_label(year, month),
            value,
            value_formatted: format_currency_brl(Some(value)),
        })
        .collect()
}

/// Open balance due in `[start, end]`, per ISO week (Monday start)
pub fn due_peaks_by_week(
    records: &[PayableRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<WeeklyAmount> {
    let mut by_week: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for record in records {
        if !record.is_open() || !in_range(record.due_date, start, end) {
            continue;
        }
        if let Some(monday) = record.due_date.and_then(iso_week_monday) {
            *by_week.entry(monday).or_insert(0.0) += record.balance_value;
        }
    }

    by_week
        .into_iter()
        .map(|(week_start, value)| {
            let iso = week_start.iso_week();
            let week_end = week_start + chrono::Duration::days(6);
            WeeklyAmount {
                iso_year: iso.year(),
                iso_week: iso.week(),
                week_start,
                week_end,
                label: format!("{}/{}", week_start.format("%Y-%m-%d"), week_end.format("%Y-%m-%d")),
                value,
                value_formatted: format_currency_brl(Some(value)),
            }
        })
        .collect()
}

/// Open balance due vs. net amount settled, per month of `year`.
///
/// Months missing from one side are reported as 0.
pub fn forecast_vs_actual(records: &[PayableRecord], year: i32) -> Vec<ForecastActualRow> {
    let mut by_month: BTreeMap<u32, (f64, f64)> = BTreeMap::new();

    for record in records {
        if record.is_open() {
            if let Some(due) = record.due_date.filter(|d| d.year() == year) {
                by_month.entry(due.month()).or_insert((0.0, 0.0)).0 += record.balance_value;
            }
        } else if record.is_settled() {
            if let Some(settled) = record.settlement_date.filter(|d| d.year() == year) {
                by_month.entry(settled.month()).or_insert((0.0, 0.0)).1 += record.net_paid_value();
            }
        }
    }

    by_month
        .into_iter()
        .map(|(month, (forecast, actual))| ForecastActualRow {
            period: period_label(year, month),
            forecast,
            actual,
        })
        .collect()
}

// ============================================================================
// Breakdowns
// ============================================================================

/// Average payment term per supplier, longest first.
///
/// Terms (due date minus issue date) of settled records are first averaged
/// per document, so a document split into many installments counts once.
pub fn average_term_by_supplier(records: &[PayableRecord]) -> Vec<SupplierTerm> {
    let mut by_document: HashMap<(&str, &str), (i64, usize)> = HashMap::new();

    for record in records.iter().filter(|r| r.is_settled()) {
        let (Some(due), Some(issued)) = (record.due_date, record.issue_date) else {
            continue;
        };
        let entry = by_document
            .entry((record.supplier.as_str(), record.document_base_number.as_str()))
            .or_insert((0, 0));
        entry.0 += (due - issued).num_days();
        entry.1 += 1;
    }

    let mut by_supplier: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for ((supplier, _), (total_days, installments)) in by_document {
        let entry = by_supplier.entry(supplier).or_insert((0.0, 0));
        entry.0 += total_days as f64 / installments as f64;
        entry.1 += 1;
    }

    let mut rows: Vec<SupplierTerm> = by_supplier
        .into_iter()
        .map(|(supplier, (sum, documents))| SupplierTerm {
            supplier: supplier.to_string(),
            average_term_days: sum / documents as f64,
            documents,
        })
        .collect();
    // BTreeMap order makes the supplier name the tie-breaker
    rows.sort_by(|a, b| b.average_term_days.total_cmp(&a.average_term_days));
    rows
}

/// Total document value per document type, largest first
pub fn distribution_by_document_type(records: &[PayableRecord]) -> Vec<DocumentTypeAmount> {
    let mut by_type: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records {
        *by_type.entry(record.document_type.as_str()).or_insert(0.0) += record.document_value;
    }

    let total = by_type.values().fold(0.0, |total, v| total + *v);
    let mut rows: Vec<DocumentTypeAmount> = by_type
        .into_iter()
        .map(|(document_type, value)| DocumentTypeAmount {
            document_type: document_type.to_string(),
            value,
            value_formatted: format_currency_brl(Some(value)),
            share: if total != 0.0 { value / total * 100.0 } else { 0.0 },
        })
        .collect();
    rows.sort_by(|a, b| b.value.total_cmp(&a.value));
    rows
}

/// Monday of the ISO week containing `date`
pub fn iso_week_monday(date: NaiveDate) -> Option<NaiveDate> {
    let iso = date.iso_week();
    NaiveDate::from_isoywd_opt(iso.year(), iso.week(), Weekday::Mon)
}
