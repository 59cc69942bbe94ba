use chrono::NaiveDate;
use contracts::dashboards::d500_accounts_payable::{
    DeadlineBucket, DeadlineBucketRow, OverdueRow, PayableRecord,
};

use crate::shared::format::{format_currency_brl, format_date_br};

/// Open, due date known and strictly before `today`.
///
/// This is the only overdue rule; row flags, totals and detail tables all use it.
pub fn is_overdue(record: &PayableRecord, today: NaiveDate) -> bool {
    record.is_open() && matches!(record.due_date, Some(due) if due < today)
}

/// Days from `today` until the due date, negative when past due
pub fn days_remaining(record: &PayableRecord, today: NaiveDate) -> Option<i64> {
    record.due_date.map(|due| (due - today).num_days())
}

pub fn categorize_days_remaining(days: i64) -> DeadlineBucket {
    match days {
        d if d <= 0 => DeadlineBucket::OverdueOrDueToday,
        1..=7 => DeadlineBucket::Within7Days,
        8..=15 => DeadlineBucket::From8To15Days,
        16..=30 => DeadlineBucket::From16To30Days,
        _ => DeadlineBucket::MoreThan30Days,
    }
}

/// Bucket of an open record with a known due date, `None` otherwise
pub fn deadline_bucket(record: &PayableRecord, today: NaiveDate) -> Option<DeadlineBucket> {
    if !record.is_open() {
        return None;
    }
    days_remaining(record, today).map(categorize_days_remaining)
}

/// Open balance per deadline bucket; always all five buckets in display order
pub fn deadline_distribution(records: &[PayableRecord], today: NaiveDate) -> Vec<DeadlineBucketRow> {
    let mut totals = [(0usize, 0.0f64); 5];

    for record in records {
        if let Some(bucket) = deadline_bucket(record, today) {
            let slot = &mut totals[bucket as usize];
            slot.0 += 1;
            slot.1 += record.balance_value;
        }
    }

    DeadlineBucket::ALL
        .iter()
        .zip(totals)
        .map(|(bucket, (count, value))| DeadlineBucketRow {
            bucket: *bucket,
            label: bucket.label().to_string(),
            count,
            value,
            value_formatted: format_currency_brl(Some(value)),
        })
        .collect()
}

/// Overdue records, oldest due date first
pub fn overdue_rows(records: &[PayableRecord], today: NaiveDate) -> Vec<OverdueRow> {
    let mut rows: Vec<OverdueRow> = records
        .iter()
        .filter(|r| is_overdue(r, today))
        .filter_map(|r| {
            let due_date = r.due_date?;
            Some(OverdueRow {
                supplier: r.supplier.clone(),
                document_number: r.document_number.clone(),
                document_type: r.document_type.clone(),
                due_date,
                due_date_formatted: format_date_br(Some(due_date)),
                days_overdue: (today - due_date).num_days(),
                balance_value: r.balance_value,
                balance_value_formatted: format_currency_brl(Some(r.balance_value)),
            })
        })
        .collect();
    rows.sort_by_key(|row| row.due_date);
    rows
}

/// Sum of open balances past their due date, with the record count
pub fn overdue_total(records: &[PayableRecord], today: NaiveDate) -> (f64, usize) {
    records
        .iter()
        .filter(|r| is_overdue(r, today))
        .fold((0.0, 0), |(sum, count), r| (sum + r.balance_value, count + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(status: &str, due: Option<NaiveDate>, balance: f64) -> PayableRecord {
        PayableRecord {
            supplier: "ACME".to_string(),
            document_number: "1".to_string(),
            document_base_number: "1".to_string(),
            document_type: "Boleto".to_string(),
            issue_date: None,
            due_date: due,
            settlement_date: None,
            document_value: balance,
            discount_value: 0.0,
            balance_value: balance,
            status: status.to_string(),
        }
    }

    #[test]
    fn test_not_open_is_never_overdue() {
        let today = date(2024, 6, 15);
        for status in ["quitado", "settled", "cancelado", ""] {
            assert!(!is_overdue(&record(status, Some(date(2000, 1, 1)), 10.0), today));
            assert!(!is_overdue(&record(status, None, 10.0), today));
        }
    }

    #[test]
    fn test_overdue_boundary() {
        let today = date(2024, 6, 15);
        assert!(is_overdue(&record("aberto", Some(date(2024, 6, 14)), 1.0), today));
        assert!(!is_overdue(&record("aberto", Some(today), 1.0), today));
        assert!(!is_overdue(&record("aberto", Some(date(2024, 6, 16)), 1.0), today));
        assert!(!is_overdue(&record("Aberto", None, 1.0), today));
        assert!(is_overdue(&record("OPEN", Some(date(2024, 1, 1)), 1.0), today));
    }

    #[test]
    fn test_bucket_boundaries() {
        let cases = [
            (-10, DeadlineBucket::OverdueOrDueToday),
            (0, DeadlineBucket::OverdueOrDueToday),
            (1, DeadlineBucket::Within7Days),
            (7, DeadlineBucket::Within7Days),
            (8, DeadlineBucket::From8To15Days),
            (15, DeadlineBucket::From8To15Days),
            (16, DeadlineBucket::From16To30Days),
            (30, DeadlineBucket::From16To30Days),
            (31, DeadlineBucket::MoreThan30Days),
            (365, DeadlineBucket::MoreThan30Days),
        ];
        for (days, expected) in cases {
            assert_eq!(categorize_days_remaining(days), expected, "days = {}", days);
        }
    }

    #[test]
    fn test_every_open_record_lands_in_one_bucket() {
        let today = date(2024, 6, 15);
        let records: Vec<PayableRecord> = (-40..=40)
            .map(|offset| record("aberto", Some(today + Duration::days(offset)), 1.0))
            .collect();

        let rows = deadline_distribution(&records, today);
        let total: usize = rows.iter().map(|r| r.count).sum();
        assert_eq!(total, records.len());
        // -40..=0
        assert_eq!(rows[0].count, 41);
        assert_eq!(rows[1].count, 7);
        assert_eq!(rows[2].count, 8);
        assert_eq!(rows[3].count, 15);
        assert_eq!(rows[4].count, 10);
    }

    #[test]
    fn test_distribution_keeps_empty_buckets_in_order() {
        let today = date(2024, 6, 15);
        let records = vec![
            record("aberto", Some(date(2024, 6, 20)), 100.0),
            record("aberto", Some(date(2024, 6, 21)), 50.0),
            record("quitado", Some(date(2024, 6, 20)), 999.0),
            record("aberto", None, 999.0),
        ];

        let rows = deadline_distribution(&records, today);
        assert_eq!(rows.len(), 5);
        let buckets: Vec<DeadlineBucket> = rows.iter().map(|r| r.bucket).collect();
        assert_eq!(buckets, DeadlineBucket::ALL.to_vec());
        assert_eq!(rows[0].count, 0);
        assert_eq!(rows[0].value, 0.0);
        assert_eq!(rows[1].count, 2);
        assert_eq!(rows[1].value, 150.0);
        assert_eq!(rows[1].value_formatted, "R$ 150,00");
        assert_eq!(rows[1].label, "Within 7 days");
    }

    #[test]
    fn test_overdue_rows_and_total() {
        let today = date(2024, 6, 15);
        let records = vec![
            record("aberto", Some(date(2024, 6, 10)), 30.0),
            record("aberto", Some(date(2024, 5, 1)), 20.0),
            record("aberto", Some(today), 1000.0),
            record("quitado", Some(date(2024, 1, 1)), 1000.0),
        ];

        let rows = overdue_rows(&records, today);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].due_date, date(2024, 5, 1));
        assert_eq!(rows[0].days_overdue, 45);
        assert_eq!(rows[0].due_date_formatted, "01/05/2024");
        assert_eq!(rows[1].days_overdue, 5);

        assert_eq!(overdue_total(&records, today), (50.0, 2));
    }
}
