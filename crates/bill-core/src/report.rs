//! Ledger report generation.
//!
//! A report reconciles everything a company has been billed against
//! everything it has paid, over an inclusive date window. The storage
//! layer assembles the inputs (one consistent snapshot); this module is a
//! pure computation and produces identical output for identical inputs.
//!
//! Balance semantics follow the books, not the window: the opening
//! balance counts every record that *started* strictly before the window
//! and every payment dated up to and including the window start, so the
//! two sides of the boundary are intentionally asymmetric.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::EngineError;
use crate::model::Rate;
use crate::rate;
use crate::types::{ProjectId, UserId, WorkRecordId};

/// A committed work record joined with display names, as fetched for
/// reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub id: WorkRecordId,
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub user_name: String,
    pub project_name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// An itemized payment row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentLine {
    pub date: NaiveDate,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Everything the report needs, read under one snapshot.
///
/// `records` must contain every company record with start strictly before
/// the day after `period_end`; older records are required to compute the
/// opening balance. `payments` holds only the rows itemized in the window,
/// while the two cumulative totals run through the window's start and end
/// dates inclusive.
#[derive(Debug, Clone)]
pub struct ReportInputs {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub records: Vec<ReportRecord>,
    pub rates: Vec<Rate>,
    pub payments: Vec<PaymentLine>,
    pub payments_through_start: Decimal,
    pub payments_through_end: Decimal,
}

/// One billed line of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkLine {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub project: String,
    pub user: String,
    pub hours: Decimal,
    pub hourly: Decimal,
    pub cost: Decimal,
}

/// The computed statement for one company and window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
    pub records: Vec<WorkLine>,
    pub payments: Vec<PaymentLine>,
}

struct CostedRecord<'a> {
    record: &'a ReportRecord,
    hourly: Decimal,
    hours: Decimal,
    cost: Decimal,
}

/// Builds the ledger report from a consistent snapshot of inputs.
///
/// Fails if the window is inverted or if any fetched record has no rate
/// covering its start date.
pub fn build_report(inputs: &ReportInputs) -> Result<Report, EngineError> {
    if inputs.period_start > inputs.period_end {
        return Err(EngineError::InvalidPeriod {
            start: inputs.period_start,
            end: inputs.period_end,
        });
    }

    let costed = cost_records(&inputs.records, &inputs.rates)?;

    let period_open = inputs.period_start.and_time(NaiveTime::MIN);
    let mut cost_before_start = Decimal::ZERO;
    let mut cost_through_end = Decimal::ZERO;
    let mut lines = Vec::new();

    for entry in &costed {
        cost_through_end += entry.cost;
        if entry.record.start < period_open {
            cost_before_start += entry.cost;
        }

        let day = entry.record.start.date();
        if day >= inputs.period_start && day <= inputs.period_end {
            lines.push(WorkLine {
                start: entry.record.start,
                end: entry.record.end,
                project: entry.record.project_name.clone(),
                user: entry.record.user_name.clone(),
                hours: entry.hours,
                hourly: entry.hourly,
                cost: entry.cost,
            });
        }
    }

    Ok(Report {
        period_start: inputs.period_start,
        period_end: inputs.period_end,
        opening_balance: inputs.payments_through_start - cost_before_start,
        closing_balance: inputs.payments_through_end - cost_through_end,
        records: lines,
        payments: inputs.payments.clone(),
    })
}

/// Resolves a rate and computes the cost for every record. Records are
/// independent, so the map runs in parallel; order is preserved.
fn cost_records<'a>(
    records: &'a [ReportRecord],
    rates: &[Rate],
) -> Result<Vec<CostedRecord<'a>>, EngineError> {
    records
        .par_iter()
        .map(|record| {
            let rate = rate::resolve(rates, record.project_id, record.user_id, record.start.date())
                .ok_or_else(|| EngineError::RateUnresolved {
                    record: record.id,
                    user: record.user_name.clone(),
                    project: record.project_name.clone(),
                    date: record.start.date(),
                })?;
            let seconds = (record.end - record.start).num_seconds();
            Ok(CostedRecord {
                record,
                hourly: rate.hourly,
                hours: hours_of(seconds),
                cost: record_cost(rate.hourly, seconds),
            })
        })
        .collect()
}

/// Cost of `seconds` of work at `hourly`. Multiplies before dividing so
/// whole-hour durations stay exact.
fn record_cost(hourly: Decimal, seconds: i64) -> Decimal {
    hourly * Decimal::from(seconds) / Decimal::from(3600)
}

fn hours_of(seconds: i64) -> Decimal {
    Decimal::from(seconds) / Decimal::from(3600)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        s.parse().expect("valid date literal")
    }

    fn dt(s: &str) -> NaiveDateTime {
        s.parse().expect("valid datetime literal")
    }

    fn record(id: i64, start: &str, end: &str) -> ReportRecord {
        ReportRecord {
            id: WorkRecordId::new(id),
            user_id: UserId::new(1),
            project_id: ProjectId::new(1),
            user_name: "y1".to_string(),
            project_name: "g1x1".to_string(),
            start: dt(start),
            end: dt(end),
        }
    }

    fn rate(effective_from: &str, hourly: Decimal) -> Rate {
        Rate {
            project_id: ProjectId::new(1),
            user_id: UserId::new(1),
            effective_from: date(effective_from),
            hourly,
        }
    }

    fn inputs(start: &str, end: &str) -> ReportInputs {
        ReportInputs {
            period_start: date(start),
            period_end: date(end),
            records: Vec::new(),
            rates: vec![rate("2000-01-01", dec!(4))],
            payments: Vec::new(),
            payments_through_start: Decimal::ZERO,
            payments_through_end: Decimal::ZERO,
        }
    }

    #[test]
    fn whole_hour_cost_is_exact() {
        let mut inputs = inputs("2000-01-02", "2000-01-02");
        inputs.records = vec![record(1, "2000-01-02T10:01:00", "2000-01-02T11:01:00")];

        let report = build_report(&inputs).expect("report builds");
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].cost, dec!(4.00));
        assert_eq!(report.records[0].hours, dec!(1));
        assert_eq!(report.closing_balance, dec!(-4));
    }

    #[test]
    fn cost_multiplies_before_dividing() {
        assert_eq!(record_cost(dec!(4), 3600), dec!(4));
        assert_eq!(record_cost(dec!(4), 1800), dec!(2));
        assert_eq!(record_cost(dec!(0.01), 1800), dec!(0.005));
        assert_eq!(record_cost(dec!(3), 60), dec!(0.05));
    }

    #[test]
    fn opening_balance_counts_only_work_strictly_before_the_window() {
        let mut inputs = inputs("2000-01-02", "2000-01-03");
        inputs.records = vec![
            record(1, "2000-01-01T10:00:00", "2000-01-01T11:00:00"),
            record(2, "2000-01-02T10:00:00", "2000-01-02T11:00:00"),
        ];
        inputs.payments_through_start = dec!(100);
        inputs.payments_through_end = dec!(100);

        let report = build_report(&inputs).expect("report builds");
        // Only the Jan 1 record was accrued before the window opened.
        assert_eq!(report.opening_balance, dec!(96));
        assert_eq!(report.closing_balance, dec!(92));
        // The pre-window record is not itemized.
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].start, dt("2000-01-02T10:00:00"));
    }

    #[test]
    fn window_is_inclusive_of_both_end_days() {
        let mut inputs = inputs("2000-01-02", "2000-01-03");
        inputs.records = vec![
            record(1, "2000-01-02T08:00:00", "2000-01-02T09:00:00"),
            record(2, "2000-01-03T22:00:00", "2000-01-03T23:00:00"),
        ];

        let report = build_report(&inputs).expect("report builds");
        assert_eq!(report.records.len(), 2);
    }

    #[test]
    fn missing_rate_names_the_offending_record() {
        let mut inputs = inputs("2000-01-02", "2000-01-02");
        inputs.rates = vec![rate("2000-06-01", dec!(4))];
        inputs.records = vec![record(7, "2000-01-02T10:00:00", "2000-01-02T11:00:00")];

        let err = build_report(&inputs).expect_err("no rate covers the record");
        match err {
            EngineError::RateUnresolved { record, date, .. } => {
                assert_eq!(record, WorkRecordId::new(7));
                assert_eq!(date, "2000-01-02".parse::<NaiveDate>().unwrap());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn split_siblings_are_rate_resolved_per_day() {
        let mut inputs = inputs("2000-01-01", "2000-01-02");
        inputs.rates = vec![rate("2000-01-01", dec!(2)), rate("2000-01-02", dec!(4))];
        // The two halves of a 23:00-01:00 overnight request.
        inputs.records = vec![
            record(1, "2000-01-01T23:00:00", "2000-01-02T00:00:00"),
            record(2, "2000-01-02T00:00:00", "2000-01-02T01:00:00"),
        ];

        let report = build_report(&inputs).expect("report builds");
        assert_eq!(report.records[0].cost, dec!(2));
        assert_eq!(report.records[1].cost, dec!(4));
        assert_eq!(report.closing_balance, dec!(-6));
    }

    #[test]
    fn balance_identity_holds_for_activity_strictly_inside_the_window() {
        let mut inputs = inputs("2000-01-02", "2000-01-05");
        inputs.records = vec![
            record(1, "2000-01-03T10:00:00", "2000-01-03T12:00:00"),
            record(2, "2000-01-04T10:00:00", "2000-01-04T11:00:00"),
        ];
        inputs.payments = vec![PaymentLine {
            date: date("2000-01-03"),
            amount: dec!(100),
            note: None,
        }];
        inputs.payments_through_start = Decimal::ZERO;
        inputs.payments_through_end = dec!(100);

        let report = build_report(&inputs).expect("report builds");

        let itemized_cost: Decimal = report.records.iter().map(|line| line.cost).sum();
        let itemized_payments: Decimal = report.payments.iter().map(|line| line.amount).sum();
        assert_eq!(
            report.closing_balance - report.opening_balance,
            itemized_payments - itemized_cost
        );
    }

    #[test]
    fn single_day_window_is_valid() {
        let mut inputs = inputs("2000-01-02", "2000-01-02");
        inputs.records = vec![record(1, "2000-01-02T10:00:00", "2000-01-02T11:00:00")];
        let report = build_report(&inputs).expect("report builds");
        assert_eq!(report.records.len(), 1);
    }

    #[test]
    fn inverted_window_is_rejected() {
        let inputs = inputs("2000-01-03", "2000-01-02");
        let err = build_report(&inputs).expect_err("start after end");
        assert!(matches!(err, EngineError::InvalidPeriod { .. }));
    }

    #[test]
    fn negative_payments_flow_through_the_balances() {
        let mut inputs = inputs("2000-01-02", "2000-01-02");
        inputs.payments = vec![PaymentLine {
            date: date("2000-01-02"),
            amount: dec!(-50),
            note: Some("refund".to_string()),
        }];
        inputs.payments_through_start = dec!(-50);
        inputs.payments_through_end = dec!(-50);

        let report = build_report(&inputs).expect("report builds");
        assert_eq!(report.opening_balance, dec!(-50));
        assert_eq!(report.closing_balance, dec!(-50));
    }

    #[test]
    fn identical_inputs_produce_byte_identical_reports() {
        let mut inputs = inputs("2000-01-01", "2000-01-03");
        inputs.records = vec![
            record(1, "2000-01-01T09:00:00", "2000-01-01T17:00:00"),
            record(2, "2000-01-02T09:30:00", "2000-01-02T10:00:00"),
        ];
        inputs.payments = vec![PaymentLine {
            date: date("2000-01-01"),
            amount: dec!(100),
            note: Some("wire".to_string()),
        }];
        inputs.payments_through_start = dec!(100);
        inputs.payments_through_end = dec!(100);

        let first = serde_json::to_string(&build_report(&inputs).expect("report builds")).unwrap();
        let second = serde_json::to_string(&build_report(&inputs).expect("report builds")).unwrap();
        assert_eq!(first, second);
    }
}
