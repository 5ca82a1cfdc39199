//! Statement command for one company and date window.
//!
//! The human-readable layout shows the opening balance, the itemized work
//! and payments inside the window, and the closing balance. `--json`
//! emits the same report as pretty-printed JSON for scripting.

use std::fmt::Write;
use std::io;

use anyhow::Result;
use bill_core::Report;
use bill_db::Database;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Renders a money amount with two decimal places.
fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

/// Formats the human-readable statement output.
pub fn format_report(company: &str, report: &Report) -> String {
    let mut output = String::new();

    writeln!(output, "STATEMENT: {company}").unwrap();
    writeln!(
        output,
        "Period: {} to {}",
        report.period_start, report.period_end
    )
    .unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "Opening balance: {:>10}",
        money(report.opening_balance)
    )
    .unwrap();
    writeln!(output).unwrap();

    if report.records.is_empty() {
        writeln!(output, "No work recorded in this period.").unwrap();
    } else {
        writeln!(output, "WORK").unwrap();
        writeln!(output, "────").unwrap();
        writeln!(
            output,
            "{:<20} {:<12} {:<12} {:>6} {:>8} {:>10}",
            "START", "USER", "PROJECT", "HOURS", "RATE", "COST"
        )
        .unwrap();
        for line in &report.records {
            let start = line.start.to_string();
            let hours = format!("{:.2}", line.hours.round_dp(2));
            writeln!(
                output,
                "{start:<20} {:<12} {:<12} {hours:>6} {:>8} {:>10}",
                line.user,
                line.project,
                money(line.hourly),
                money(line.cost)
            )
            .unwrap();
        }
    }

    if !report.payments.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "PAYMENTS").unwrap();
        writeln!(output, "────────").unwrap();
        writeln!(output, "{:<12} {:>10}  NOTE", "DATE", "AMOUNT").unwrap();
        for payment in &report.payments {
            let date = payment.date.to_string();
            writeln!(
                output,
                "{date:<12} {:>10}  {}",
                money(payment.amount),
                payment.note.as_deref().unwrap_or("-")
            )
            .unwrap();
        }
    }

    writeln!(output).unwrap();
    writeln!(
        output,
        "Closing balance: {:>10}",
        money(report.closing_balance)
    )
    .unwrap();

    output
}

/// Generates and prints the statement for one company.
pub fn run<W: io::Write>(
    writer: &mut W,
    db: &mut Database,
    company: &str,
    from: NaiveDate,
    to: NaiveDate,
    json: bool,
) -> Result<()> {
    let report = db.generate_report(company, from, to)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_report(company, &report))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bill_core::{PaymentLine, WorkLine};
    use chrono::NaiveDateTime;
    use insta::assert_snapshot;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2000, 1, d).unwrap()
    }

    fn datetime(d: u32, h: u32) -> NaiveDateTime {
        date(d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn empty_report() -> Report {
        Report {
            period_start: date(1),
            period_end: date(31),
            opening_balance: dec!(100),
            closing_balance: dec!(100),
            records: Vec::new(),
            payments: Vec::new(),
        }
    }

    #[test]
    fn empty_period_statement() {
        assert_snapshot!(format_report("g1", &empty_report()), @r"
        STATEMENT: g1
        Period: 2000-01-01 to 2000-01-31

        Opening balance:     100.00

        No work recorded in this period.

        Closing balance:     100.00
        ");
    }

    #[test]
    fn itemized_statement_lists_work_and_payments() {
        let report = Report {
            opening_balance: dec!(100),
            closing_balance: dec!(94),
            records: vec![WorkLine {
                start: datetime(5, 9),
                end: datetime(5, 10),
                project: "g1x1".to_string(),
                user: "y1".to_string(),
                hours: dec!(1.5),
                hourly: dec!(4),
                cost: dec!(6),
            }],
            payments: vec![PaymentLine {
                date: date(1),
                amount: dec!(100),
                note: Some("wire".to_string()),
            }],
            ..empty_report()
        };

        let output = format_report("g1", &report);
        assert!(output.contains("WORK"));
        assert!(output.contains("2000-01-05 09:00:00  y1           g1x1"));
        assert!(output.contains("1.50     4.00       6.00"));
        assert!(output.contains("PAYMENTS"));
        assert!(output.contains("2000-01-01       100.00  wire"));
        assert!(output.contains("Closing balance:      94.00"));
    }

    #[test]
    fn money_pads_to_cents() {
        assert_eq!(money(dec!(96)), "96.00");
        assert_eq!(money(dec!(2.5)), "2.50");
        assert_eq!(money(dec!(-0.125)), "-0.12");
    }
}
