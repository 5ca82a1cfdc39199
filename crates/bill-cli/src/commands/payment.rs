//! Payment commands.

use std::io::Write;

use anyhow::Result;
use bill_core::PaymentId;
use bill_db::Database;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Records a payment received from a company. Negative amounts express
/// refunds or corrections.
pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    company: &str,
    date: NaiveDate,
    amount: Decimal,
    note: Option<&str>,
) -> Result<()> {
    let payment = db.create_payment(company, date, amount, note)?;
    writeln!(
        writer,
        "Recorded payment of {} from {company} on {date} (id {})",
        payment.amount, payment.id
    )?;
    Ok(())
}

/// Deletes a payment by id.
pub fn remove<W: Write>(writer: &mut W, db: &mut Database, id: i64) -> Result<()> {
    db.delete_payment(PaymentId::new(id))?;
    writeln!(writer, "Removed payment {id}")?;
    Ok(())
}
