//! Rate history commands.

use std::io::Write;

use anyhow::Result;
use bill_db::Database;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Adds a rate entry for a user on a project.
pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    project: &str,
    user: &str,
    from: NaiveDate,
    hourly: Decimal,
) -> Result<()> {
    let rate = db.add_rate(project, user, from, hourly)?;
    writeln!(
        writer,
        "Rate for {user} on {project}: {}/h from {}",
        rate.hourly, rate.effective_from
    )?;
    Ok(())
}

/// Removes the rate entry with the exact effective date.
pub fn remove<W: Write>(
    writer: &mut W,
    db: &mut Database,
    project: &str,
    user: &str,
    from: NaiveDate,
) -> Result<()> {
    db.remove_rate(project, user, from)?;
    writeln!(writer, "Removed rate of {user} on {project} effective {from}")?;
    Ok(())
}
