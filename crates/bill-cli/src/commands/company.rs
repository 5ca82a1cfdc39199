//! Company commands.

use std::io::Write;

use anyhow::Result;
use bill_db::Database;
use chrono::NaiveDate;

/// Creates a company.
pub fn add<W: Write>(writer: &mut W, db: &mut Database, name: &str) -> Result<()> {
    let company = db.create_company(name)?;
    writeln!(writer, "Created company {} (id {})", company.name, company.id)?;
    Ok(())
}

/// Deletes a company without projects.
pub fn remove<W: Write>(writer: &mut W, db: &mut Database, name: &str) -> Result<()> {
    db.delete_company(name)?;
    writeln!(writer, "Removed company {name}")?;
    Ok(())
}

/// Renames a company.
pub fn rename<W: Write>(
    writer: &mut W,
    db: &mut Database,
    name: &str,
    new_name: &str,
) -> Result<()> {
    let company = db.rename_company(name, new_name)?;
    writeln!(writer, "Renamed company {name} to {}", company.name)?;
    Ok(())
}

/// Moves the company's settlement watermark.
pub fn settle<W: Write>(
    writer: &mut W,
    db: &mut Database,
    name: &str,
    through: NaiveDate,
) -> Result<()> {
    let company = db.set_settlement_date(name, through)?;
    writeln!(
        writer,
        "Settled {} through {through}",
        company.name
    )?;
    Ok(())
}

/// Lists all companies.
pub fn list<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let companies = db.list_companies()?;
    if companies.is_empty() {
        writeln!(writer, "No companies.")?;
        return Ok(());
    }

    writeln!(writer, "{:<6} {:<20} SETTLED-THROUGH", "ID", "NAME")?;
    for company in companies {
        let settled = company
            .settled_through
            .map_or_else(|| "-".to_string(), |date| date.to_string());
        writeln!(writer, "{:<6} {:<20} {settled}", company.id, company.name)?;
    }
    Ok(())
}
