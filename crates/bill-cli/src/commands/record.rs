//! Work record commands.
//!
//! `record list` can emit JSON lines for scripting, mirroring the table
//! output row for row.

use std::io::Write;

use anyhow::Result;
use bill_core::WorkRecordId;
use bill_db::{Database, RecordFilter};
use chrono::NaiveDateTime;

/// Records a work interval. The stored pieces are echoed back, one per
/// calendar day touched.
pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    user: &str,
    project: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    note: Option<&str>,
) -> Result<()> {
    let pieces = db.create_work_record(user, project, start, end, note)?;
    if let [piece] = pieces.as_slice() {
        writeln!(
            writer,
            "Recorded {} to {} (id {})",
            piece.start, piece.end, piece.id
        )?;
        return Ok(());
    }

    writeln!(
        writer,
        "Recorded {start} to {end} as {} pieces:",
        pieces.len()
    )?;
    for piece in &pieces {
        writeln!(writer, "- {} to {} (id {})", piece.start, piece.end, piece.id)?;
    }
    Ok(())
}

/// Deletes a work record by id.
pub fn remove<W: Write>(writer: &mut W, db: &mut Database, id: i64) -> Result<()> {
    db.delete_work_record(WorkRecordId::new(id))?;
    writeln!(writer, "Removed work record {id}")?;
    Ok(())
}

/// Lists work records matching the filter.
pub fn list<W: Write>(
    writer: &mut W,
    db: &Database,
    filter: &RecordFilter,
    json: bool,
) -> Result<()> {
    let rows = db.query_work_records(filter)?;

    if json {
        for row in &rows {
            writeln!(writer, "{}", serde_json::to_string(row)?)?;
        }
        return Ok(());
    }

    if rows.is_empty() {
        writeln!(writer, "No records in range.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<6} {:<12} {:<12} {:<19} {:<19} NOTE",
        "ID", "USER", "PROJECT", "START", "END"
    )?;
    for row in &rows {
        let start = row.start.to_string();
        let end = row.end.to_string();
        writeln!(
            writer,
            "{:<6} {:<12} {:<12} {start:<19} {end:<19} {}",
            row.id,
            row.user,
            row.project,
            row.note.as_deref().unwrap_or("-")
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bill_core::Role;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn datetime(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2000, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn seeded() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        db.create_user("y1", "pw", dec!(2), &[Role::User]).unwrap();
        db.create_company("g1").unwrap();
        db.create_project("g1x1", "g1").unwrap();
        db.add_member("g1x1", "y1").unwrap();
        db.add_rate("g1x1", "y1", NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), dec!(4))
            .unwrap();
        db
    }

    #[test]
    fn add_echoes_every_split_piece() {
        let mut db = seeded();
        let mut output = Vec::new();
        add(
            &mut output,
            &mut db,
            "y1",
            "g1x1",
            datetime(2, 23),
            datetime(3, 1),
            None,
        )
        .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("as 2 pieces"));
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn list_json_emits_one_line_per_record() {
        let mut db = seeded();
        let mut sink = Vec::new();
        add(
            &mut sink,
            &mut db,
            "y1",
            "g1x1",
            datetime(2, 9),
            datetime(2, 10),
            Some("standup"),
        )
        .unwrap();

        let filter = RecordFilter {
            user: None,
            company: None,
            from: datetime(1, 0),
            to: datetime(5, 0),
            page: 0,
            per_page: 10,
        };
        let mut output = Vec::new();
        list(&mut output, &db, &filter, true).unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 1);
        let row: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(row["user"], "y1");
        assert_eq!(row["start"], "2000-01-02T09:00:00");
        assert_eq!(row["note"], "standup");
    }
}
