//! Project membership commands.

use std::io::Write;

use anyhow::Result;
use bill_db::Database;

/// Adds a user to a project.
pub fn add<W: Write>(writer: &mut W, db: &mut Database, project: &str, user: &str) -> Result<()> {
    db.add_member(project, user)?;
    writeln!(writer, "Added {user} to {project}")?;
    Ok(())
}

/// Removes a user from a project.
pub fn remove<W: Write>(
    writer: &mut W,
    db: &mut Database,
    project: &str,
    user: &str,
) -> Result<()> {
    db.remove_member(project, user)?;
    writeln!(writer, "Removed {user} from {project}")?;
    Ok(())
}
