//! Project commands.

use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use bill_db::Database;

/// Creates a project under a company.
pub fn add<W: Write>(writer: &mut W, db: &mut Database, name: &str, company: &str) -> Result<()> {
    let project = db.create_project(name, company)?;
    writeln!(
        writer,
        "Created project {} under {company} (id {})",
        project.name, project.id
    )?;
    Ok(())
}

/// Deletes a project without work records.
pub fn remove<W: Write>(writer: &mut W, db: &mut Database, name: &str) -> Result<()> {
    db.delete_project(name)?;
    writeln!(writer, "Removed project {name}")?;
    Ok(())
}

/// Lists all projects with their owning company.
pub fn list<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let projects = db.list_projects()?;
    if projects.is_empty() {
        writeln!(writer, "No projects.")?;
        return Ok(());
    }

    let companies: HashMap<_, _> = db
        .list_companies()?
        .into_iter()
        .map(|company| (company.id, company.name))
        .collect();

    writeln!(writer, "{:<6} {:<20} COMPANY", "ID", "NAME")?;
    for project in projects {
        let company = companies
            .get(&project.company_id)
            .map_or("?", String::as_str);
        writeln!(writer, "{:<6} {:<20} {company}", project.id, project.name)?;
    }
    Ok(())
}
