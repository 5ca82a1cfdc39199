//! User account commands.

use std::io::Write;

use anyhow::Result;
use bill_core::Role;
use bill_db::Database;
use rust_decimal::Decimal;

/// Creates a user account.
pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    name: &str,
    password: &str,
    hourly: Decimal,
    admin: bool,
) -> Result<()> {
    let roles: &[Role] = if admin {
        &[Role::Admin, Role::User]
    } else {
        &[Role::User]
    };
    let user = db.create_user(name, password, hourly, roles)?;
    writeln!(writer, "Created user {} (id {})", user.name, user.id)?;
    Ok(())
}

/// Deletes a user.
pub fn remove<W: Write>(writer: &mut W, db: &mut Database, name: &str) -> Result<()> {
    db.delete_user(name)?;
    writeln!(writer, "Removed user {name}")?;
    Ok(())
}

/// Changes a user's password.
pub fn passwd<W: Write>(writer: &mut W, db: &mut Database, name: &str, password: &str) -> Result<()> {
    db.change_password(name, password)?;
    writeln!(writer, "Password updated for {name}")?;
    Ok(())
}

/// Lists all users.
pub fn list<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let users = db.list_users()?;
    if users.is_empty() {
        writeln!(writer, "No users.")?;
        return Ok(());
    }

    writeln!(writer, "{:<6} {:<20} {:>8}  ROLES", "ID", "NAME", "HOURLY")?;
    for user in users {
        let roles: Vec<&str> = user.roles.iter().map(|role| role.as_str()).collect();
        writeln!(
            writer,
            "{:<6} {:<20} {:>8}  {}",
            user.id,
            user.name,
            user.default_hourly,
            roles.join(",")
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use rust_decimal_macros::dec;

    #[test]
    fn list_renders_roles_and_rates() {
        let mut db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        add(&mut output, &mut db, "root", "pw", dec!(0), true).unwrap();
        add(&mut output, &mut db, "y1", "pw", dec!(2.50), false).unwrap();

        let mut output = Vec::new();
        list(&mut output, &db).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        ID     NAME                   HOURLY  ROLES
        1      root                        0  admin,user
        2      y1                       2.50  user
        ");
    }

    #[test]
    fn list_on_empty_database() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        list(&mut output, &db).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "No users.\n");
    }
}
