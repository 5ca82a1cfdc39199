//! Init command for creating the database and the built-in Admin account.

use std::io::Write;

use anyhow::Result;
use bill_core::{BUILTIN_ADMIN, Role};
use bill_db::Database;
use rust_decimal::Decimal;

/// Runs the init command.
///
/// Opening the database creates the schema. Seeding is skipped when the
/// Admin account already exists, so running init twice is safe.
pub fn run<W: Write>(writer: &mut W, db: &mut Database, admin_password: &str) -> Result<()> {
    if db.find_user(BUILTIN_ADMIN).is_ok() {
        writeln!(writer, "Already initialized.")?;
        return Ok(());
    }

    db.create_user(BUILTIN_ADMIN, admin_password, Decimal::ZERO, &[Role::Admin])?;
    writeln!(writer, "Initialized. Seeded the {BUILTIN_ADMIN} account.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_seeds_admin_once() {
        let mut db = Database::open_in_memory().unwrap();

        let mut output = Vec::new();
        run(&mut output, &mut db, "secret").unwrap();
        let admin = db.find_user(BUILTIN_ADMIN).unwrap();
        assert_eq!(admin.roles, vec![Role::Admin]);

        let mut output = Vec::new();
        run(&mut output, &mut db, "other").unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Already initialized.\n"
        );
        // The original password survives a repeated init.
        assert_eq!(
            db.find_user(BUILTIN_ADMIN).unwrap().password_digest,
            admin.password_digest
        );
    }
}
