//! Storage layer for the billing engine.
//!
//! Provides persistence for users, companies, projects, rates, work records,
//! and payments using `rusqlite`. Every mutation runs in a transaction and
//! enforces the ledger rules from [`bill_core`] before touching a row, so a
//! rejected operation leaves the database untouched.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. This means a `Database` instance can be moved between threads
//! but cannot be shared across threads without external synchronization.
//!
//! For multi-threaded access, either:
//! - Use a `Mutex<Database>` to serialize access
//! - Create a connection pool (e.g., with `r2d2`)
//! - Use separate `Database` instances per thread
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Work record bounds are stored as TEXT in ISO 8601 format without a zone
//! (e.g., `2000-01-01T10:01:00`), dates as `2000-01-01`. The ledger operates
//! on civil wall-clock time, and the fixed-width format keeps lexicographic
//! ordering aligned with chronological ordering, so range scans and the
//! overlap check run directly on the TEXT columns.
//!
//! ## Money
//!
//! Hourly fees and payment amounts are stored as TEXT and parsed into
//! [`rust_decimal::Decimal`]. Totals are summed in Rust rather than with SQL
//! aggregates, which would round-trip through floating point.

use std::path::Path;

use bill_core::{
    BUILTIN_ADMIN, Company, CompanyId, EngineError, Interval, Payment, PaymentId, PaymentLine,
    Project, ProjectId, Rate, Report, ReportInputs, ReportRecord, Role, User, UserId, WorkRecord,
    WorkRecordId, build_report, ensure_after_settlement, ensure_end_after_settlement,
};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A ledger rule rejected the operation.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to encode a JSON column.
    #[error("json encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    /// A stored column failed to parse back into its model type.
    #[error("invalid {field} in {table} row {id}: {value}")]
    InvalidStored {
        table: &'static str,
        field: &'static str,
        id: i64,
        value: String,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Filters for [`Database::query_work_records`].
///
/// `from` and `to` bound record start times as a half-open range
/// `[from, to)`. Pages are zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub user: Option<String>,
    pub company: Option<String>,
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    pub page: u32,
    pub per_page: u32,
}

/// A work record joined with its user and project names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkRecordRow {
    pub id: WorkRecordId,
    pub user: String,
    pub project: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                password_digest TEXT NOT NULL,
                default_hourly TEXT NOT NULL,
                roles TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS companies (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                settled_through TEXT
            );

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                company_id INTEGER NOT NULL REFERENCES companies(id)
            );

            CREATE TABLE IF NOT EXISTS project_members (
                project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                user_id INTEGER NOT NULL REFERENCES users(id),
                PRIMARY KEY (project_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS rates (
                id INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                user_id INTEGER NOT NULL REFERENCES users(id),
                effective_from TEXT NOT NULL,
                hourly TEXT NOT NULL,
                UNIQUE (project_id, user_id, effective_from)
            );

            CREATE TABLE IF NOT EXISTS work_records (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                project_id INTEGER NOT NULL REFERENCES projects(id),
                started_at TEXT NOT NULL,
                ended_at TEXT NOT NULL,
                note TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_work_records_user_time
                ON work_records (user_id, started_at);

            CREATE TABLE IF NOT EXISTS payments (
                id INTEGER PRIMARY KEY,
                company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                amount TEXT NOT NULL,
                note TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_payments_company_date
                ON payments (company_id, date);
            ",
        )?;
        Ok(())
    }

    /// Looks up a user by name.
    pub fn find_user(&self, name: &str) -> Result<User, StoreError> {
        user_by_name(&self.conn, name)
    }

    /// Looks up a company by name.
    pub fn find_company(&self, name: &str) -> Result<Company, StoreError> {
        company_by_name(&self.conn, name)
    }

    /// Looks up a project by name.
    pub fn find_project(&self, name: &str) -> Result<Project, StoreError> {
        project_by_name(&self.conn, name)
    }

    /// Fetches a single work record by id.
    pub fn get_work_record(&self, id: WorkRecordId) -> Result<WorkRecord, StoreError> {
        work_record_by_id(&self.conn, id)
    }

    /// Fetches a single payment by id.
    pub fn get_payment(&self, id: PaymentId) -> Result<Payment, StoreError> {
        payment_by_id(&self.conn, id)
    }

    /// Lists all users ordered by id.
    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, password_digest, default_hourly, roles FROM users ORDER BY id",
        )?;
        let rows = stmt.query_map([], read_user_row)?;
        let mut users = Vec::new();
        for row in rows {
            users.push(user_from_row(row?)?);
        }
        Ok(users)
    }

    /// Lists all companies ordered by id.
    pub fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, settled_through FROM companies ORDER BY id")?;
        let rows = stmt.query_map([], read_company_row)?;
        let mut companies = Vec::new();
        for row in rows {
            companies.push(company_from_row(row?)?);
        }
        Ok(companies)
    }

    /// Lists all projects ordered by id.
    pub fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, company_id FROM projects ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Project {
                id: ProjectId::new(row.get(0)?),
                name: row.get(1)?,
                company_id: CompanyId::new(row.get(2)?),
            })
        })?;
        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }

    /// Creates a user account.
    ///
    /// The password is stored as a SHA-256 hex digest, never in plaintext.
    pub fn create_user(
        &mut self,
        name: &str,
        secret: &str,
        default_hourly: Decimal,
        roles: &[Role],
    ) -> Result<User, StoreError> {
        if default_hourly < Decimal::ZERO {
            return Err(EngineError::NegativeRate {
                hourly: default_hourly,
            }
            .into());
        }
        let tx = self.conn.transaction()?;
        if exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM users WHERE name = ?1)",
            params![name],
        )? {
            return Err(EngineError::DuplicateName {
                what: "user",
                name: name.to_string(),
            }
            .into());
        }
        let digest = password_digest(secret);
        let roles_json = serde_json::to_string(roles)?;
        tx.execute(
            "INSERT INTO users (name, password_digest, default_hourly, roles)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, digest, default_hourly.to_string(), roles_json],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!(user = name, "created user");
        Ok(User {
            id: UserId::new(id),
            name: name.to_string(),
            password_digest: digest,
            default_hourly,
            roles: roles.to_vec(),
        })
    }

    /// Replaces a user's password digest.
    pub fn change_password(&mut self, name: &str, secret: &str) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let user = user_by_name(&tx, name)?;
        tx.execute(
            "UPDATE users SET password_digest = ?1 WHERE id = ?2",
            params![password_digest(secret), user.id.get()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Deletes a user that is not referenced anywhere.
    ///
    /// The built-in administrative account can never be deleted. A user with
    /// project memberships, rates, or work records is rejected.
    pub fn delete_user(&mut self, name: &str) -> Result<(), StoreError> {
        if name == BUILTIN_ADMIN {
            return Err(EngineError::BuiltinAdmin.into());
        }
        let tx = self.conn.transaction()?;
        let user = user_by_name(&tx, name)?;
        let referenced = exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM project_members WHERE user_id = ?1)
                 OR EXISTS(SELECT 1 FROM rates WHERE user_id = ?1)
                 OR EXISTS(SELECT 1 FROM work_records WHERE user_id = ?1)",
            params![user.id.get()],
        )?;
        if referenced {
            return Err(EngineError::UserInUse {
                user: name.to_string(),
            }
            .into());
        }
        tx.execute("DELETE FROM users WHERE id = ?1", params![user.id.get()])?;
        tx.commit()?;
        debug!(user = name, "deleted user");
        Ok(())
    }

    /// Creates a company with no settlement watermark.
    pub fn create_company(&mut self, name: &str) -> Result<Company, StoreError> {
        let tx = self.conn.transaction()?;
        if exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM companies WHERE name = ?1)",
            params![name],
        )? {
            return Err(EngineError::DuplicateName {
                what: "company",
                name: name.to_string(),
            }
            .into());
        }
        tx.execute("INSERT INTO companies (name) VALUES (?1)", params![name])?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!(company = name, "created company");
        Ok(Company {
            id: CompanyId::new(id),
            name: name.to_string(),
            settled_through: None,
        })
    }

    /// Renames a company.
    pub fn rename_company(&mut self, name: &str, new_name: &str) -> Result<Company, StoreError> {
        let tx = self.conn.transaction()?;
        let company = company_by_name(&tx, name)?;
        if exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM companies WHERE name = ?1 AND id <> ?2)",
            params![new_name, company.id.get()],
        )? {
            return Err(EngineError::DuplicateName {
                what: "company",
                name: new_name.to_string(),
            }
            .into());
        }
        tx.execute(
            "UPDATE companies SET name = ?1 WHERE id = ?2",
            params![new_name, company.id.get()],
        )?;
        tx.commit()?;
        Ok(Company {
            name: new_name.to_string(),
            ..company
        })
    }

    /// Moves the company's settlement watermark.
    ///
    /// Everything dated on or before the watermark becomes frozen. The
    /// watermark itself can move in either direction.
    pub fn set_settlement_date(
        &mut self,
        name: &str,
        date: NaiveDate,
    ) -> Result<Company, StoreError> {
        let tx = self.conn.transaction()?;
        let company = company_by_name(&tx, name)?;
        tx.execute(
            "UPDATE companies SET settled_through = ?1 WHERE id = ?2",
            params![format_date(date), company.id.get()],
        )?;
        tx.commit()?;
        debug!(company = name, date = %date, "settled company");
        Ok(Company {
            settled_through: Some(date),
            ..company
        })
    }

    /// Deletes a company that has no projects. Its payments go with it.
    pub fn delete_company(&mut self, name: &str) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let company = company_by_name(&tx, name)?;
        if exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM projects WHERE company_id = ?1)",
            params![company.id.get()],
        )? {
            return Err(EngineError::CompanyHasProjects {
                company: name.to_string(),
            }
            .into());
        }
        tx.execute(
            "DELETE FROM companies WHERE id = ?1",
            params![company.id.get()],
        )?;
        tx.commit()?;
        debug!(company = name, "deleted company");
        Ok(())
    }

    /// Creates a project under a company.
    pub fn create_project(&mut self, name: &str, company: &str) -> Result<Project, StoreError> {
        let tx = self.conn.transaction()?;
        let company_row = company_by_name(&tx, company)?;
        if exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM projects WHERE name = ?1)",
            params![name],
        )? {
            return Err(EngineError::DuplicateName {
                what: "project",
                name: name.to_string(),
            }
            .into());
        }
        tx.execute(
            "INSERT INTO projects (name, company_id) VALUES (?1, ?2)",
            params![name, company_row.id.get()],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!(project = name, company, "created project");
        Ok(Project {
            id: ProjectId::new(id),
            name: name.to_string(),
            company_id: company_row.id,
        })
    }

    /// Deletes a project that has no work records.
    ///
    /// Memberships and rates under the project are removed with it.
    pub fn delete_project(&mut self, name: &str) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let project = project_by_name(&tx, name)?;
        if exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM work_records WHERE project_id = ?1)",
            params![project.id.get()],
        )? {
            return Err(EngineError::ProjectHasRecords {
                project: name.to_string(),
            }
            .into());
        }
        tx.execute(
            "DELETE FROM projects WHERE id = ?1",
            params![project.id.get()],
        )?;
        tx.commit()?;
        debug!(project = name, "deleted project");
        Ok(())
    }

    /// Adds a user to a project. Adding an existing member is a no-op.
    pub fn add_member(&mut self, project: &str, user: &str) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let project_row = project_by_name(&tx, project)?;
        let user_row = user_by_name(&tx, user)?;
        tx.execute(
            "INSERT OR IGNORE INTO project_members (project_id, user_id) VALUES (?1, ?2)",
            params![project_row.id.get(), user_row.id.get()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Removes a user from a project.
    ///
    /// Rejected while the user still has work records on the project.
    /// Removing a non-member is a no-op.
    pub fn remove_member(&mut self, project: &str, user: &str) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let project_row = project_by_name(&tx, project)?;
        let user_row = user_by_name(&tx, user)?;
        if exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM work_records WHERE project_id = ?1 AND user_id = ?2)",
            params![project_row.id.get(), user_row.id.get()],
        )? {
            return Err(EngineError::MemberHasRecords {
                user: user.to_string(),
                project: project.to_string(),
            }
            .into());
        }
        tx.execute(
            "DELETE FROM project_members WHERE project_id = ?1 AND user_id = ?2",
            params![project_row.id.get(), user_row.id.get()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Adds a rate history entry for a user on a project.
    ///
    /// The effective date must lie after the company's settlement watermark,
    /// and only one entry may exist per (project, user, effective date).
    pub fn add_rate(
        &mut self,
        project: &str,
        user: &str,
        effective_from: NaiveDate,
        hourly: Decimal,
    ) -> Result<Rate, StoreError> {
        if hourly < Decimal::ZERO {
            return Err(EngineError::NegativeRate { hourly }.into());
        }
        let tx = self.conn.transaction()?;
        let project_row = project_by_name(&tx, project)?;
        let user_row = user_by_name(&tx, user)?;
        let settled = settled_through_of(&tx, project_row.company_id)?;
        ensure_after_settlement(settled, effective_from)?;
        if exists(
            &tx,
            "SELECT EXISTS(
                SELECT 1 FROM rates
                WHERE project_id = ?1 AND user_id = ?2 AND effective_from = ?3
            )",
            params![
                project_row.id.get(),
                user_row.id.get(),
                format_date(effective_from)
            ],
        )? {
            return Err(EngineError::RateExists {
                user: user.to_string(),
                project: project.to_string(),
                effective_from,
            }
            .into());
        }
        tx.execute(
            "INSERT INTO rates (project_id, user_id, effective_from, hourly)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                project_row.id.get(),
                user_row.id.get(),
                format_date(effective_from),
                hourly.to_string()
            ],
        )?;
        tx.commit()?;
        debug!(user, project, effective_from = %effective_from, "added rate");
        Ok(Rate {
            project_id: project_row.id,
            user_id: user_row.id,
            effective_from,
            hourly,
        })
    }

    /// Removes the rate entry with the exact (project, user, effective date)
    /// key.
    ///
    /// Rejected while the effective date lies in the company's settled
    /// period.
    pub fn remove_rate(
        &mut self,
        project: &str,
        user: &str,
        effective_from: NaiveDate,
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let project_row = project_by_name(&tx, project)?;
        let user_row = user_by_name(&tx, user)?;
        let settled = settled_through_of(&tx, project_row.company_id)?;
        ensure_after_settlement(settled, effective_from)?;
        let removed = tx.execute(
            "DELETE FROM rates WHERE project_id = ?1 AND user_id = ?2 AND effective_from = ?3",
            params![
                project_row.id.get(),
                user_row.id.get(),
                format_date(effective_from)
            ],
        )?;
        if removed == 0 {
            return Err(EngineError::RateNotFound {
                user: user.to_string(),
                project: project.to_string(),
                effective_from,
            }
            .into());
        }
        tx.commit()?;
        Ok(())
    }

    /// Records a work interval for a project member.
    ///
    /// The interval is validated as a whole: the user must be a member with
    /// some rate on file, the end must clear the company's settlement
    /// watermark, and the original bounds must not overlap any committed
    /// record of the same user. Only then is it split at day boundaries and
    /// stored as one row per calendar day touched. Returns the stored
    /// pieces in order.
    pub fn create_work_record(
        &mut self,
        user: &str,
        project: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        note: Option<&str>,
    ) -> Result<Vec<WorkRecord>, StoreError> {
        let tx = self.conn.transaction()?;
        let user_row = user_by_name(&tx, user)?;
        let project_row = project_by_name(&tx, project)?;
        if !exists(
            &tx,
            "SELECT EXISTS(
                SELECT 1 FROM project_members WHERE project_id = ?1 AND user_id = ?2
            )",
            params![project_row.id.get(), user_row.id.get()],
        )? {
            return Err(EngineError::NotAMember {
                user: user.to_string(),
                project: project.to_string(),
            }
            .into());
        }
        if !exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM rates WHERE project_id = ?1 AND user_id = ?2)",
            params![project_row.id.get(), user_row.id.get()],
        )? {
            return Err(EngineError::NoRateOnFile {
                user: user.to_string(),
                project: project.to_string(),
            }
            .into());
        }
        let interval = Interval::new(start, end)?;
        let settled = settled_through_of(&tx, project_row.company_id)?;
        ensure_end_after_settlement(settled, end)?;
        if has_overlap(&tx, user_row.id, interval)? {
            return Err(EngineError::OverlappingRecord {
                user: user.to_string(),
                start,
                end,
            }
            .into());
        }
        let mut records = Vec::new();
        for piece in interval.split_by_day() {
            tx.execute(
                "INSERT INTO work_records (user_id, project_id, started_at, ended_at, note)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user_row.id.get(),
                    project_row.id.get(),
                    format_datetime(piece.start()),
                    format_datetime(piece.end()),
                    note
                ],
            )?;
            records.push(WorkRecord {
                id: WorkRecordId::new(tx.last_insert_rowid()),
                user_id: user_row.id,
                project_id: project_row.id,
                start: piece.start(),
                end: piece.end(),
                note: note.map(ToString::to_string),
            });
        }
        tx.commit()?;
        debug!(user, project, pieces = records.len(), "created work record");
        Ok(records)
    }

    /// Deletes a work record outside the settled period.
    pub fn delete_work_record(&mut self, id: WorkRecordId) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let record = work_record_by_id(&tx, id)?;
        let company = project_company_of(&tx, record.project_id)?;
        let settled = settled_through_of(&tx, company)?;
        ensure_after_settlement(settled, record.start.date())?;
        tx.execute("DELETE FROM work_records WHERE id = ?1", params![id.get()])?;
        tx.commit()?;
        debug!(id = id.get(), "deleted work record");
        Ok(())
    }

    /// Records a payment from a company. Amounts are signed; a correction
    /// can be negative.
    pub fn create_payment(
        &mut self,
        company: &str,
        date: NaiveDate,
        amount: Decimal,
        note: Option<&str>,
    ) -> Result<Payment, StoreError> {
        let tx = self.conn.transaction()?;
        let company_row = company_by_name(&tx, company)?;
        ensure_after_settlement(company_row.settled_through, date)?;
        tx.execute(
            "INSERT INTO payments (company_id, date, amount, note) VALUES (?1, ?2, ?3, ?4)",
            params![
                company_row.id.get(),
                format_date(date),
                amount.to_string(),
                note
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!(company, date = %date, "recorded payment");
        Ok(Payment {
            id: PaymentId::new(id),
            company_id: company_row.id,
            date,
            amount,
            note: note.map(ToString::to_string),
        })
    }

    /// Deletes a payment dated outside the settled period.
    pub fn delete_payment(&mut self, id: PaymentId) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let payment = payment_by_id(&tx, id)?;
        let settled = settled_through_of(&tx, payment.company_id)?;
        ensure_after_settlement(settled, payment.date)?;
        tx.execute("DELETE FROM payments WHERE id = ?1", params![id.get()])?;
        tx.commit()?;
        debug!(id = id.get(), "deleted payment");
        Ok(())
    }

    /// Lists work records matching the filter, ordered by start time then
    /// id.
    ///
    /// Filter names that match no user or company simply match no records.
    pub fn query_work_records(
        &self,
        filter: &RecordFilter,
    ) -> Result<Vec<WorkRecordRow>, StoreError> {
        let mut sql = String::from(
            "SELECT w.id, u.name, p.name, w.started_at, w.ended_at, w.note
               FROM work_records w
               JOIN users u ON u.id = w.user_id
               JOIN projects p ON p.id = w.project_id
              WHERE w.started_at >= ? AND w.started_at < ?",
        );
        let mut binds: Vec<Value> = vec![
            Value::Text(format_datetime(filter.from)),
            Value::Text(format_datetime(filter.to)),
        ];
        if let Some(user) = &filter.user {
            sql.push_str(" AND u.name = ?");
            binds.push(Value::Text(user.clone()));
        }
        if let Some(company) = &filter.company {
            sql.push_str(" AND p.company_id = (SELECT id FROM companies WHERE name = ?)");
            binds.push(Value::Text(company.clone()));
        }
        sql.push_str(" ORDER BY w.started_at, w.id LIMIT ? OFFSET ?");
        binds.push(Value::Integer(i64::from(filter.per_page)));
        binds.push(Value::Integer(
            i64::from(filter.per_page) * i64::from(filter.page),
        ));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let started_at: String = row.get(3)?;
            let ended_at: String = row.get(4)?;
            records.push(WorkRecordRow {
                id: WorkRecordId::new(id),
                user: row.get(1)?,
                project: row.get(2)?,
                start: parse_datetime("work_records", "started_at", id, &started_at)?,
                end: parse_datetime("work_records", "ended_at", id, &ended_at)?,
                note: row.get(5)?,
            });
        }
        Ok(records)
    }

    /// Builds the ledger report for a company over an inclusive date
    /// period.
    ///
    /// All inputs are read inside one transaction so the report reflects a
    /// single consistent snapshot.
    pub fn generate_report(
        &mut self,
        company: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Report, StoreError> {
        if from > to {
            return Err(EngineError::InvalidPeriod {
                start: from,
                end: to,
            }
            .into());
        }
        let tx = self.conn.transaction()?;
        let company_row = company_by_name(&tx, company)?;
        let inputs = ReportInputs {
            period_start: from,
            period_end: to,
            records: report_records(&tx, company_row.id, to)?,
            rates: rates_for_company(&tx, company_row.id)?,
            payments: payments_in_period(&tx, company_row.id, from, to)?,
            payments_through_start: payments_total_through(&tx, company_row.id, from)?,
            payments_through_end: payments_total_through(&tx, company_row.id, to)?,
        };
        tx.commit()?;
        debug!(company, from = %from, to = %to, "generated report");
        Ok(build_report(&inputs)?)
    }
}

/// Hex-encoded SHA-256 digest of a password.
#[must_use]
pub fn password_digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_datetime(datetime: NaiveDateTime) -> String {
    datetime.format(DATETIME_FORMAT).to_string()
}

fn parse_date(
    table: &'static str,
    field: &'static str,
    id: i64,
    raw: &str,
) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| StoreError::InvalidStored {
        table,
        field,
        id,
        value: raw.to_string(),
    })
}

fn parse_datetime(
    table: &'static str,
    field: &'static str,
    id: i64,
    raw: &str,
) -> Result<NaiveDateTime, StoreError> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).map_err(|_| StoreError::InvalidStored {
        table,
        field,
        id,
        value: raw.to_string(),
    })
}

fn parse_decimal(
    table: &'static str,
    field: &'static str,
    id: i64,
    raw: &str,
) -> Result<Decimal, StoreError> {
    raw.parse().map_err(|_| StoreError::InvalidStored {
        table,
        field,
        id,
        value: raw.to_string(),
    })
}

fn parse_roles(id: i64, raw: &str) -> Result<Vec<Role>, StoreError> {
    serde_json::from_str(raw).map_err(|_| StoreError::InvalidStored {
        table: "users",
        field: "roles",
        id,
        value: raw.to_string(),
    })
}

fn exists<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<bool, StoreError> {
    let found: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(found != 0)
}

type UserRow = (i64, String, String, String, String);

fn read_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn user_from_row(row: UserRow) -> Result<User, StoreError> {
    let (id, name, password_digest, default_hourly, roles) = row;
    Ok(User {
        id: UserId::new(id),
        name,
        password_digest,
        default_hourly: parse_decimal("users", "default_hourly", id, &default_hourly)?,
        roles: parse_roles(id, &roles)?,
    })
}

fn user_by_name(conn: &Connection, name: &str) -> Result<User, StoreError> {
    conn.query_row(
        "SELECT id, name, password_digest, default_hourly, roles FROM users WHERE name = ?1",
        params![name],
        read_user_row,
    )
    .optional()?
    .map(user_from_row)
    .transpose()?
    .ok_or_else(|| {
        EngineError::UserNotFound {
            name: name.to_string(),
        }
        .into()
    })
}

type CompanyRow = (i64, String, Option<String>);

fn read_company_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CompanyRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn company_from_row(row: CompanyRow) -> Result<Company, StoreError> {
    let (id, name, settled_through) = row;
    Ok(Company {
        id: CompanyId::new(id),
        name,
        settled_through: settled_through
            .map(|raw| parse_date("companies", "settled_through", id, &raw))
            .transpose()?,
    })
}

fn company_by_name(conn: &Connection, name: &str) -> Result<Company, StoreError> {
    conn.query_row(
        "SELECT id, name, settled_through FROM companies WHERE name = ?1",
        params![name],
        read_company_row,
    )
    .optional()?
    .map(company_from_row)
    .transpose()?
    .ok_or_else(|| {
        EngineError::CompanyNotFound {
            name: name.to_string(),
        }
        .into()
    })
}

fn settled_through_of(
    conn: &Connection,
    company: CompanyId,
) -> Result<Option<NaiveDate>, StoreError> {
    let raw: Option<String> = conn.query_row(
        "SELECT settled_through FROM companies WHERE id = ?1",
        params![company.get()],
        |row| row.get(0),
    )?;
    raw.map(|value| parse_date("companies", "settled_through", company.get(), &value))
        .transpose()
}

fn project_by_name(conn: &Connection, name: &str) -> Result<Project, StoreError> {
    conn.query_row(
        "SELECT id, name, company_id FROM projects WHERE name = ?1",
        params![name],
        |row| {
            Ok(Project {
                id: ProjectId::new(row.get(0)?),
                name: row.get(1)?,
                company_id: CompanyId::new(row.get(2)?),
            })
        },
    )
    .optional()?
    .ok_or_else(|| {
        EngineError::ProjectNotFound {
            name: name.to_string(),
        }
        .into()
    })
}

fn project_company_of(conn: &Connection, project: ProjectId) -> Result<CompanyId, StoreError> {
    let id: i64 = conn.query_row(
        "SELECT company_id FROM projects WHERE id = ?1",
        params![project.get()],
        |row| row.get(0),
    )?;
    Ok(CompanyId::new(id))
}

type RawWorkRecord = (i64, i64, i64, String, String, Option<String>);

fn read_work_record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawWorkRecord> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn work_record_from_row(row: RawWorkRecord) -> Result<WorkRecord, StoreError> {
    let (id, user_id, project_id, started_at, ended_at, note) = row;
    Ok(WorkRecord {
        id: WorkRecordId::new(id),
        user_id: UserId::new(user_id),
        project_id: ProjectId::new(project_id),
        start: parse_datetime("work_records", "started_at", id, &started_at)?,
        end: parse_datetime("work_records", "ended_at", id, &ended_at)?,
        note,
    })
}

fn work_record_by_id(conn: &Connection, id: WorkRecordId) -> Result<WorkRecord, StoreError> {
    conn.query_row(
        "SELECT id, user_id, project_id, started_at, ended_at, note
           FROM work_records WHERE id = ?1",
        params![id.get()],
        read_work_record_row,
    )
    .optional()?
    .map(work_record_from_row)
    .transpose()?
    .ok_or_else(|| EngineError::WorkRecordNotFound { id }.into())
}

fn payment_by_id(conn: &Connection, id: PaymentId) -> Result<Payment, StoreError> {
    let row: Option<(i64, i64, String, String, Option<String>)> = conn
        .query_row(
            "SELECT id, company_id, date, amount, note FROM payments WHERE id = ?1",
            params![id.get()],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )
        .optional()?;
    let Some((row_id, company_id, date, amount, note)) = row else {
        return Err(EngineError::PaymentNotFound { id }.into());
    };
    Ok(Payment {
        id: PaymentId::new(row_id),
        company_id: CompanyId::new(company_id),
        date: parse_date("payments", "date", row_id, &date)?,
        amount: parse_decimal("payments", "amount", row_id, &amount)?,
        note,
    })
}

/// Overlap test against the user's committed records, on the original
/// interval bounds. Half-open semantics: touching endpoints do not
/// overlap.
fn has_overlap(conn: &Connection, user: UserId, interval: Interval) -> Result<bool, StoreError> {
    exists(
        conn,
        "SELECT EXISTS(
            SELECT 1 FROM work_records
            WHERE user_id = ?1 AND started_at < ?2 AND ended_at > ?3
        )",
        params![
            user.get(),
            format_datetime(interval.end()),
            format_datetime(interval.start())
        ],
    )
}

/// Every record of the company starting before the day after `through`,
/// joined with display names. Includes records older than any report
/// window, which the opening balance needs.
fn report_records(
    conn: &Connection,
    company: CompanyId,
    through: NaiveDate,
) -> Result<Vec<ReportRecord>, StoreError> {
    let cutoff = (through + Days::new(1)).and_time(NaiveTime::MIN);
    let mut stmt = conn.prepare(
        "SELECT w.id, w.user_id, w.project_id, u.name, p.name, w.started_at, w.ended_at
           FROM work_records w
           JOIN users u ON u.id = w.user_id
           JOIN projects p ON p.id = w.project_id
          WHERE p.company_id = ?1 AND w.started_at < ?2
          ORDER BY w.started_at, w.id",
    )?;
    let rows = stmt.query_map(
        params![company.get(), format_datetime(cutoff)],
        |row| -> rusqlite::Result<(i64, i64, i64, String, String, String, String)> {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        },
    )?;
    let mut records = Vec::new();
    for row in rows {
        let (id, user_id, project_id, user_name, project_name, started_at, ended_at) = row?;
        records.push(ReportRecord {
            id: WorkRecordId::new(id),
            user_id: UserId::new(user_id),
            project_id: ProjectId::new(project_id),
            user_name,
            project_name,
            start: parse_datetime("work_records", "started_at", id, &started_at)?,
            end: parse_datetime("work_records", "ended_at", id, &ended_at)?,
        });
    }
    Ok(records)
}

fn rates_for_company(conn: &Connection, company: CompanyId) -> Result<Vec<Rate>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.project_id, r.user_id, r.effective_from, r.hourly
           FROM rates r
           JOIN projects p ON p.id = r.project_id
          WHERE p.company_id = ?1",
    )?;
    let rows = stmt.query_map(
        params![company.get()],
        |row| -> rusqlite::Result<(i64, i64, i64, String, String)> {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        },
    )?;
    let mut rates = Vec::new();
    for row in rows {
        let (id, project_id, user_id, effective_from, hourly) = row?;
        rates.push(Rate {
            project_id: ProjectId::new(project_id),
            user_id: UserId::new(user_id),
            effective_from: parse_date("rates", "effective_from", id, &effective_from)?,
            hourly: parse_decimal("rates", "hourly", id, &hourly)?,
        });
    }
    Ok(rates)
}

/// Payments itemized in the window, both end dates included.
fn payments_in_period(
    conn: &Connection,
    company: CompanyId,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<PaymentLine>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, date, amount, note FROM payments
          WHERE company_id = ?1 AND date >= ?2 AND date <= ?3
          ORDER BY date, id",
    )?;
    let rows = stmt.query_map(
        params![company.get(), format_date(from), format_date(to)],
        |row| -> rusqlite::Result<(i64, String, String, Option<String>)> {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        },
    )?;
    let mut payments = Vec::new();
    for row in rows {
        let (id, date, amount, note) = row?;
        payments.push(PaymentLine {
            date: parse_date("payments", "date", id, &date)?,
            amount: parse_decimal("payments", "amount", id, &amount)?,
            note,
        });
    }
    Ok(payments)
}

/// Sum of all payment amounts dated up to and including `through`, summed
/// as decimals.
fn payments_total_through(
    conn: &Connection,
    company: CompanyId,
    through: NaiveDate,
) -> Result<Decimal, StoreError> {
    let mut stmt =
        conn.prepare("SELECT id, amount FROM payments WHERE company_id = ?1 AND date <= ?2")?;
    let rows = stmt.query_map(
        params![company.get(), format_date(through)],
        |row| -> rusqlite::Result<(i64, String)> { Ok((row.get(0)?, row.get(1)?)) },
    )?;
    let mut total = Decimal::ZERO;
    for row in rows {
        let (id, amount) = row?;
        total += parse_decimal("payments", "amount", id, &amount)?;
    }
    Ok(total)
}
