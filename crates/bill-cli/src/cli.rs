//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

/// Billing ledger for contract work.
///
/// Tracks users, companies, projects, and per-project rate history. Work
/// intervals are split at day boundaries when recorded, and reports
/// reconcile accrued cost against payments per company.
#[derive(Debug, Parser)]
#[command(name = "bill", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize the database and seed the built-in Admin account.
    Init {
        /// Password for the built-in Admin account.
        #[arg(long, default_value = "admin")]
        admin_password: String,
    },

    /// Manage user accounts.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage client companies.
    Company {
        #[command(subcommand)]
        action: CompanyAction,
    },

    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage project membership.
    Member {
        #[command(subcommand)]
        action: MemberAction,
    },

    /// Manage rate history.
    Rate {
        #[command(subcommand)]
        action: RateAction,
    },

    /// Record and inspect work.
    Record {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Record payments from companies.
    Payment {
        #[command(subcommand)]
        action: PaymentAction,
    },

    /// Generate a company statement for a date period.
    Report {
        /// Company name.
        company: String,

        /// First day of the period (YYYY-MM-DD).
        #[arg(long)]
        from: NaiveDate,

        /// Last day of the period, inclusive (YYYY-MM-DD).
        #[arg(long)]
        to: NaiveDate,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// User account actions.
#[derive(Debug, Subcommand)]
pub enum UserAction {
    /// Create a user account.
    Add {
        /// Unique login name.
        name: String,

        /// Login password.
        #[arg(long)]
        password: String,

        /// Default hourly fee suggested when joining projects.
        #[arg(long, default_value = "0")]
        hourly: Decimal,

        /// Grant the administrative role as well.
        #[arg(long)]
        admin: bool,
    },

    /// Delete a user that is referenced nowhere.
    Remove {
        /// Login name.
        name: String,
    },

    /// Change a user's password.
    Passwd {
        /// Login name.
        name: String,

        /// New password.
        #[arg(long)]
        password: String,
    },

    /// List users.
    List,
}

/// Company actions.
#[derive(Debug, Subcommand)]
pub enum CompanyAction {
    /// Create a company.
    Add {
        /// Unique company name.
        name: String,
    },

    /// Delete a company that has no projects.
    Remove {
        /// Company name.
        name: String,
    },

    /// Rename a company.
    Rename {
        /// Current name.
        name: String,

        /// New name.
        new_name: String,
    },

    /// Settle the company's books through a date, freezing everything on
    /// or before it.
    Settle {
        /// Company name.
        name: String,

        /// Settlement date (YYYY-MM-DD).
        #[arg(long)]
        through: NaiveDate,
    },

    /// List companies.
    List,
}

/// Project actions.
#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Create a project under a company.
    Add {
        /// Unique project name.
        name: String,

        /// Owning company name.
        #[arg(long)]
        company: String,
    },

    /// Delete a project that has no work records.
    Remove {
        /// Project name.
        name: String,
    },

    /// List projects.
    List,
}

/// Project membership actions.
#[derive(Debug, Subcommand)]
pub enum MemberAction {
    /// Add a user to a project.
    Add {
        /// Project name.
        project: String,

        /// User name.
        user: String,
    },

    /// Remove a user from a project they have no work records on.
    Remove {
        /// Project name.
        project: String,

        /// User name.
        user: String,
    },
}

/// Rate history actions.
#[derive(Debug, Subcommand)]
pub enum RateAction {
    /// Add a rate entry for a user on a project.
    Add {
        /// Project name.
        project: String,

        /// User name.
        user: String,

        /// First day the fee applies to (YYYY-MM-DD).
        #[arg(long)]
        from: NaiveDate,

        /// Hourly fee.
        #[arg(long)]
        hourly: Decimal,
    },

    /// Remove the rate entry with the exact effective date.
    Remove {
        /// Project name.
        project: String,

        /// User name.
        user: String,

        /// Effective date of the entry to remove (YYYY-MM-DD).
        #[arg(long)]
        from: NaiveDate,
    },
}

/// Work record actions.
#[derive(Debug, Subcommand)]
pub enum RecordAction {
    /// Record a work interval; it is split at day boundaries on commit.
    Add {
        /// User name.
        user: String,

        /// Project name.
        project: String,

        /// Interval start (YYYY-MM-DDTHH:MM:SS).
        #[arg(long)]
        start: NaiveDateTime,

        /// Interval end, exclusive (YYYY-MM-DDTHH:MM:SS).
        #[arg(long)]
        end: NaiveDateTime,

        /// Free-form note stored with each piece.
        #[arg(long)]
        note: Option<String>,
    },

    /// Delete a work record outside the settled period.
    Remove {
        /// Record id.
        id: i64,
    },

    /// List work records in a time range.
    List {
        /// Range start (YYYY-MM-DDTHH:MM:SS).
        #[arg(long)]
        from: NaiveDateTime,

        /// Range end, exclusive (YYYY-MM-DDTHH:MM:SS).
        #[arg(long)]
        to: NaiveDateTime,

        /// Only records of this user.
        #[arg(long)]
        user: Option<String>,

        /// Only records billed to this company.
        #[arg(long)]
        company: Option<String>,

        /// Zero-based page number.
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Records per page.
        #[arg(long, default_value_t = 50)]
        per_page: u32,

        /// Output as JSON lines.
        #[arg(long)]
        json: bool,
    },
}

/// Payment actions.
#[derive(Debug, Subcommand)]
pub enum PaymentAction {
    /// Record a payment from a company.
    Add {
        /// Company name.
        company: String,

        /// Payment date (YYYY-MM-DD).
        #[arg(long)]
        date: NaiveDate,

        /// Amount; negative values record a correction.
        #[arg(long, allow_hyphen_values = true)]
        amount: Decimal,

        /// Free-form note.
        #[arg(long)]
        note: Option<String>,
    },

    /// Delete a payment dated outside the settled period.
    Remove {
        /// Payment id.
        id: i64,
    },
}
