//! Billing and ledger rules for the timesheet engine.
//!
//! This crate contains the pure domain logic:
//! - Interval splitting: cutting raw work time at calendar-day boundaries
//! - Overlap and settlement validation
//! - Rate resolution: date-effective hourly fees per user and project
//! - Report generation: opening/closing balances with itemized activity
//!
//! Nothing here touches storage. Operations read like: validate with these
//! functions, then persist the result in one transaction (see `bill-db`).

pub mod error;
pub mod interval;
pub mod model;
pub mod rate;
pub mod report;
pub mod settlement;
pub mod types;

pub use error::{EngineError, ErrorKind};
pub use interval::Interval;
pub use model::{BUILTIN_ADMIN, Company, Payment, Project, Rate, User, WorkRecord};
pub use report::{PaymentLine, Report, ReportInputs, ReportRecord, WorkLine, build_report};
pub use settlement::{ensure_after_settlement, ensure_end_after_settlement};
pub use types::{CompanyId, PaymentId, ProjectId, Role, UnknownRole, UserId, WorkRecordId};
