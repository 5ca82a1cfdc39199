//! Plain-data entities of the billing domain.
//!
//! Entities carry no behavior. Validation lives in the free functions of
//! [`crate::interval`], [`crate::rate`], and [`crate::settlement`], which
//! take entities plus explicit context and return typed errors, so every
//! rule is testable without a database.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CompanyId, PaymentId, ProjectId, Role, UserId, WorkRecordId};

/// Name of the built-in administrative account seeded at initialization.
/// It can never be deleted.
pub const BUILTIN_ADMIN: &str = "Admin";

/// A user account that can be assigned to projects and bill time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Unique login name.
    pub name: String,
    /// SHA-256 hex digest of the password. Never the plaintext.
    pub password_digest: String,
    /// Default hourly fee suggested when the user joins a project; billing
    /// itself always goes through a project rate.
    pub default_hourly: Decimal,
    pub roles: Vec<Role>,
}

/// A client company that is billed for work and sends payments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    /// Unique display name.
    pub name: String,
    /// Watermark date: everything on or before it is frozen. `None` means
    /// the company has never been settled.
    pub settled_through: Option<NaiveDate>,
}

/// A project under a company that members bill time against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// Unique display name.
    pub name: String,
    pub company_id: CompanyId,
}

/// One entry of a project's rate history: the hourly fee for a user,
/// effective from a given date until a later entry supersedes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub project_id: ProjectId,
    pub user_id: UserId,
    /// First calendar day the fee applies to.
    pub effective_from: NaiveDate,
    pub hourly: Decimal,
}

/// A committed slice of billable time, confined to one calendar day.
///
/// The end timestamp is exclusive. Records are created through the
/// splitting pipeline and never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkRecord {
    pub id: WorkRecordId,
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Money received from a company, reconciled against accrued cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub company_id: CompanyId,
    pub date: NaiveDate,
    /// Signed amount; a correction can be negative.
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
