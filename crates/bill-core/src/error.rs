//! Engine error taxonomy.
//!
//! Every failure an operation can produce is a distinct variant so callers
//! can react to the exact condition. [`EngineError::kind`] groups variants
//! into the four coarse categories a presentation layer maps to user-facing
//! codes.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{PaymentId, WorkRecordId};

/// Coarse classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced entity does not exist.
    NotFound,
    /// A domain rule rejected the operation.
    BusinessRule,
    /// A unique display name is already taken.
    DuplicateName,
    /// The input itself was malformed.
    Validation,
}

impl ErrorKind {
    /// Stable string form for logs and machine output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::BusinessRule => "business-rule",
            Self::DuplicateName => "duplicate-name",
            Self::Validation => "validation",
        }
    }
}

/// Failures produced by ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No user account with the given name.
    #[error("no such user: {name}")]
    UserNotFound { name: String },

    /// No company with the given name.
    #[error("no such company: {name}")]
    CompanyNotFound { name: String },

    /// No project with the given name.
    #[error("no such project: {name}")]
    ProjectNotFound { name: String },

    /// No work record with the given id.
    #[error("no such work record: {id}")]
    WorkRecordNotFound { id: WorkRecordId },

    /// No payment with the given id.
    #[error("no such payment: {id}")]
    PaymentNotFound { id: PaymentId },

    /// No rate has ever been recorded for the user on the project, so
    /// billable time cannot be recorded there.
    #[error("no rate on file for {user} on project {project}")]
    NoRateOnFile { user: String, project: String },

    /// No rate entry matches the exact (project, user, effective date) key.
    #[error("no rate for {user} on {project} effective {effective_from}")]
    RateNotFound {
        user: String,
        project: String,
        effective_from: NaiveDate,
    },

    /// The requested interval overlaps a committed record of the same user.
    #[error("interval {start} to {end} overlaps an existing record of {user}")]
    OverlappingRecord {
        user: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// The date lies in the company's settled period.
    #[error("{date} is on or before the settlement date {settled_through}")]
    SettledDate {
        date: NaiveDate,
        settled_through: NaiveDate,
    },

    /// The interval ends inside the company's settled period.
    #[error("interval ending {end} falls in the period settled through {settled_through}")]
    SettledInterval {
        end: NaiveDateTime,
        settled_through: NaiveDate,
    },

    /// The user is not a member of the project.
    #[error("{user} is not a member of project {project}")]
    NotAMember { user: String, project: String },

    /// The member still has work records under the project.
    #[error("{user} has work records on project {project} and cannot be removed")]
    MemberHasRecords { user: String, project: String },

    /// The project still has work records.
    #[error("project {project} still has work records")]
    ProjectHasRecords { project: String },

    /// The user still has memberships, rates, or work records.
    #[error("user {user} is still referenced by project memberships, rates, or work records")]
    UserInUse { user: String },

    /// The company still has projects.
    #[error("company {company} still has projects")]
    CompanyHasProjects { company: String },

    /// The built-in administrative account must always exist.
    #[error("the built-in administrative user cannot be deleted")]
    BuiltinAdmin,

    /// A rate for the same user, project, and effective date already exists.
    #[error("a rate for {user} on {project} effective {effective_from} already exists")]
    RateExists {
        user: String,
        project: String,
        effective_from: NaiveDate,
    },

    /// Report generation found a record no rate covers.
    #[error("no rate covers {date} for {user} on {project} (work record {record})")]
    RateUnresolved {
        record: WorkRecordId,
        user: String,
        project: String,
        date: NaiveDate,
    },

    /// A display name is already in use by another entity of the same kind.
    #[error("{what} name already in use: {name}")]
    DuplicateName { what: &'static str, name: String },

    /// The interval's start is not before its end.
    #[error("interval start {start} is not before end {end}")]
    EmptyInterval {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// Hourly amounts cannot be negative.
    #[error("hourly rate cannot be negative: {hourly}")]
    NegativeRate { hourly: Decimal },

    /// The report period's start is after its end.
    #[error("period start {start} is after period end {end}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },
}

impl EngineError {
    /// The coarse category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound { .. }
            | Self::CompanyNotFound { .. }
            | Self::ProjectNotFound { .. }
            | Self::WorkRecordNotFound { .. }
            | Self::PaymentNotFound { .. }
            | Self::NoRateOnFile { .. }
            | Self::RateNotFound { .. } => ErrorKind::NotFound,

            Self::OverlappingRecord { .. }
            | Self::SettledDate { .. }
            | Self::SettledInterval { .. }
            | Self::NotAMember { .. }
            | Self::MemberHasRecords { .. }
            | Self::ProjectHasRecords { .. }
            | Self::UserInUse { .. }
            | Self::CompanyHasProjects { .. }
            | Self::BuiltinAdmin
            | Self::RateExists { .. }
            | Self::RateUnresolved { .. } => ErrorKind::BusinessRule,

            Self::DuplicateName { .. } => ErrorKind::DuplicateName,

            Self::EmptyInterval { .. }
            | Self::InvalidPeriod { .. }
            | Self::NegativeRate { .. } => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn kinds_cover_the_four_categories() {
        assert_eq!(
            EngineError::UserNotFound {
                name: "y1".to_string()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(EngineError::BuiltinAdmin.kind(), ErrorKind::BusinessRule);
        assert_eq!(
            EngineError::DuplicateName {
                what: "company",
                name: "g1".to_string()
            }
            .kind(),
            ErrorKind::DuplicateName
        );
        assert_eq!(
            EngineError::InvalidPeriod {
                start: date(2000, 1, 2),
                end: date(2000, 1, 1),
            }
            .kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn kind_strings_are_stable() {
        assert_eq!(ErrorKind::NotFound.as_str(), "not-found");
        assert_eq!(ErrorKind::BusinessRule.as_str(), "business-rule");
        assert_eq!(ErrorKind::DuplicateName.as_str(), "duplicate-name");
        assert_eq!(ErrorKind::Validation.as_str(), "validation");
    }

    #[test]
    fn messages_name_the_offending_data() {
        let err = EngineError::SettledDate {
            date: date(2000, 1, 1),
            settled_through: date(2000, 1, 2),
        };
        assert_eq!(
            err.to_string(),
            "2000-01-01 is on or before the settlement date 2000-01-02"
        );
    }
}
