//! Billing CLI library.
//!
//! This crate provides the command-line interface for the billing ledger.

mod cli;
pub mod commands;
mod config;

pub use cli::{
    Cli, Commands, CompanyAction, MemberAction, PaymentAction, ProjectAction, RateAction,
    RecordAction, UserAction,
};
pub use config::Config;
