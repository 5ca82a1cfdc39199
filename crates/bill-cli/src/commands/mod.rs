//! CLI subcommand implementations.

pub mod company;
pub mod init;
pub mod member;
pub mod payment;
pub mod project;
pub mod rate;
pub mod record;
pub mod report;
pub mod user;
