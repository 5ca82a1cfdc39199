use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bill_cli::commands::{company, init, member, payment, project, rate, record, report, user};
use bill_cli::{
    Cli, Commands, CompanyAction, Config, MemberAction, PaymentAction, ProjectAction, RateAction,
    RecordAction, UserAction,
};
use bill_db::{Database, RecordFilter, StoreError};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<Database> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    Database::open(&config.database_path).context("failed to open database")
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match dispatch(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// Prints a failure to stderr, tagging ledger rejections with their
/// category so scripts can react without parsing the message.
fn print_error(err: &anyhow::Error) {
    if let Some(StoreError::Engine(engine)) = err.downcast_ref::<StoreError>() {
        eprintln!("error[{}]: {engine}", engine.kind().as_str());
    } else {
        eprintln!("error: {err:#}");
    }
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn dispatch(cli: &Cli) -> Result<()> {
    let mut stdout = std::io::stdout();

    match &cli.command {
        Some(Commands::Init { admin_password }) => {
            let mut db = open_database(cli.config.as_deref())?;
            init::run(&mut stdout, &mut db, admin_password)?;
        }
        Some(Commands::User { action }) => {
            let mut db = open_database(cli.config.as_deref())?;
            match action {
                UserAction::Add {
                    name,
                    password,
                    hourly,
                    admin,
                } => user::add(&mut stdout, &mut db, name, password, *hourly, *admin)?,
                UserAction::Remove { name } => user::remove(&mut stdout, &mut db, name)?,
                UserAction::Passwd { name, password } => {
                    user::passwd(&mut stdout, &mut db, name, password)?;
                }
                UserAction::List => user::list(&mut stdout, &db)?,
            }
        }
        Some(Commands::Company { action }) => {
            let mut db = open_database(cli.config.as_deref())?;
            match action {
                CompanyAction::Add { name } => company::add(&mut stdout, &mut db, name)?,
                CompanyAction::Remove { name } => company::remove(&mut stdout, &mut db, name)?,
                CompanyAction::Rename { name, new_name } => {
                    company::rename(&mut stdout, &mut db, name, new_name)?;
                }
                CompanyAction::Settle { name, through } => {
                    company::settle(&mut stdout, &mut db, name, *through)?;
                }
                CompanyAction::List => company::list(&mut stdout, &db)?,
            }
        }
        Some(Commands::Project { action }) => {
            let mut db = open_database(cli.config.as_deref())?;
            match action {
                ProjectAction::Add { name, company } => {
                    project::add(&mut stdout, &mut db, name, company)?;
                }
                ProjectAction::Remove { name } => project::remove(&mut stdout, &mut db, name)?,
                ProjectAction::List => project::list(&mut stdout, &db)?,
            }
        }
        Some(Commands::Member { action }) => {
            let mut db = open_database(cli.config.as_deref())?;
            match action {
                MemberAction::Add { project, user } => {
                    member::add(&mut stdout, &mut db, project, user)?;
                }
                MemberAction::Remove { project, user } => {
                    member::remove(&mut stdout, &mut db, project, user)?;
                }
            }
        }
        Some(Commands::Rate { action }) => {
            let mut db = open_database(cli.config.as_deref())?;
            match action {
                RateAction::Add {
                    project,
                    user,
                    from,
                    hourly,
                } => rate::add(&mut stdout, &mut db, project, user, *from, *hourly)?,
                RateAction::Remove {
                    project,
                    user,
                    from,
                } => rate::remove(&mut stdout, &mut db, project, user, *from)?,
            }
        }
        Some(Commands::Record { action }) => {
            let mut db = open_database(cli.config.as_deref())?;
            match action {
                RecordAction::Add {
                    user,
                    project,
                    start,
                    end,
                    note,
                } => record::add(
                    &mut stdout,
                    &mut db,
                    user,
                    project,
                    *start,
                    *end,
                    note.as_deref(),
                )?,
                RecordAction::Remove { id } => record::remove(&mut stdout, &mut db, *id)?,
                RecordAction::List {
                    from,
                    to,
                    user,
                    company,
                    page,
                    per_page,
                    json,
                } => {
                    let filter = RecordFilter {
                        user: user.clone(),
                        company: company.clone(),
                        from: *from,
                        to: *to,
                        page: *page,
                        per_page: *per_page,
                    };
                    record::list(&mut stdout, &db, &filter, *json)?;
                }
            }
        }
        Some(Commands::Payment { action }) => {
            let mut db = open_database(cli.config.as_deref())?;
            match action {
                PaymentAction::Add {
                    company,
                    date,
                    amount,
                    note,
                } => payment::add(&mut stdout, &mut db, company, *date, *amount, note.as_deref())?,
                PaymentAction::Remove { id } => payment::remove(&mut stdout, &mut db, *id)?,
            }
        }
        Some(Commands::Report {
            company,
            from,
            to,
            json,
        }) => {
            let mut db = open_database(cli.config.as_deref())?;
            report::run(&mut stdout, &mut db, company, *from, *to, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
