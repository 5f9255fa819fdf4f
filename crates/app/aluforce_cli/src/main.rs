// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::io::{self, Write};
use std::sync::Arc;

use aluforce_core::auth::store::{MySqlUserStore, UserStore};
use aluforce_core::config;
use aluforce_core::db::DbSettings;
use clap::Parser;
use cli::{Cli, Commands};

mod cli;
mod commands;
mod logging;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init()?;

    let args = Cli::parse();

    if !args.command.needs_database() {
        let mut out = io::stdout().lock();
        match &args.command {
            Commands::HashPassword { cost } => {
                commands::hash_password(*cost, &mut io::stdin().lock(), &mut out)?;
            }
            Commands::Version => {
                writeln!(out, "{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
            }
            _ => {}
        }
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_database_command(args.command))
}

async fn run_database_command(command: Commands) -> Result<()> {
    let settings = DbSettings::from_env()?;
    log::debug!("connecting to {}:{}/{}", settings.host, settings.port, settings.database);
    let store: Arc<dyn UserStore> = Arc::new(MySqlUserStore::new(settings.connect_lazy()));
    let mut out = io::stdout().lock();

    match command {
        Commands::SetPassword { email, temporary } => {
            let mut input = io::stdin().lock();
            commands::set_password(store.as_ref(), &email, temporary, &mut input).await?;
        }
        Commands::SetStatus { email, status } => {
            commands::set_status(store.as_ref(), &email, status, &mut out).await?;
        }
        Commands::Grant { email, module } => {
            commands::grant(store.as_ref(), &email, module, &mut out).await?;
        }
        Commands::Revoke { email, module } => {
            commands::revoke(store.as_ref(), &email, module, &mut out).await?;
        }
        Commands::Modules { email } => {
            let policy = config::policy_from_env()?;
            commands::modules(store, policy, &email, &mut out).await?;
        }
        Commands::HashPassword { .. } | Commands::Version => {}
    }
    Ok(())
}
