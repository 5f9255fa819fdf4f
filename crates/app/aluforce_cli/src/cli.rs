use aluforce_core::auth::password::BCRYPT_COST;
use aluforce_core::models::auth::{Module, UserStatus};
use clap::{Parser, Subcommand};

/// Aluforce account administration.
///
/// Database commands read `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`
/// and `DB_NAME` from the environment or `.env`. Passwords are read from
/// stdin and never echoed.
#[derive(Parser, Debug)]
#[command(name = "aluforce_cli", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a bcrypt hash of the password given on stdin
    HashPassword {
        /// bcrypt cost factor
        #[arg(long, default_value_t = BCRYPT_COST)]
        cost: u32,
    },

    /// Replace a user's password with the one given on stdin
    SetPassword {
        #[arg(long)]
        email: String,
        /// Make the user choose a new password after the next login
        #[arg(long)]
        temporary: bool,
    },

    /// Change a user's account status (ativo, inativo, demitido, bloqueado)
    SetStatus {
        #[arg(long)]
        email: String,
        #[arg(long)]
        status: UserStatus,
    },

    /// Grant a module to a user
    Grant {
        #[arg(long)]
        email: String,
        #[arg(long)]
        module: Module,
    },

    /// Revoke a module from a user
    Revoke {
        #[arg(long)]
        email: String,
        #[arg(long)]
        module: Module,
    },

    /// List the modules a user can open
    Modules {
        #[arg(long)]
        email: String,
    },

    /// Print version
    Version,
}

impl Commands {
    /// Whether the command talks to the database.
    pub fn needs_database(&self) -> bool {
        !matches!(self, Commands::HashPassword { .. } | Commands::Version)
    }
}
