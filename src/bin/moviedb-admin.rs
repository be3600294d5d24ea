//! Offline maintenance commands run against the configured store.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use moviedb::config::Config;
use moviedb::query::Filter;
use moviedb::repo;

#[derive(Parser)]
#[command(name = "moviedb-admin", about = "Maintenance commands for the movie database")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Permanently delete the user registered with this email.
    DeleteUser {
        #[arg(long)]
        email: String,
    },
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let settings = Config::from_env().context("invalid configuration")?;
    let repo = repo::open(&settings).await.context("failed to open the repository")?;

    match cli.command {
        Command::DeleteUser { email } => {
            let Some(user) = repo.users().find_one(&Filter::eq("email", email.as_str())).await? else {
                bail!("no user registered with {email}");
            };
            repo.users().delete(&user.id).await?;
            info!(user = %user.id, username = %user.username, "user deleted");
        }
    }
    Ok(())
}
