use std::env;

use clap::{Parser, Subcommand};
use colored::Colorize;
use persona_lib::{Error, Identity, Repository, repository::entities};
use sysexits::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod config;
mod profile;

#[derive(Parser, Debug)]
#[command(name = "persona")]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Act as this identity instead of the configured default
    #[arg(short, long, global = true, value_parser = parse_identity)]
    user: Option<Identity>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Operate on your profile
    #[command(subcommand)]
    Profile(profile::Command),
    /// Operate on the configuration
    #[command(subcommand)]
    Config(config::Command),
    /// Back up the database into the state directory
    Backup,
}

fn main() -> ExitCode {
    // Human friendly panicking in release mode
    human_panic::setup_panic!();

    // Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("{} failed to set up logging", "warning:".yellow().bold());
    }

    let cli = Cli::parse();

    let repo = match Repository::new() {
        Ok(repo) => repo,
        Err(err) => return report(&err),
    };

    match &cli.command {
        Command::Profile(cmd) => profile::handle(&repo, cli.user.as_ref(), cmd),
        Command::Config(cmd) => config::handle(&repo, cmd),
        Command::Backup => match repo.backup() {
            Ok(path) => {
                println!("Backed up to {}", path.display());
                ExitCode::Ok
            }
            Err(err) => report(&err),
        },
    }
}

fn parse_identity(value: &str) -> Result<Identity, String> {
    Identity::new(value).map_err(|err| err.to_string())
}

/// Work out who we're acting as: `--user`, then the configured default, then `$USER`.
fn resolve_identity(repo: &Repository, user: Option<&Identity>) -> Result<Identity, ExitCode> {
    let identity = match user {
        Some(user) => Some(Ok(user.clone())),
        None => match repo.default_identity() {
            Ok(Some(identity)) => Some(Ok(identity)),
            Ok(None) => env::var("USER").ok().map(|user| Identity::new(&user)),
            Err(err) => Some(Err(err)),
        },
    };

    match identity {
        Some(Ok(identity)) => Ok(identity),
        Some(Err(err)) => Err(report(&err)),
        None => {
            eprintln!(
                "{} no identity given; pass --user or set one with `persona config set-identity`",
                "error:".red().bold()
            );
            Err(ExitCode::Usage)
        }
    }
}

/// Print `err` and pick the matching exit code.
fn report(err: &Error) -> ExitCode {
    match err {
        Error::ProfileNotFound(_) => {
            warn("You don't have a profile yet. Please create one.");
            ExitCode::NoInput
        }
        Error::Entity(entities::Error::DuplicateProfile(_)) => {
            warn("You have already created a profile.");
            ExitCode::DataErr
        }
        other => {
            eprintln!("{} {other}", "error:".red().bold());
            match other {
                Error::InvalidIdentity => ExitCode::Usage,
                Error::Entity(entities::Error::NoCurrentAddress) => ExitCode::DataErr,
                Error::Config(_) => ExitCode::Config,
                Error::Io(_) | Error::InvalidPath(_) => ExitCode::IoErr,
                _ => ExitCode::Software,
            }
        }
    }
}

fn warn(message: &str) {
    eprintln!("{} {message}", "warning:".yellow().bold());
}
