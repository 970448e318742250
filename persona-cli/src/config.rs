use clap::Subcommand;
use persona_lib::{Identity, Repository};
use sysexits::ExitCode;

use crate::{parse_identity, report};

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the configured default identity
    Show,
    /// Use this identity when --user isn't given
    SetIdentity {
        #[arg(value_parser = parse_identity)]
        identity: Identity,
    },
    /// Forget the configured default identity
    ClearIdentity,
}

pub fn handle(repo: &Repository, cmd: &Command) -> ExitCode {
    let result = match cmd {
        Command::Show => repo.default_identity().map(|identity| match identity {
            Some(identity) => println!("default identity: {identity}"),
            None => println!("default identity: <unset>"),
        }),
        Command::SetIdentity { identity } => repo.set_default_identity(Some(identity)),
        Command::ClearIdentity => repo.set_default_identity(None),
    };

    match result {
        Ok(()) => ExitCode::Ok,
        Err(err) => report(&err),
    }
}
