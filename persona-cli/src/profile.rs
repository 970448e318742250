use chrono::Local;
use clap::{Args, Subcommand};
use colored::Colorize;
use persona_lib::{
    Identity, Repository,
    forms::{AddressForm, FormErrors, ProfileForm, validate_submission},
    repository::{AddressChange, AddressSummary, Profile, ProfileSummary, entities},
};
use sysexits::ExitCode;

use crate::{report, resolve_identity, warn};

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List every profile
    List,
    /// Show your profile and address history
    Show,
    /// Create your profile
    Create(Submission),
    /// Update your profile. A different postcode records a move to a new address.
    Update(Submission),
    /// Delete your profile and address history
    Delete,
}

#[derive(Args, Debug, Clone)]
pub struct Submission {
    #[arg(long)]
    name: String,
    #[arg(long = "phone")]
    phone_number: String,
    /// Date of birth
    #[arg(long = "dob", value_name = "YYYY-MM-DD")]
    date_of_birth: String,
    #[arg(long)]
    address_1: String,
    #[arg(long, default_value = "")]
    address_2: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    postcode: String,
}

impl Submission {
    fn forms(&self) -> (ProfileForm, AddressForm) {
        (
            ProfileForm {
                name: self.name.clone(),
                phone_number: self.phone_number.clone(),
                date_of_birth: self.date_of_birth.clone(),
            },
            AddressForm {
                address_1: self.address_1.clone(),
                address_2: self.address_2.clone(),
                city: self.city.clone(),
                postcode: self.postcode.clone(),
            },
        )
    }
}

pub fn handle(repo: &Repository, user: Option<&Identity>, cmd: &Command) -> ExitCode {
    if let Command::List = cmd {
        return list(repo);
    }

    let identity = match resolve_identity(repo, user) {
        Ok(identity) => identity,
        Err(code) => return code,
    };

    match cmd {
        Command::List => list(repo),
        Command::Show => show(repo, &identity),
        Command::Create(submission) => create(repo, &identity, submission),
        Command::Update(submission) => update(repo, &identity, submission),
        Command::Delete => match repo.delete_profile(&identity) {
            Ok(()) => {
                println!("{}", "Profile deleted".green());
                ExitCode::Ok
            }
            Err(err) => report(&err),
        },
    }
}

fn list(repo: &Repository) -> ExitCode {
    let profiles = match repo.profiles() {
        Ok(profiles) => profiles,
        Err(err) => return report(&err),
    };

    for profile in profiles {
        match row(&profile) {
            Ok(row) => println!("{row}"),
            Err(err) => return report(&err.into()),
        }
    }

    ExitCode::Ok
}

/// Owner, name, phone number and date of birth, tab separated
fn row(profile: &Profile) -> entities::Result<String> {
    Ok(format!(
        "{}\t{}\t{}\t{}",
        profile.owner()?,
        profile.name()?,
        profile.phone_number()?,
        profile.date_of_birth()?,
    ))
}

fn show(repo: &Repository, identity: &Identity) -> ExitCode {
    match repo.profile_summary(identity, Local::now().date_naive()) {
        Ok(Some(summary)) => {
            print_summary(&summary);
            ExitCode::Ok
        }
        Ok(None) => {
            warn("You don't have a profile yet. Please create one.");
            ExitCode::NoInput
        }
        Err(err) => report(&err),
    }
}

fn create(repo: &Repository, identity: &Identity, submission: &Submission) -> ExitCode {
    match repo.profile(identity) {
        Ok(Some(_)) => {
            warn("You have already created a profile - here it is!");
            return show(repo, identity);
        }
        Ok(None) => {}
        Err(err) => return report(&err),
    }

    let (profile_form, address_form) = submission.forms();
    let (details, payload) =
        match validate_submission(&profile_form, &address_form, Local::now().date_naive()) {
            Ok(valid) => valid,
            Err(errors) => return invalid(&errors),
        };

    match repo.create_profile(identity, &details, &payload) {
        Ok(_) => {
            println!("{}", "Profile created".green());
            show(repo, identity)
        }
        Err(err) => report(&err),
    }
}

fn update(repo: &Repository, identity: &Identity, submission: &Submission) -> ExitCode {
    if let Some(code) = require_profile(repo, identity) {
        return code;
    }

    let (profile_form, address_form) = submission.forms();
    let (details, payload) =
        match validate_submission(&profile_form, &address_form, Local::now().date_naive()) {
            Ok(valid) => valid,
            Err(errors) => return invalid(&errors),
        };

    match repo.update_profile(identity, &details, &payload) {
        Ok(update) => {
            let message = match update.change() {
                AddressChange::Edit => "Profile updated",
                AddressChange::Move => "Profile updated, previous address moved to history",
            };
            println!("{}", message.green());
            show(repo, identity)
        }
        Err(err) => report(&err),
    }
}

/// Warn and bail out when `identity` has no profile yet.
fn require_profile(repo: &Repository, identity: &Identity) -> Option<ExitCode> {
    match repo.profile(identity) {
        Ok(Some(_)) => None,
        Ok(None) => {
            warn("You don't have a profile yet. Please create one.");
            Some(ExitCode::NoInput)
        }
        Err(err) => Some(report(&err)),
    }
}

fn invalid(errors: &FormErrors) -> ExitCode {
    for error in errors.errors() {
        eprintln!("{} {error}", "invalid:".red().bold());
    }

    ExitCode::DataErr
}

fn print_summary(summary: &ProfileSummary) {
    println!("{:<16}{}", "Name:".bold(), summary.name);
    println!("{:<16}{}", "Phone number:".bold(), summary.phone_number);
    println!(
        "{:<16}{} (age {})",
        "Date of birth:".bold(),
        summary.date_of_birth,
        summary.age
    );
    println!("{}", "Current address:".bold());
    print_address(&summary.current_address);

    if !summary.past_addresses.is_empty() {
        println!("{}", "Past addresses:".bold());
        for address in &summary.past_addresses {
            print_address(address);
        }
    }
}

fn print_address(address: &AddressSummary) {
    let mut lines = vec![address.address_1.as_str()];
    lines.extend(address.address_2.as_deref());
    lines.push(&address.city);
    lines.push(&address.postcode);

    println!(
        "  {} {}",
        lines.join(", "),
        format!("(since {})", address.since.format("%Y-%m-%d")).dimmed()
    );
}

#[cfg(test)]
mod test {
    use persona_lib::repository::config::CoreConfig;
    use tempfile::{TempDir, tempdir};

    use super::*;

    fn repo() -> (TempDir, Repository) {
        let dir = tempdir().unwrap();
        let cfg = CoreConfig::load_from(&dir.path().join("core.toml")).unwrap();
        let repo = Repository::open(cfg, &dir.path().join("data.db")).unwrap();

        (dir, repo)
    }

    fn submission(name: &str) -> Submission {
        Submission {
            name: name.into(),
            phone_number: "1234567890".into(),
            date_of_birth: "2000-01-01".into(),
            address_1: "1 Test Road".into(),
            address_2: String::new(),
            city: "Testville".into(),
            postcode: "T35T".into(),
        }
    }

    fn bob() -> Identity {
        Identity::new("bob").unwrap()
    }

    #[test]
    fn test_update_without_profile_checks_profile_first() {
        let (_dir, repo) = repo();

        assert_eq!(update(&repo, &bob(), &submission("")), ExitCode::NoInput);
        assert_eq!(update(&repo, &bob(), &submission("Bob")), ExitCode::NoInput);
        assert!(repo.profile(&bob()).unwrap().is_none());
    }

    #[test]
    fn test_update_invalid_input() {
        let (_dir, repo) = repo();
        assert_eq!(create(&repo, &bob(), &submission("Bob")), ExitCode::Ok);

        assert_eq!(update(&repo, &bob(), &submission("")), ExitCode::DataErr);
        assert_eq!(
            repo.profile(&bob()).unwrap().unwrap().name().unwrap(),
            "Bob"
        );
    }
}
