use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::debug;

use crate::{
    Error, Identity, Result,
    forms::{AddressPayload, ProfileDetails},
    fs::state_dir,
    repository::{
        config::{Cfg, CoreConfig},
        db::Db,
    },
};

pub(crate) mod db;

pub mod config;
pub mod entities;
pub mod lifecycle;
mod summary;

pub use entities::{Address, Profile};
pub use lifecycle::{AddressChange, AddressUpdate, apply_address_update};
pub use summary::{AddressSummary, ProfileSummary};

/// Central access point for all persistent data.
///
/// The [`Repository`] handles all database and configuration file queries. It provides a
/// single, consistent interface for reading and writing profiles and their addresses. Every
/// profile operation takes the [`Identity`] it acts on behalf of.
#[derive(Clone, Debug)]
pub struct Repository {
    db: Db,
    cfg: Cfg,
}

impl Repository {
    /// Open the repository described by the configuration file in the config directory.
    pub fn new() -> Result<Self> {
        let cfg = CoreConfig::load()?;
        let path = state_dir()?.join(cfg.database_file());
        Self::open(cfg, &path)
    }

    /// Open the repository with the database file at `path`.
    pub fn open(cfg: CoreConfig, path: &Path) -> Result<Self> {
        Ok(Self {
            db: Db::open(path)?,
            cfg: Arc::new(RwLock::new(cfg)),
        })
    }

    pub fn default_identity(&self) -> Result<Option<Identity>> {
        self.cfg
            .read()
            .default_identity()
            .map(Identity::new)
            .transpose()
    }

    /// Persist `identity` as the identity to use when none is given.
    pub fn set_default_identity(&self, identity: Option<&Identity>) -> Result<()> {
        let mut cfg = self.cfg.write();
        cfg.set_default_identity(identity.map(ToString::to_string));
        cfg.save()?;

        Ok(())
    }

    /// Create the profile for `identity` along with its first, current address.
    pub fn create_profile(
        &self,
        identity: &Identity,
        details: &ProfileDetails,
        address: &AddressPayload,
    ) -> Result<Profile> {
        Ok(Profile::add(&self.db, identity, details, address)?)
    }

    pub fn profile(&self, identity: &Identity) -> Result<Option<Profile>> {
        Ok(Profile::find(&self.db, identity)?)
    }

    /// The profile of `identity` with its current and past addresses, as of `today`.
    pub fn profile_summary(
        &self,
        identity: &Identity,
        today: NaiveDate,
    ) -> Result<Option<ProfileSummary>> {
        self.profile(identity)?
            .map(|p| ProfileSummary::read(&p, today))
            .transpose()
            .map_err(Error::from)
    }

    /// Update the profile of `identity`, recording the submitted address according to
    /// [`apply_address_update`].
    pub fn update_profile(
        &self,
        identity: &Identity,
        details: &ProfileDetails,
        address: &AddressPayload,
    ) -> Result<AddressUpdate> {
        let profile = self.require_profile(identity)?;
        let current = profile.current_address()?;

        let update = apply_address_update(&profile, current, address)?;
        profile.set_details(details)?;

        debug!("Updated profile for {identity} ({})", update.change());

        Ok(update)
    }

    /// Delete the profile of `identity` and its whole address history.
    pub fn delete_profile(&self, identity: &Identity) -> Result<()> {
        Ok(self.require_profile(identity)?.remove()?)
    }

    /// Every profile, in the order they were created.
    pub fn profiles(&self) -> Result<Vec<Profile>> {
        Ok(Profile::list(&self.db)?)
    }

    /// Back the database up into the state directory, returning the path of the backup.
    pub fn backup(&self) -> Result<PathBuf> {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let path = state_dir()?.join(format!("data-{timestamp}.db.bak"));

        self.backup_to(&path)?;

        Ok(path)
    }

    pub fn backup_to(&self, path: &Path) -> Result<()> {
        self.db.backup(path)
    }

    fn require_profile(&self, identity: &Identity) -> Result<Profile> {
        self.profile(identity)?
            .ok_or_else(|| Error::ProfileNotFound(identity.to_string()))
    }

    #[cfg(test)]
    /// Return a mock version of a [`Repository`] with an in-memory database and configuration
    /// file.
    pub(crate) fn mock() -> Self {
        Self {
            db: Db::in_memory(),
            cfg: Arc::new(RwLock::new(CoreConfig::mock())),
        }
    }
}

#[cfg(test)]
mod test {
    use tempfile::tempdir;

    use crate::forms::{AddressForm, ProfileForm};

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn details(name: &str) -> ProfileDetails {
        ProfileForm {
            name: name.into(),
            phone_number: "1234567890".into(),
            date_of_birth: "2000-01-01".into(),
        }
        .validate(today())
        .unwrap()
    }

    fn address(address_1: &str, city: &str, postcode: &str) -> AddressPayload {
        AddressForm {
            address_1: address_1.into(),
            address_2: "Test Village".into(),
            city: city.into(),
            postcode: postcode.into(),
        }
        .validate()
        .unwrap()
    }

    fn user() -> Identity {
        Identity::new("test_user").unwrap()
    }

    #[test]
    fn test_create_and_view() {
        let repo = Repository::mock();

        repo.create_profile(&user(), &details("Wolf"), &address("1 Test Road", "Testville", "T35T"))
            .unwrap();

        let summary = repo.profile_summary(&user(), today()).unwrap().unwrap();
        assert_eq!(summary.owner, "test_user");
        assert_eq!(summary.name, "Wolf");
        assert_eq!(summary.age, 24);
        assert_eq!(summary.current_address.postcode, "T35T");
        assert!(summary.past_addresses.is_empty());
        assert_eq!(repo.profiles().unwrap().len(), 1);
    }

    #[test]
    fn test_view_without_profile() {
        let repo = Repository::mock();

        assert!(repo.profile(&user()).unwrap().is_none());
        assert!(repo.profile_summary(&user(), today()).unwrap().is_none());
    }

    #[test]
    fn test_create_twice() {
        let repo = Repository::mock();
        let address = address("1 Test Road", "Testville", "T35T");
        repo.create_profile(&user(), &details("Wolf"), &address)
            .unwrap();

        let result = repo.create_profile(&user(), &details("Badger"), &address);

        assert!(matches!(
            result,
            Err(Error::Entity(entities::Error::DuplicateProfile(_)))
        ));
        assert_eq!(repo.profile(&user()).unwrap().unwrap().name().unwrap(), "Wolf");
    }

    #[test]
    fn test_update_same_address() {
        let repo = Repository::mock();
        repo.create_profile(&user(), &details("Wolf"), &address("9 Old Lane", "Oldtown", "T35T"))
            .unwrap();

        let update = repo
            .update_profile(&user(), &details("Badger"), &address("1 Test Road", "Testville", "T35T"))
            .unwrap();

        let profile = repo.profile(&user()).unwrap().unwrap();
        let current = profile.current_address().unwrap();
        assert_eq!(update.change(), AddressChange::Edit);
        assert_eq!(profile.name().unwrap(), "Badger");
        assert_eq!(profile.addresses().unwrap().len(), 1);
        assert_eq!(current.address_1().unwrap(), "1 Test Road");
        assert_eq!(current.city().unwrap(), "Testville");
        assert_eq!(repo.profiles().unwrap().len(), 1);
    }

    #[test]
    fn test_update_new_address() {
        let repo = Repository::mock();
        repo.create_profile(
            &user(),
            &details("Wolf"),
            &address("1 Test Road", "Testville", "T35T"),
        )
        .unwrap();

        let update = repo
            .update_profile(
                &user(),
                &details("Wolf"),
                &address("1 Wolf Road", "London", "W1A 1AA"),
            )
            .unwrap();

        assert_eq!(update.change(), AddressChange::Move);

        let summary = repo.profile_summary(&user(), today()).unwrap().unwrap();
        assert_eq!(summary.current_address.address_1, "1 Wolf Road");
        assert_eq!(summary.past_addresses.len(), 1);
        assert_eq!(summary.past_addresses.first().unwrap().postcode, "T35T");
    }

    #[test]
    fn test_update_without_profile() {
        let repo = Repository::mock();

        let result = repo.update_profile(
            &user(),
            &details("Wolf"),
            &address("1 Test Road", "Testville", "T35T"),
        );

        assert!(matches!(result, Err(Error::ProfileNotFound(owner)) if owner == "test_user"));
    }

    #[test]
    fn test_update_without_current_address() {
        let repo = Repository::mock();
        let profile = repo
            .create_profile(
                &user(),
                &details("Wolf"),
                &address("1 Test Road", "Testville", "T35T"),
            )
            .unwrap();
        profile
            .current_address()
            .unwrap()
            .set_fields(vec![("current", false).into()])
            .unwrap();

        let result = repo.update_profile(
            &user(),
            &details("Badger"),
            &address("1 Test Road", "Testville", "T35T"),
        );

        assert!(matches!(
            result,
            Err(Error::Entity(entities::Error::NoCurrentAddress))
        ));
        // Nothing was written
        assert_eq!(profile.name().unwrap(), "Wolf");
    }

    #[test]
    fn test_delete() {
        let repo = Repository::mock();
        let other = Identity::new("other_user").unwrap();
        repo.create_profile(
            &user(),
            &details("Wolf"),
            &address("1 Test Road", "Testville", "T35T"),
        )
        .unwrap();
        repo.create_profile(
            &other,
            &details("Badger"),
            &address("2 Test Road", "Testville", "T35T"),
        )
        .unwrap();
        repo.update_profile(
            &user(),
            &details("Wolf"),
            &address("1 Wolf Road", "London", "W1A 1AA"),
        )
        .unwrap();

        repo.delete_profile(&user()).unwrap();

        assert!(repo.profile(&user()).unwrap().is_none());
        let remaining = repo.profile(&other).unwrap().unwrap();
        assert_eq!(remaining.addresses().unwrap().len(), 1);
        assert!(matches!(
            repo.delete_profile(&user()),
            Err(Error::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_default_identity() {
        let repo = Repository::mock();
        assert_eq!(repo.default_identity().unwrap(), None);

        repo.set_default_identity(Some(&user())).unwrap();

        assert_eq!(repo.default_identity().unwrap(), Some(user()));
    }

    #[test]
    fn test_file_backed_repository() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.db");

        {
            let repo = Repository::open(CoreConfig::default(), &path).unwrap();
            repo.create_profile(
                &user(),
                &details("Wolf"),
                &address("1 Test Road", "Testville", "T35T"),
            )
            .unwrap();
            repo.backup_to(&dir.path().join("data.db.bak")).unwrap();
        }

        let repo = Repository::open(CoreConfig::default(), &path).unwrap();

        assert!(dir.path().join("data.db.bak").exists());
        assert_eq!(
            repo.profile(&user()).unwrap().unwrap().name().unwrap(),
            "Wolf"
        );
    }
}
