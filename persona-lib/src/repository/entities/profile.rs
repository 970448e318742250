use std::fmt::{self, Debug, Display, Formatter};

use agdb::{Comparison, DbId, DbValue, QueryBuilder, QueryId};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::{
    Identity,
    forms::{AddressPayload, ProfileDetails},
    repository::{
        db::{
            DATE_FORMAT, Db, Uid,
            models::{AddressModel, ProfileModel},
            update_values,
        },
        entities::{
            EntityId, Error, Result, address::Address, get_field, get_timestamp, inserted_id,
            set_fields,
        },
    },
};

/// Represents a profile entity in the Persona system.
///
/// Provides methods to inspect and modify this profile's data, including its address
/// history. Always reflects the current database state.
#[derive(Debug, Clone)]
pub struct Profile {
    pub(crate) id: EntityId,
    pub(crate) db: Db,
}

impl Profile {
    pub(crate) fn load(db_id: DbId, db: Db) -> Result<Self> {
        let id = EntityId::load(&db, db_id)?;
        Ok(Self { id, db })
    }

    // Fields

    /// The identity this profile belongs to. Never changes after creation.
    pub fn owner(&self) -> Result<String> {
        self.get_field("owner")
    }

    pub fn name(&self) -> Result<String> {
        self.get_field("name")
    }

    pub fn phone_number(&self) -> Result<String> {
        self.get_field("phone_number")
    }

    pub fn date_of_birth(&self) -> Result<NaiveDate> {
        let raw: String = self.get_field("date_of_birth")?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|_| Error::InvalidStoredValue {
            field: "date_of_birth".into(),
            value: raw,
        })
    }

    /// Age in whole years on `today`
    pub fn age_on(&self, today: NaiveDate) -> Result<u32> {
        Ok(age_on(self.date_of_birth()?, today))
    }

    pub fn created_at(&self) -> Result<DateTime<Utc>> {
        get_timestamp(&self.db, self.id, "created_at")
    }

    pub fn modified_at(&self) -> Result<DateTime<Utc>> {
        get_timestamp(&self.db, self.id, "modified_at")
    }

    /// Overwrite name, phone number and date of birth. The owner is left alone.
    pub fn set_details(&self, details: &ProfileDetails) -> Result<()> {
        set_fields(
            &self.db,
            self.id,
            vec![
                ("name", details.name().as_str()).into(),
                ("phone_number", details.phone_number().as_str()).into(),
                (
                    "date_of_birth",
                    details.date_of_birth().format(DATE_FORMAT).to_string(),
                )
                    .into(),
            ],
        )
    }

    // Addresses

    /// Every address this profile has had, oldest first.
    pub fn addresses(&self) -> Result<Vec<Address>> {
        Address::list(&self.db, self.id.db_id(&self.db)?)
    }

    /// The address flagged as current.
    ///
    /// Should more than one address be flagged, the most recently created one wins.
    pub fn current_address(&self) -> Result<Address> {
        let mut current = self
            .addresses()?
            .into_iter()
            .filter_map(|a| match a.is_current() {
                Ok(true) => Some(Ok(a)),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            })
            .collect::<Result<Vec<_>>>()?;

        if current.len() > 1 {
            warn!(
                "Profile {} has {} current addresses, using the newest",
                self.id.uid().0,
                current.len()
            );
        }

        current.pop().ok_or(Error::NoCurrentAddress)
    }

    /// Every address except the current one, oldest first.
    pub fn past_addresses(&self) -> Result<Vec<Address>> {
        let current = self.current_address()?;
        Ok(self
            .addresses()?
            .into_iter()
            .filter(|a| *a != current)
            .collect())
    }

    // Operations

    /// Insert a profile for `owner` together with its first, current address.
    pub(crate) fn add(
        db: &Db,
        owner: &Identity,
        details: &ProfileDetails,
        address: &AddressPayload,
    ) -> Result<Self> {
        if Profile::find(db, owner)?.is_some() {
            return Err(Error::DuplicateProfile(owner.to_string()));
        }

        let profile_model = ProfileModel::new(Uid::new(db)?, owner, details);
        let address_model = AddressModel::new(Uid::new(db)?, address);

        let profile_id = db.write().transaction_mut(|t| -> Result<DbId> {
            let profile_id = inserted_id(
                t.exec_mut(QueryBuilder::insert().element(profile_model).query())?,
            )?;

            t.exec_mut(
                QueryBuilder::insert()
                    .edges()
                    .from("profiles")
                    .to(profile_id)
                    .query(),
            )?;

            let address_id = inserted_id(
                t.exec_mut(QueryBuilder::insert().element(address_model).query())?,
            )?;

            // Link the Address to its Profile and the root "addresses" node
            t.exec_mut(
                QueryBuilder::insert()
                    .edges()
                    .from([QueryId::from("addresses"), QueryId::from(profile_id)])
                    .to(address_id)
                    .query(),
            )?;

            Ok(profile_id)
        })?;

        let profile = Profile::load(profile_id, db.clone())?;

        debug!("Created profile for {owner}");

        Ok(profile)
    }

    /// Remove this profile and every address it owns.
    pub(crate) fn remove(self) -> Result<()> {
        let owner = self.owner()?;
        let profile_id = self.id.db_id(&self.db)?;
        let mut ids = self
            .addresses()?
            .iter()
            .map(|a| a.id.db_id(&self.db))
            .collect::<Result<Vec<_>>>()?;
        ids.push(profile_id);

        let count = ids.len();
        self.db
            .write()
            .exec_mut(QueryBuilder::remove().ids(ids).query())?;

        debug!("Removed profile for {owner} ({} addresses)", count - 1);

        Ok(())
    }

    /// Look up the profile belonging to `owner`.
    pub(crate) fn find(db: &Db, owner: &Identity) -> Result<Option<Self>> {
        db.read()
            .exec(
                QueryBuilder::select()
                    .elements::<ProfileModel>()
                    .search()
                    .from("profiles")
                    .where_()
                    .neighbor()
                    .and()
                    .key("owner")
                    .value(Comparison::Equal(owner.as_str().into()))
                    .query(),
            )?
            .elements
            .first()
            .map(|p| Profile::load(p.id, db.clone()))
            .transpose()
    }

    pub(crate) fn list(db: &Db) -> Result<Vec<Self>> {
        let mut profiles = db
            .read()
            .exec(
                QueryBuilder::select()
                    .elements::<ProfileModel>()
                    .search()
                    .from("profiles")
                    .where_()
                    .neighbor()
                    .query(),
            )?
            .elements
            .iter()
            .map(|e| Profile::load(e.id, db.clone()))
            .collect::<Result<Vec<_>>>()?;

        profiles.sort_by_key(|p| p.id.uid());

        Ok(profiles)
    }

    /// Demote `previous` and insert a new current address in a single transaction.
    pub(crate) fn move_to(&self, previous: &Address, payload: &AddressPayload) -> Result<Address> {
        let previous_id = previous.id.db_id(&self.db)?;
        self.replace_current(previous_id, payload)
    }

    fn replace_current(&self, previous_id: DbId, payload: &AddressPayload) -> Result<Address> {
        let profile_id = self.id.db_id(&self.db)?;
        let model = AddressModel::new(Uid::new(&self.db)?, payload);

        let address_id = self.db.write().transaction_mut(|t| -> Result<DbId> {
            let address_id =
                inserted_id(t.exec_mut(QueryBuilder::insert().element(model).query())?)?;

            t.exec_mut(
                QueryBuilder::insert()
                    .edges()
                    .from([QueryId::from("addresses"), QueryId::from(profile_id)])
                    .to(address_id)
                    .query(),
            )?;

            t.exec_mut(update_values(previous_id, vec![("current", false).into()]))?;

            Ok(address_id)
        })?;

        Address::load(address_id, self.db.clone())
    }

    fn get_field<T>(&self, field: &str) -> Result<T>
    where
        T: TryFrom<DbValue>,
        T::Error: Debug,
    {
        get_field(&self.db, self.id, field)
    }
}

impl Display for Profile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.name().unwrap_or_else(|_| "<invalid profile name>".into())
        )
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Whole years between `date_of_birth` and `today`.
pub(crate) fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    let had_birthday = (today.month(), today.day()) >= (date_of_birth.month(), date_of_birth.day());
    let years = today.year() - date_of_birth.year() - i32::from(!had_birthday);

    u32::try_from(years).unwrap_or(0)
}
