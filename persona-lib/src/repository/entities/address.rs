use std::fmt::{self, Debug, Display, Formatter};

use agdb::{DbId, DbKeyValue, DbValue, QueryBuilder};
use chrono::{DateTime, Utc};

use crate::{
    forms::AddressPayload,
    repository::{
        db::{Db, models::AddressModel},
        entities::{EntityId, Result, get_field, get_timestamp, set_fields},
    },
};

/// Represents an address entity in the Persona system.
///
/// An address always belongs to exactly one profile. Always reflects the current database
/// state.
#[derive(Debug, Clone)]
pub struct Address {
    pub(crate) id: EntityId,
    pub(crate) db: Db,
}

impl Address {
    pub(crate) fn load(db_id: DbId, db: Db) -> Result<Self> {
        let id = EntityId::load(&db, db_id)?;
        Ok(Self { id, db })
    }

    // Fields

    pub fn address_1(&self) -> Result<String> {
        self.get_field("address_1")
    }

    pub fn address_2(&self) -> Result<Option<String>> {
        let value: String = self.get_field("address_2")?;
        Ok(Some(value).filter(|v| !v.is_empty()))
    }

    pub fn city(&self) -> Result<String> {
        self.get_field("city")
    }

    pub fn postcode(&self) -> Result<String> {
        self.get_field("postcode")
    }

    /// Whether this is the profile's current address
    pub fn is_current(&self) -> Result<bool> {
        self.get_field("current")
    }

    pub fn created_at(&self) -> Result<DateTime<Utc>> {
        get_timestamp(&self.db, self.id, "created_at")
    }

    pub fn modified_at(&self) -> Result<DateTime<Utc>> {
        get_timestamp(&self.db, self.id, "modified_at")
    }

    // Operations

    /// Overwrite the first line, second line and city. The postcode and `current` flag are left
    /// alone.
    pub(crate) fn edit(&self, payload: &AddressPayload) -> Result<()> {
        self.set_fields(vec![
            ("address_1", payload.address_1().as_str()).into(),
            ("address_2", payload.address_2().as_deref().unwrap_or_default()).into(),
            ("city", payload.city().as_str()).into(),
        ])
    }

    /// Every address belonging to the profile at `profile_id`, oldest first.
    pub(crate) fn list(db: &Db, profile_id: DbId) -> Result<Vec<Self>> {
        let mut addresses = db
            .read()
            .exec(
                QueryBuilder::select()
                    .elements::<AddressModel>()
                    .search()
                    .from(profile_id)
                    .where_()
                    .neighbor()
                    .query(),
            )?
            .elements
            .iter()
            .map(|e| Address::load(e.id, db.clone()))
            .collect::<Result<Vec<_>>>()?;

        addresses.sort_by_key(|a| a.id.uid());

        Ok(addresses)
    }

    /// All lines joined with commas, skipping an empty second line
    fn single_line(&self) -> Result<String> {
        let mut parts = vec![self.address_1()?];
        parts.extend(self.address_2()?);
        parts.push(self.city()?);
        parts.push(self.postcode()?);
        Ok(parts.join(", "))
    }

    fn get_field<T>(&self, field: &str) -> Result<T>
    where
        T: TryFrom<DbValue>,
        T::Error: Debug,
    {
        get_field(&self.db, self.id, field)
    }

    pub(crate) fn set_fields(&self, values: Vec<DbKeyValue>) -> Result<()> {
        set_fields(&self.db, self.id, values)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.single_line()
                .unwrap_or_else(|_| "<invalid address>".into())
        )
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
