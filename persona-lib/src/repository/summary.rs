use chrono::{DateTime, NaiveDate, Utc};

use crate::repository::entities::{Address, Profile, Result};

/// Everything shown when viewing a profile, read in one go.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub owner: String,
    pub name: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
    pub age: u32,
    pub current_address: AddressSummary,
    /// Oldest first
    pub past_addresses: Vec<AddressSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddressSummary {
    pub address_1: String,
    pub address_2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub since: DateTime<Utc>,
}

impl ProfileSummary {
    pub(crate) fn read(profile: &Profile, today: NaiveDate) -> Result<Self> {
        Ok(Self {
            owner: profile.owner()?,
            name: profile.name()?,
            phone_number: profile.phone_number()?,
            date_of_birth: profile.date_of_birth()?,
            age: profile.age_on(today)?,
            current_address: AddressSummary::read(&profile.current_address()?)?,
            past_addresses: profile
                .past_addresses()?
                .iter()
                .map(AddressSummary::read)
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

impl AddressSummary {
    fn read(address: &Address) -> Result<Self> {
        Ok(Self {
            address_1: address.address_1()?,
            address_2: address.address_2()?,
            city: address.city()?,
            postcode: address.postcode()?,
            since: address.created_at()?,
        })
    }
}
