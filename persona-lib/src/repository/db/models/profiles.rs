use agdb::{DbElement, DbId};

use crate::{
    Identity,
    forms::ProfileDetails,
    repository::db::{DATE_FORMAT, Uid, now_millis},
};

#[derive(Debug, Clone, DbElement, PartialEq, PartialOrd)]
pub(crate) struct ProfileModel {
    pub(crate) db_id: Option<DbId>,
    pub(crate) uid: u64,
    /// The identity this profile belongs to
    pub(crate) owner: String,
    pub(crate) name: String,
    pub(crate) phone_number: String,
    /// Stored as `YYYY-MM-DD`
    pub(crate) date_of_birth: String,
    pub(crate) created_at: i64,
    pub(crate) modified_at: i64,
}

impl ProfileModel {
    pub fn new(uid: Uid, owner: &Identity, details: &ProfileDetails) -> Self {
        let now = now_millis();
        Self {
            db_id: None,
            uid: uid.0,
            owner: owner.to_string(),
            name: details.name().clone(),
            phone_number: details.phone_number().clone(),
            date_of_birth: details.date_of_birth().format(DATE_FORMAT).to_string(),
            created_at: now,
            modified_at: now,
        }
    }
}
