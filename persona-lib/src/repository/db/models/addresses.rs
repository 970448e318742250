use agdb::{DbElement, DbId};

use crate::{
    forms::AddressPayload,
    repository::db::{Uid, now_millis},
};

#[derive(Debug, Clone, DbElement, PartialEq, PartialOrd)]
pub(crate) struct AddressModel {
    pub(crate) db_id: Option<DbId>,
    pub(crate) uid: u64,
    pub(crate) address_1: String,
    /// Empty when the address has no second line
    pub(crate) address_2: String,
    pub(crate) city: String,
    pub(crate) postcode: String,
    pub(crate) current: bool,
    pub(crate) created_at: i64,
    pub(crate) modified_at: i64,
}

impl AddressModel {
    /// A new current address holding the submitted fields.
    pub fn new(uid: Uid, payload: &AddressPayload) -> Self {
        let now = now_millis();
        Self {
            db_id: None,
            uid: uid.0,
            address_1: payload.address_1().clone(),
            address_2: payload.address_2().clone().unwrap_or_default(),
            city: payload.city().clone(),
            postcode: payload.postcode().clone(),
            current: true,
            created_at: now,
            modified_at: now,
        }
    }
}
