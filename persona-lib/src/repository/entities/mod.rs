//! Core domain entities for Persona.
//!
//! These types represent the profiles and addresses managed by the system. They
//! provide a unified interface for inspecting and mutating these elements,
//! handling all necessary operations behind the scenes.

use std::fmt::Debug;

use agdb::{DbError, DbId, DbKeyValue, DbValue, QueryBuilder, QueryResult};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::repository::db::{Db, update_values};

mod address;
mod entity_id;
mod profile;

pub use address::Address;
pub use profile::Profile;

pub(crate) use entity_id::EntityId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Internal database error {0}")]
    Internal(#[from] agdb::DbError),
    #[error("This entity refers to an element that has been removed")]
    RemovedEntity,
    #[error("A profile already exists for '{0}'")]
    DuplicateProfile(String),
    #[error("The profile has no current address")]
    NoCurrentAddress,
    #[error("Stored value for '{field}' is invalid: {value}")]
    InvalidStoredValue { field: String, value: String },
}

fn get_field<T>(db: &Db, id: EntityId, field: &str) -> Result<T>
where
    T: TryFrom<DbValue>,
    T::Error: Debug,
{
    let db_id = id.db_id(db)?;
    let value = db
        .read()
        .exec(QueryBuilder::select().values(field).ids(db_id).query())?
        .elements
        .pop()
        .and_then(|mut e| e.values.pop())
        .ok_or(Error::RemovedEntity)?
        .value;

    T::try_from(value).map_err(|e| Error::InvalidStoredValue {
        field: field.to_string(),
        value: format!("{e:?}"),
    })
}

/// Write `values` to an entity, refreshing its `modified_at` timestamp.
fn set_fields(db: &Db, id: EntityId, values: Vec<DbKeyValue>) -> Result<()> {
    let db_id = id.db_id(db)?;
    db.write().exec_mut(update_values(db_id, values))?;

    Ok(())
}

fn get_timestamp(db: &Db, id: EntityId, field: &str) -> Result<DateTime<Utc>> {
    let millis: i64 = get_field(db, id, field)?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| Error::InvalidStoredValue {
        field: field.to_string(),
        value: millis.to_string(),
    })
}

/// The id of the element created by an insert query.
fn inserted_id(result: QueryResult) -> Result<DbId> {
    result
        .elements
        .first()
        .map(|e| e.id)
        .ok_or_else(|| DbError::from("insert query returned no element").into())
}
