use std::{path::Path, sync::Arc};

use agdb::{DbAny, DbError, DbId, DbKeyValue, InsertValuesQuery, QueryBuilder};
use derive_more::Deref;
use parking_lot::RwLock;
use tracing::debug;

use crate::{
    Error, Result,
    repository::db::models::{CURRENT_MODEL_VERSION, ModelVersion},
};

pub(crate) mod models;

/// Format used for calendar dates stored in the database.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Deref)]
pub(crate) struct Db {
    #[deref]
    db: Arc<RwLock<DbAny>>,
}

impl Db {
    /// Open (or create) the file backed database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?;

        let mut db = Self {
            db: Arc::new(RwLock::new(DbAny::new_file(path_str)?)),
        };

        db.init()?;

        debug!("Opened database at {}", path.display());

        Ok(db)
    }

    fn init(&mut self) -> Result<()> {
        let alias_count = self
            .db
            .read()
            .exec(QueryBuilder::select().aliases().query())?
            .result;

        if alias_count == 0 {
            self.db
                .write()
                .transaction_mut(|t| -> std::result::Result<(), DbError> {
                    t.exec_mut(
                        // Insert aliases if they don't exist
                        QueryBuilder::insert()
                            .nodes()
                            .aliases([
                                // Root element nodes
                                "profiles",
                                "addresses",
                                // State nodes
                                "model_version",
                                "next_uid",
                            ])
                            .query(),
                    )?;

                    // Signifies what the UID should be for a newly inserted element. It gets
                    // incremented with every new element.
                    t.exec_mut(
                        QueryBuilder::insert()
                            .values([[("next_uid", 0_u64).into()]])
                            .ids("next_uid")
                            .query(),
                    )?;

                    Ok(())
                })?;
        }

        // Fetch the current model version (if any)
        let versions: Vec<ModelVersion> = self
            .db
            .read()
            .exec(
                QueryBuilder::select()
                    .elements::<ModelVersion>()
                    .search()
                    .from("model_version")
                    .where_()
                    .neighbor()
                    .query(),
            )?
            .try_into()?;

        if let Some(mv) = versions.first() {
            if mv.version() != CURRENT_MODEL_VERSION {
                return Err(Error::UnsupportedModelVersion {
                    found: mv.version(),
                    expected: CURRENT_MODEL_VERSION,
                });
            }
        } else {
            // Insert default ModelVersion if missing
            self.db
                .write()
                .transaction_mut(|t| -> std::result::Result<(), DbError> {
                    let model_version_id = t
                        .exec_mut(
                            QueryBuilder::insert()
                                .element(ModelVersion::default())
                                .query(),
                        )?
                        .elements
                        .first()
                        .map(|e| e.id)
                        .ok_or_else(|| DbError::from("model version insert returned no element"))?;

                    t.exec_mut(
                        QueryBuilder::insert()
                            .edges()
                            .from("model_version")
                            .to(model_version_id)
                            .query(),
                    )?;

                    Ok(())
                })?;
        }

        Ok(())
    }

    /// Write a copy of the database to `path`.
    pub fn backup(&self, path: &Path) -> Result<()> {
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?;

        self.db.write().backup(path_str)?;

        debug!("Backed up database to {}", path.display());

        Ok(())
    }

    /// Create a memory backed database for use in tests
    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        let mut db = Self {
            db: Arc::new(RwLock::new(DbAny::new_memory("test").unwrap())),
        };

        db.init().unwrap();

        db
    }
}

/// A unique identifier handed out to every inserted element.
///
/// `DbId`s are recycled by the database once an element is removed, the UID never is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Uid(pub(crate) u64);

impl Uid {
    /// Allocate the next UID.
    pub fn new(db: &Db) -> std::result::Result<Self, DbError> {
        db.write().transaction_mut(|t| -> std::result::Result<Self, DbError> {
            let uid = t
                .exec(
                    QueryBuilder::select()
                        .values("next_uid")
                        .ids("next_uid")
                        .query(),
                )?
                .elements
                .pop()
                .and_then(|mut e| e.values.pop())
                .ok_or_else(|| DbError::from("next_uid counter is missing"))?
                .value
                .to_u64()?;

            t.exec_mut(
                QueryBuilder::insert()
                    .values([[("next_uid", uid + 1).into()]])
                    .ids("next_uid")
                    .query(),
            )?;

            Ok(Self(uid))
        })
    }

    /// Read the UID stored on an existing element, if it has one.
    pub fn load(db: &Db, db_id: DbId) -> std::result::Result<Option<Self>, DbError> {
        db.read()
            .exec(QueryBuilder::select().values("uid").ids(db_id).query())?
            .elements
            .pop()
            .and_then(|mut e| e.values.pop())
            .map(|kv| kv.value.to_u64().map(Self))
            .transpose()
    }
}

/// Milliseconds since the Unix epoch, used for `created_at`/`modified_at`.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Build a query that writes `values` to the element and refreshes its `modified_at`.
pub(crate) fn update_values(db_id: DbId, mut values: Vec<DbKeyValue>) -> InsertValuesQuery {
    values.push(("modified_at", now_millis()).into());
    QueryBuilder::insert()
        .values(vec![values])
        .ids(db_id)
        .query()
}
