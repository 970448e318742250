use derive_more::{Deref, Display};

use crate::{Error, Result};

/// The user a profile belongs to.
///
/// Passed explicitly into every repository operation; the library never looks up who is
/// "logged in".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deref)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::InvalidIdentity);
        }

        Ok(Self(value.to_string()))
    }
}
