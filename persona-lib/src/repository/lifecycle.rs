//! Deciding how an address edit is written to a profile's address history.
//!
//! The postcode is the sole indicator of whether the submitted address is the same place as
//! the current one. An unchanged postcode edits the current address in place; any other
//! postcode (compared as exact strings) records a move: a new current address is inserted and
//! the old one is kept, no longer current, as history.

use strum::Display;
use tracing::debug;

use crate::{
    forms::AddressPayload,
    repository::entities::{Address, Profile, Result},
};

/// How a submitted address relates to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AddressChange {
    /// Same postcode, so the same place: correct the current address.
    Edit,
    /// Different postcode: the profile moved.
    Move,
}

impl AddressChange {
    pub fn between(current_postcode: &str, payload: &AddressPayload) -> Self {
        if payload.postcode() == current_postcode {
            Self::Edit
        } else {
            Self::Move
        }
    }
}

/// The outcome of [`apply_address_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum AddressUpdate {
    /// The current address was corrected. It is still the current address.
    EditedInPlace(Address),
    /// A new current address was recorded and `previous` was retired.
    Moved { previous: Address, current: Address },
}

impl AddressUpdate {
    /// The profile's current address after the update
    pub fn current(&self) -> &Address {
        match self {
            Self::EditedInPlace(current) | Self::Moved { current, .. } => current,
        }
    }

    pub fn change(&self) -> AddressChange {
        match self {
            Self::EditedInPlace(_) => AddressChange::Edit,
            Self::Moved { .. } => AddressChange::Move,
        }
    }
}

/// Write `payload` to the address history of `profile`, whose current address is `current`.
///
/// The caller fetches `current` beforehand. Afterwards exactly one address of the profile is
/// current and it holds `payload`.
pub fn apply_address_update(
    profile: &Profile,
    current: Address,
    payload: &AddressPayload,
) -> Result<AddressUpdate> {
    match AddressChange::between(&current.postcode()?, payload) {
        AddressChange::Edit => {
            current.edit(payload)?;
            Ok(AddressUpdate::EditedInPlace(current))
        }
        AddressChange::Move => {
            let new_current = profile.move_to(&current, payload)?;

            debug!("Profile {profile} moved to {}", payload.postcode());

            Ok(AddressUpdate::Moved {
                previous: current,
                current: new_current,
            })
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use crate::{
        Identity, Repository,
        forms::{AddressForm, ProfileForm},
    };

    use super::*;

    fn payload(address_1: &str, address_2: &str, city: &str, postcode: &str) -> AddressPayload {
        AddressForm {
            address_1: address_1.into(),
            address_2: address_2.into(),
            city: city.into(),
            postcode: postcode.into(),
        }
        .validate()
        .unwrap()
    }

    fn setup() -> (Repository, Profile) {
        let repo = Repository::mock();
        let details = ProfileForm {
            name: "Test User".into(),
            phone_number: "1234567890".into(),
            date_of_birth: "2000-01-01".into(),
        }
        .validate(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .unwrap();
        let profile = repo
            .create_profile(
                &Identity::new("test_user").unwrap(),
                &details,
                &payload("1 Test Road", "Test Village", "Testville", "T35T"),
            )
            .unwrap();

        (repo, profile)
    }

    fn current_count(profile: &Profile) -> usize {
        profile
            .addresses()
            .unwrap()
            .iter()
            .filter(|a| a.is_current().unwrap())
            .count()
    }

    #[test]
    fn test_change_between() {
        let same = payload("2 Other Road", "", "Elsewhere", "T35T");
        let moved = payload("1 Test Road", "", "Testville", "W1A 1AA");

        assert_eq!(AddressChange::between("T35T", &same), AddressChange::Edit);
        assert_eq!(AddressChange::between("T35T", &moved), AddressChange::Move);
    }

    #[test]
    fn test_change_between_is_exact() {
        let lowercase = payload("1 Test Road", "", "Testville", "t35t");
        let spaced = payload("1 Test Road", "", "Testville", "T3 5T");

        assert_eq!(AddressChange::between("T35T", &lowercase), AddressChange::Move);
        assert_eq!(AddressChange::between("T35T", &spaced), AddressChange::Move);
    }

    #[test]
    fn test_same_postcode_edits_in_place() {
        let (_repo, profile) = setup();
        let current = profile.current_address().unwrap();
        current
            .set_fields(vec![
                ("address_1", "9 Old Lane").into(),
                ("address_2", "").into(),
                ("city", "Oldtown").into(),
            ])
            .unwrap();

        let update = apply_address_update(
            &profile,
            current.clone(),
            &payload("1 Test Road", "Test Village", "Testville", "T35T"),
        )
        .unwrap();

        assert_eq!(update.change(), AddressChange::Edit);
        assert_eq!(update.current(), &current);
        assert_eq!(profile.addresses().unwrap().len(), 1);
        assert_eq!(current.address_1().unwrap(), "1 Test Road");
        assert_eq!(current.address_2().unwrap().as_deref(), Some("Test Village"));
        assert_eq!(current.city().unwrap(), "Testville");
        assert_eq!(current.postcode().unwrap(), "T35T");
        assert!(current.is_current().unwrap());
    }

    #[test]
    fn test_new_postcode_moves() {
        let (_repo, profile) = setup();
        let original = profile.current_address().unwrap();

        let update = apply_address_update(
            &profile,
            original.clone(),
            &payload("1 Wolf Road", "Badger Town", "London", "W1A 1AA"),
        )
        .unwrap();

        let addresses = profile.addresses().unwrap();
        assert_eq!(addresses.len(), 2);

        let new = addresses.last().unwrap();
        assert_eq!(update.current(), new);
        assert!(new.is_current().unwrap());
        assert_eq!(new.address_1().unwrap(), "1 Wolf Road");
        assert_eq!(new.postcode().unwrap(), "W1A 1AA");

        assert!(!original.is_current().unwrap());
        assert_eq!(
            update,
            AddressUpdate::Moved {
                previous: original,
                current: new.clone(),
            }
        );
    }

    #[test]
    fn test_edit_address_1_only() {
        let (_repo, profile) = setup();
        let current = profile.current_address().unwrap();

        apply_address_update(
            &profile,
            current.clone(),
            &payload("1 Wolf Road", "Test Village", "Testville", "T35T"),
        )
        .unwrap();

        assert_eq!(profile.addresses().unwrap().len(), 1);
        assert_eq!(current.address_1().unwrap(), "1 Wolf Road");
        assert!(current.is_current().unwrap());
    }

    #[test]
    fn test_edit_keeps_postcode_and_clears_address_2() {
        let (_repo, profile) = setup();
        let current = profile.current_address().unwrap();

        apply_address_update(
            &profile,
            current.clone(),
            &payload("1 Test Road", "", "Newtown", "T35T"),
        )
        .unwrap();

        assert_eq!(current.address_2().unwrap(), None);
        assert_eq!(current.city().unwrap(), "Newtown");
        assert_eq!(current.postcode().unwrap(), "T35T");
    }

    #[test]
    fn test_move_leaves_previous_untouched() {
        let (_repo, profile) = setup();
        let original = profile.current_address().unwrap();

        apply_address_update(
            &profile,
            original.clone(),
            &payload("1 Wolf Road", "", "London", "W1A 1AA"),
        )
        .unwrap();

        assert_eq!(original.address_1().unwrap(), "1 Test Road");
        assert_eq!(original.address_2().unwrap().as_deref(), Some("Test Village"));
        assert_eq!(original.city().unwrap(), "Testville");
        assert_eq!(original.postcode().unwrap(), "T35T");
        assert_eq!(profile.past_addresses().unwrap(), vec![original]);
    }

    #[test]
    fn test_exactly_one_current_after_updates() {
        let (_repo, profile) = setup();
        let updates = [
            payload("1 Test Road", "", "Testville", "T35T"),
            payload("1 Wolf Road", "", "London", "W1A 1AA"),
            payload("2 Wolf Road", "", "London", "W1A 1AA"),
            payload("1 Test Road", "", "Testville", "T35T"),
            payload("9 Sea View", "Flat 2", "Brighton", "BN1 1AA"),
        ];

        for update in &updates {
            let current = profile.current_address().unwrap();
            let result = apply_address_update(&profile, current, update).unwrap();

            assert_eq!(current_count(&profile), 1);
            assert_eq!(result.current().postcode().unwrap(), *update.postcode());
            assert_eq!(result.current().address_1().unwrap(), *update.address_1());
            assert_eq!(result.current().city().unwrap(), *update.city());
        }

        // One initial address plus one per postcode change
        assert_eq!(profile.addresses().unwrap().len(), 4);
    }
}
