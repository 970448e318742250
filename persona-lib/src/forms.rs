//! Validation of submitted profile and address fields.
//!
//! Forms hold raw user input. Validating a form yields a typed value that the repository
//! accepts, or every problem found in the input at once.

use std::fmt::{self, Display, Formatter};

use chrono::NaiveDate;
use getset::{CopyGetters, Getters};
use strum::Display as StrumDisplay;
use thiserror::Error;

use crate::repository::db::DATE_FORMAT;

const NAME_MAX_CHARS: usize = 255;
const PHONE_NUMBER_MAX_CHARS: usize = 100;
const ADDRESS_LINE_MAX_CHARS: usize = 255;
const CITY_MAX_CHARS: usize = 64;
const POSTCODE_MAX_CHARS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
pub enum Field {
    #[strum(serialize = "name")]
    Name,
    #[strum(serialize = "phone_number")]
    PhoneNumber,
    #[strum(serialize = "date_of_birth")]
    DateOfBirth,
    #[strum(serialize = "address_1")]
    Address1,
    #[strum(serialize = "address_2")]
    Address2,
    #[strum(serialize = "city")]
    City,
    #[strum(serialize = "postcode")]
    Postcode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field that failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether `field` has at least one error
    pub fn has(&self, field: Field) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    fn push(&mut self, field: Field, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FormErrors> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

/// Raw profile input.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub name: String,
    pub phone_number: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
}

/// Validated personal details of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct ProfileDetails {
    #[getset(get = "pub")]
    name: String,
    #[getset(get = "pub")]
    phone_number: String,
    #[getset(get_copy = "pub")]
    date_of_birth: NaiveDate,
}

impl ProfileForm {
    /// Validate against `today`; the date of birth must be strictly before it.
    pub fn validate(&self, today: NaiveDate) -> Result<ProfileDetails, FormErrors> {
        let mut errors = FormErrors::default();

        let name = required(&mut errors, Field::Name, &self.name, NAME_MAX_CHARS);
        let phone_number = required(
            &mut errors,
            Field::PhoneNumber,
            &self.phone_number,
            PHONE_NUMBER_MAX_CHARS,
        );

        let date_of_birth = match self.date_of_birth.trim() {
            "" => {
                errors.push(Field::DateOfBirth, "This field is required.");
                None
            }
            raw => match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
                Ok(date) if date >= today => {
                    errors.push(Field::DateOfBirth, "Date of birth must be in the past.");
                    None
                }
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push(Field::DateOfBirth, "Enter a valid date (YYYY-MM-DD).");
                    None
                }
            },
        };

        match date_of_birth {
            Some(date_of_birth) => errors.into_result(|| ProfileDetails {
                name,
                phone_number,
                date_of_birth,
            }),
            None => Err(errors),
        }
    }
}

/// Raw address input.
#[derive(Debug, Clone, Default)]
pub struct AddressForm {
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub postcode: String,
}

/// Validated address fields, ready to be written to a profile's address history.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct AddressPayload {
    address_1: String,
    /// `None` when the second line was left blank
    address_2: Option<String>,
    city: String,
    postcode: String,
}

impl AddressForm {
    pub fn validate(&self) -> Result<AddressPayload, FormErrors> {
        let mut errors = FormErrors::default();

        let address_1 = required(
            &mut errors,
            Field::Address1,
            &self.address_1,
            ADDRESS_LINE_MAX_CHARS,
        );
        let address_2 = self.address_2.trim();
        if address_2.chars().count() > ADDRESS_LINE_MAX_CHARS {
            errors.push(Field::Address2, too_long(ADDRESS_LINE_MAX_CHARS, address_2));
        }
        let city = required(&mut errors, Field::City, &self.city, CITY_MAX_CHARS);
        let postcode = required(
            &mut errors,
            Field::Postcode,
            &self.postcode,
            POSTCODE_MAX_CHARS,
        );

        errors.into_result(|| AddressPayload {
            address_1,
            address_2: Some(address_2.to_string()).filter(|v| !v.is_empty()),
            city,
            postcode,
        })
    }
}

/// Validate both halves of a profile submission, reporting the errors of both.
pub fn validate_submission(
    profile: &ProfileForm,
    address: &AddressForm,
    today: NaiveDate,
) -> Result<(ProfileDetails, AddressPayload), FormErrors> {
    match (profile.validate(today), address.validate()) {
        (Ok(details), Ok(payload)) => Ok((details, payload)),
        (Err(mut errors), Err(address_errors)) => {
            errors.0.extend(address_errors.0);
            Err(errors)
        }
        (Err(errors), _) | (_, Err(errors)) => Err(errors),
    }
}

fn required(errors: &mut FormErrors, field: Field, raw: &str, max_chars: usize) -> String {
    let value = raw.trim();
    if value.is_empty() {
        errors.push(field, "This field is required.");
    } else if value.chars().count() > max_chars {
        errors.push(field, too_long(max_chars, value));
    }

    value.to_string()
}

fn too_long(max_chars: usize, value: &str) -> String {
    format!(
        "Ensure this value has at most {max_chars} characters (it has {}).",
        value.chars().count()
    )
}
