use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Passengers younger than this do not occupy a berth
pub const CHILD_AGE_LIMIT: u32 = 5;

/// Longest accepted passenger name, in characters
pub const MAX_NAME_LEN: usize = 100;

/// Identifier of a stored passenger
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassengerId(pub u64);

impl fmt::Display for PassengerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Gender of a passenger
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Gender {
    /// Male passenger
    #[serde(rename = "M")]
    Male,
    /// Female passenger
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    /// Parse the wire code (`M`/`F`) or the long name, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("m") || s.eq_ignore_ascii_case("male") {
            Some(Gender::Male)
        } else if s.eq_ignore_ascii_case("f") || s.eq_ignore_ascii_case("female") {
            Some(Gender::Female)
        } else {
            None
        }
    }
}

/// Passenger data as submitted by a client, not yet validated
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerFields {
    /// Full name
    pub name: String,
    /// Age in years
    pub age: i64,
    /// `M`, `F`, `Male` or `Female`
    pub gender: String,
    /// Whether the passenger travels with a child
    #[serde(default)]
    pub has_child: bool,
}

impl PassengerFields {
    /// Shorthand for building a request in code
    pub fn new(name: impl Into<String>, age: i64, gender: Gender, has_child: bool) -> Self {
        let gender = match gender {
            Gender::Male => "M",
            Gender::Female => "F",
        };
        Self {
            name: name.into(),
            age,
            gender: gender.to_owned(),
            has_child,
        }
    }

    /// Check the submitted fields
    ///
    /// Nothing is stored by this method; a booking that fails here never
    /// reaches the database.
    pub fn validate(self) -> Result<PassengerDetails, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let len = name.chars().count();
        if len > MAX_NAME_LEN {
            return Err(ValidationError::NameTooLong {
                len,
                max: MAX_NAME_LEN,
            });
        }
        let age = u32::try_from(self.age).map_err(|_| ValidationError::InvalidAge(self.age))?;
        let gender = Gender::parse(&self.gender)
            .ok_or_else(|| ValidationError::UnknownGender(self.gender.clone()))?;

        Ok(PassengerDetails {
            name: name.to_owned(),
            age,
            gender,
            has_child: self.has_child,
        })
    }
}

/// Validated passenger data, ready to be stored
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassengerDetails {
    /// Full name
    pub name: String,
    /// Age in years
    pub age: u32,
    /// Gender
    pub gender: Gender,
    /// Whether the passenger travels with a child
    pub has_child: bool,
}

/// A stored passenger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    /// Identifier
    pub id: PassengerId,
    /// Full name
    pub name: String,
    /// Age in years
    pub age: u32,
    /// Gender
    pub gender: Gender,
    /// Whether the passenger travels with a child
    pub has_child: bool,
}

impl Passenger {
    /// Attach an identifier to validated details
    pub fn new(id: PassengerId, details: PassengerDetails) -> Self {
        Self {
            id,
            name: details.name,
            age: details.age,
            gender: details.gender,
            has_child: details.has_child,
        }
    }

    /// Children under [`CHILD_AGE_LIMIT`] travel without a berth of their own
    #[inline]
    pub fn is_child(&self) -> bool {
        self.age < CHILD_AGE_LIMIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_trims_and_parses_gender() {
        let details = PassengerFields {
            name: "  Asha  ".into(),
            age: 34,
            gender: "female".into(),
            has_child: true,
        }
        .validate()
        .unwrap();
        assert_eq!(details.name, "Asha");
        assert_eq!(details.gender, Gender::Female);
        assert!(details.has_child);
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let blank = PassengerFields::new("   ", 30, Gender::Male, false);
        assert_eq!(blank.validate(), Err(ValidationError::EmptyName));

        let negative = PassengerFields::new("Ravi", -1, Gender::Male, false);
        assert_eq!(negative.validate(), Err(ValidationError::InvalidAge(-1)));

        let mut other = PassengerFields::new("Ravi", 40, Gender::Male, false);
        other.gender = "X".into();
        assert_eq!(
            other.validate(),
            Err(ValidationError::UnknownGender("X".into()))
        );

        let long = PassengerFields::new("a".repeat(MAX_NAME_LEN + 1), 40, Gender::Male, false);
        assert!(matches!(
            long.validate(),
            Err(ValidationError::NameTooLong { .. })
        ));
    }

    #[test]
    fn child_boundary() {
        let details = PassengerFields::new("Tara", 4, Gender::Female, false)
            .validate()
            .unwrap();
        assert!(Passenger::new(PassengerId(1), details).is_child());

        let details = PassengerFields::new("Tara", 5, Gender::Female, false)
            .validate()
            .unwrap();
        assert!(!Passenger::new(PassengerId(1), details).is_child());
    }
}
