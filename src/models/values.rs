//! Validated value objects of the catalog.
//!
//! Every type here rejects malformed input at construction, so a value that
//! exists is a valid one. Deserialization goes through the same checks.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

static ISBN_13: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{3}-?)?[0-9]{10}$").expect("ISBN pattern is valid"));

/// Globally unique book identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(Uuid);

impl BookId {
    /// A fresh random (v4) identifier. Uniqueness against the store is the
    /// identifier generator's job.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| AppError::Validation(format!("'{}' is not a valid book id", s)))
    }
}

/// ISBN-13, optionally hyphenated after the 3-digit prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isbn13(String);

impl Isbn13 {
    pub fn parse(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if ISBN_13.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(AppError::Validation(format!("'{}' is not a valid ISBN-13", value)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Isbn13 {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Isbn13> for String {
    fn from(isbn: Isbn13) -> Self {
        isbn.0
    }
}

impl fmt::Display for Isbn13 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declares a string newtype that refuses blank input.
macro_rules! non_blank_string {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn parse(value: impl Into<String>) -> AppResult<Self> {
                let value = value.into();
                if value.trim().is_empty() {
                    Err(AppError::Validation(format!("{} must not be blank", $label)))
                } else {
                    Ok(Self(value))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = AppError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

non_blank_string!(
    /// Book title
    Title,
    "Title"
);

non_blank_string!(
    /// Name of a contributor to a book
    Author,
    "Author"
);

non_blank_string!(
    /// Name of the person holding a borrowed book
    Borrower,
    "Borrower"
);

/// Page count of a book, always positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct NumberOfPages(u32);

impl NumberOfPages {
    /// Largest accepted page count, the range of a PostgreSQL `INTEGER`
    pub const MAX: u32 = i32::MAX as u32;

    pub fn new(value: i64) -> AppResult<Self> {
        u32::try_from(value)
            .ok()
            .filter(|pages| (1..=Self::MAX).contains(pages))
            .map(Self)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Number of pages must be between 1 and {}, got {}",
                    Self::MAX,
                    value
                ))
            })
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn as_i32(&self) -> i32 {
        // Bounded by MAX on construction
        self.0 as i32
    }
}

impl TryFrom<i64> for NumberOfPages {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NumberOfPages> for i64 {
    fn from(pages: NumberOfPages) -> Self {
        i64::from(pages.0)
    }
}
