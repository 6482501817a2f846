//! Ticket barcodes and the local format check applied before any request.

use std::fmt;
use std::sync::LazyLock;
use std::{ops::Deref, str::FromStr};

use event_ticket_common::error::RequestError;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de::Error};
use smol_str::SmolStr;

/// A ticket barcode that passed local format checks.
///
/// Barcodes are 6 to 12 ASCII letters or digits, case-insensitive. The
/// original case is kept; the server does its own matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Barcode(SmolStr);

/// Accepted barcode format.
pub static BARCODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{6,12}$").unwrap());

impl Barcode {
    /// Fallible constructor, validates the format.
    pub fn new(barcode: &str) -> Result<Self, RequestError> {
        if Self::is_valid(barcode) {
            Ok(Self(SmolStr::new(barcode)))
        } else {
            Err(RequestError::InvalidBarcode(barcode.to_owned()))
        }
    }

    /// Whether `barcode` would be accepted by [`Barcode::new`].
    pub fn is_valid(barcode: &str) -> bool {
        BARCODE_REGEX.is_match(barcode)
    }

    /// The barcode as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Barcode {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for Barcode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: SmolStr = Deserialize::deserialize(deserializer)?;
        Self::new(&value).map_err(D::Error::custom)
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for Barcode {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for Barcode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<Barcode> for String {
    fn from(value: Barcode) -> Self {
        value.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alphanumeric_six_to_twelve() {
        for ok in ["ABC123", "abc123", "ABC123XYZ", "000000", "a1B2c3D4e5F6"] {
            assert!(Barcode::new(ok).is_ok(), "{ok} should be accepted");
        }
    }

    #[test]
    fn rejects_everything_else() {
        for bad in [
            "",
            "ABC12",
            "ABC123XYZ0123",
            "ABC-123",
            "ABC 123",
            "ABC123\n",
            "ÄBC123",
            "\u{212A}ABC123",
            "../user",
        ] {
            match Barcode::new(bad) {
                Err(RequestError::InvalidBarcode(s)) => assert_eq!(s, bad),
                other => panic!("{bad:?} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn keeps_case_and_displays_plainly() {
        let barcode: Barcode = "abcDEF123".parse().unwrap();
        assert_eq!(barcode.to_string(), "abcDEF123");
        assert_eq!(&*barcode, "abcDEF123");
    }

    #[test]
    fn deserialize_validates() {
        let ok: Barcode = serde_json::from_str("\"XYZ98765\"").unwrap();
        assert_eq!(ok.as_str(), "XYZ98765");
        assert!(serde_json::from_str::<Barcode>("\"no\"").is_err());
    }
}
