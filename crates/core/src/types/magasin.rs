//! Store codes and PIN codes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Code of the head-office store, which sees every store's records.
pub const ADMIN_CODE: &str = "ADMIN";

/// Errors that can occur when parsing a [`MagasinCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MagasinCodeError {
    /// The code has the wrong length.
    #[error("store code must be {min} to {max} characters")]
    Length {
        /// Minimum allowed length.
        min: usize,
        /// Maximum allowed length.
        max: usize,
    },
    /// The code contains something other than ASCII letters and digits.
    #[error("store code may only contain letters and digits")]
    InvalidCharacter,
}

/// Short code identifying a store (magasin).
///
/// Codes are normalised to upper case on parse, so `"dij"` and `"DIJ"`
/// name the same store.
///
/// ```
/// use sav_core::MagasinCode;
///
/// let code = MagasinCode::parse(" dij ").unwrap();
/// assert_eq!(code.as_str(), "DIJ");
/// assert!(MagasinCode::parse("D").is_err());
/// assert!(MagasinCode::parse("DI-J").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MagasinCode(String);

impl MagasinCode {
    /// Minimum code length.
    pub const MIN_LENGTH: usize = 2;
    /// Maximum code length.
    pub const MAX_LENGTH: usize = 12;

    /// Parse and normalise a store code.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is not 2 to 12 ASCII
    /// alphanumeric characters.
    pub fn parse(s: &str) -> Result<Self, MagasinCodeError> {
        let s = s.trim();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&s.len()) {
            return Err(MagasinCodeError::Length {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(MagasinCodeError::InvalidCharacter);
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    /// The head-office code.
    #[must_use]
    pub fn admin() -> Self {
        Self(ADMIN_CODE.to_owned())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the head-office store.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0 == ADMIN_CODE
    }

    /// Whether a session for this store may see records of `owner`.
    #[must_use]
    pub fn can_access(&self, owner: &Self) -> bool {
        self.is_admin() || self == owner
    }
}

impl fmt::Display for MagasinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for MagasinCode {
    type Err = MagasinCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MagasinCode {
    type Error = MagasinCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MagasinCode> for String {
    fn from(code: MagasinCode) -> Self {
        code.0
    }
}

/// Errors that can occur when parsing a [`Pin`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PinError {
    /// The PIN is not exactly four digits.
    #[error("PIN must be exactly {len} digits")]
    Format {
        /// Required length.
        len: usize,
    },
}

/// A four-digit store PIN.
///
/// `Debug` never prints the digits.
#[derive(Clone, PartialEq, Eq)]
pub struct Pin([u8; Pin::LENGTH]);

impl Pin {
    /// Number of digits in a PIN.
    pub const LENGTH: usize = 4;

    /// Parse a PIN from user input.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::Format`] unless the input is exactly four ASCII digits.
    pub fn parse(s: &str) -> Result<Self, PinError> {
        let bytes: [u8; Self::LENGTH] = s
            .as_bytes()
            .try_into()
            .map_err(|_| PinError::Format { len: Self::LENGTH })?;
        if !bytes.iter().all(u8::is_ascii_digit) {
            return Err(PinError::Format { len: Self::LENGTH });
        }
        Ok(Self(bytes))
    }

    /// Compare two PINs without short-circuiting on the first differing digit.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    /// The digits, for writing configuration back out.
    #[must_use]
    pub fn expose(&self) -> &str {
        // Only ASCII digits are ever stored.
        core::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

impl std::str::FromStr for Pin {
    type Err = PinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_uppercased() {
        assert_eq!(MagasinCode::parse("beaune").unwrap().as_str(), "BEAUNE");
    }

    #[test]
    fn test_code_length_limits() {
        assert!(matches!(
            MagasinCode::parse("A"),
            Err(MagasinCodeError::Length { .. })
        ));
        assert!(MagasinCode::parse(&"A".repeat(13)).is_err());
        assert!(MagasinCode::parse(&"A".repeat(12)).is_ok());
    }

    #[test]
    fn test_code_rejects_punctuation() {
        assert_eq!(
            MagasinCode::parse("DI J"),
            Err(MagasinCodeError::InvalidCharacter)
        );
    }

    #[test]
    fn test_admin_can_access_everything() {
        let admin = MagasinCode::admin();
        let dijon = MagasinCode::parse("DIJ").unwrap();
        let beaune = MagasinCode::parse("BEA").unwrap();
        assert!(admin.can_access(&dijon));
        assert!(dijon.can_access(&dijon));
        assert!(!dijon.can_access(&beaune));
    }

    #[test]
    fn test_code_deserialize_validates() {
        let ok: Result<MagasinCode, _> = serde_json::from_str("\"dij\"");
        assert_eq!(ok.unwrap().as_str(), "DIJ");
        let bad: Result<MagasinCode, _> = serde_json::from_str("\"d\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_pin_format() {
        assert!(Pin::parse("1988").is_ok());
        assert!(Pin::parse("198").is_err());
        assert!(Pin::parse("19880").is_err());
        assert!(Pin::parse("19a8").is_err());
        assert!(Pin::parse("").is_err());
    }

    #[test]
    fn test_pin_matches() {
        let pin = Pin::parse("1988").unwrap();
        assert!(pin.matches(&Pin::parse("1988").unwrap()));
        assert!(!pin.matches(&Pin::parse("1989").unwrap()));
    }

    #[test]
    fn test_pin_debug_is_masked() {
        let pin = Pin::parse("1988").unwrap();
        assert!(!format!("{pin:?}").contains("1988"));
        assert_eq!(pin.expose(), "1988");
    }
}
