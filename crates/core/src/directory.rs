//! The store directory: which stores exist and their PIN codes.
//!
//! The table is static configuration. A deployment either uses the
//! built-in table or replaces it wholesale with a `CODE:PIN[:Name]` list.

use std::collections::BTreeMap;

use crate::{MagasinCode, MagasinCodeError, Pin, PinError};

/// Built-in stores: code, PIN, display name.
const BUILTIN_STORES: &[(&str, &str, &str)] = &[
    ("ADMIN", "1988", "Direction"),
    ("BEA", "2741", "Beaune"),
    ("DIJ", "5310", "Dijon"),
    ("CHA", "8127", "Chalon-sur-Saône"),
    ("AUX", "4602", "Auxerre"),
    ("MAC", "3958", "Mâcon"),
];

/// Errors raised while parsing a store list.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// An entry is not `CODE:PIN` or `CODE:PIN:Name`.
    #[error("store entry '{0}' must be CODE:PIN or CODE:PIN:Name")]
    Malformed(String),
    /// Bad store code.
    #[error("store entry '{entry}': {source}")]
    Code {
        /// Offending entry.
        entry: String,
        /// Parse failure.
        source: MagasinCodeError,
    },
    /// Bad PIN.
    #[error("store entry '{entry}': {source}")]
    Pin {
        /// Offending entry (PIN masked).
        entry: String,
        /// Parse failure.
        source: PinError,
    },
    /// The same code appears twice.
    #[error("store {0} is listed twice")]
    Duplicate(String),
    /// No stores at all.
    #[error("store list is empty")]
    Empty,
}

/// One store and its PIN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub code: MagasinCode,
    pub name: String,
    pin: Pin,
}

impl StoreEntry {
    /// Whether `pin` opens this store.
    #[must_use]
    pub fn accepts(&self, pin: &Pin) -> bool {
        self.pin.matches(pin)
    }
}

/// Lookup table of stores keyed by code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDirectory {
    entries: BTreeMap<MagasinCode, StoreEntry>,
}

impl StoreDirectory {
    /// The built-in table.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = BUILTIN_STORES
            .iter()
            .filter_map(|(code, pin, name)| {
                let code = MagasinCode::parse(code).ok()?;
                let pin = Pin::parse(pin).ok()?;
                Some((
                    code.clone(),
                    StoreEntry {
                        code,
                        name: (*name).to_owned(),
                        pin,
                    },
                ))
            })
            .collect();
        Self { entries }
    }

    /// Parse a `CODE:PIN[:Name],CODE:PIN[:Name]` list.
    ///
    /// ```
    /// use sav_core::{MagasinCode, Pin, StoreDirectory};
    ///
    /// let dir = StoreDirectory::parse("ADMIN:1988:Direction, lyo:4321").unwrap();
    /// let lyon = MagasinCode::parse("LYO").unwrap();
    /// assert_eq!(dir.get(&lyon).unwrap().name, "LYO");
    /// assert!(dir.verify(&lyon, &Pin::parse("4321").unwrap()));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a [`DirectoryError`] for malformed entries, duplicates or an
    /// empty list.
    pub fn parse(spec: &str) -> Result<Self, DirectoryError> {
        let mut entries = BTreeMap::new();

        for raw in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let mut parts = raw.splitn(3, ':').map(str::trim);
            let (Some(code), Some(pin)) = (parts.next(), parts.next()) else {
                return Err(DirectoryError::Malformed(mask(raw)));
            };
            let code = MagasinCode::parse(code).map_err(|source| DirectoryError::Code {
                entry: mask(raw),
                source,
            })?;
            let pin = Pin::parse(pin).map_err(|source| DirectoryError::Pin {
                entry: mask(raw),
                source,
            })?;
            let name = parts
                .next()
                .filter(|n| !n.is_empty())
                .map_or_else(|| code.to_string(), str::to_owned);

            if entries.contains_key(&code) {
                return Err(DirectoryError::Duplicate(code.to_string()));
            }
            entries.insert(code.clone(), StoreEntry { code, name, pin });
        }

        if entries.is_empty() {
            return Err(DirectoryError::Empty);
        }
        Ok(Self { entries })
    }

    /// Look up a store.
    #[must_use]
    pub fn get(&self, code: &MagasinCode) -> Option<&StoreEntry> {
        self.entries.get(code)
    }

    /// Whether `pin` is the configured code for `code`. Unknown stores never match.
    #[must_use]
    pub fn verify(&self, code: &MagasinCode, pin: &Pin) -> bool {
        self.get(code).is_some_and(|entry| entry.accepts(pin))
    }

    /// Stores in code order.
    pub fn iter(&self) -> impl Iterator<Item = &StoreEntry> {
        self.entries.values()
    }

    /// Number of stores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StoreDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Hide the PIN part of an entry before it reaches an error message.
fn mask(entry: &str) -> String {
    match entry.split_once(':') {
        Some((code, _)) => format!("{code}:****"),
        None => entry.to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn code(s: &str) -> MagasinCode {
        MagasinCode::parse(s).unwrap()
    }

    fn pin(s: &str) -> Pin {
        Pin::parse(s).unwrap()
    }

    #[test]
    fn test_builtin_contains_admin() {
        let dir = StoreDirectory::builtin();
        assert_eq!(dir.len(), BUILTIN_STORES.len());
        assert!(dir.verify(&code("ADMIN"), &pin("1988")));
        assert!(!dir.verify(&code("ADMIN"), &pin("1989")));
    }

    #[test]
    fn test_verify_succeeds_only_with_configured_pin() {
        let dir = StoreDirectory::builtin();
        for (c, p, _) in BUILTIN_STORES {
            for (other_code, other_pin, _) in BUILTIN_STORES {
                let expected = other_pin == p;
                assert_eq!(dir.verify(&code(c), &pin(other_pin)), expected, "{c} with pin of {other_code}");
            }
        }
    }

    #[test]
    fn test_unknown_store_never_matches() {
        let dir = StoreDirectory::builtin();
        assert!(!dir.verify(&code("ZZZ"), &pin("1988")));
    }

    #[test]
    fn test_parse_rejects_duplicates_and_bad_entries() {
        assert_eq!(
            StoreDirectory::parse("DIJ:1111,dij:2222"),
            Err(DirectoryError::Duplicate("DIJ".to_owned()))
        );
        assert!(matches!(
            StoreDirectory::parse("DIJ"),
            Err(DirectoryError::Malformed(_))
        ));
        assert!(matches!(
            StoreDirectory::parse("DIJ:12a4"),
            Err(DirectoryError::Pin { .. })
        ));
        assert_eq!(StoreDirectory::parse(" , "), Err(DirectoryError::Empty));
    }

    #[test]
    fn test_parse_errors_never_echo_the_pin() {
        let err = StoreDirectory::parse("D-J:9876").unwrap_err();
        assert!(!err.to_string().contains("9876"));
    }

    #[test]
    fn test_parse_keeps_names() {
        let dir = StoreDirectory::parse("DIJ:1111:Dijon centre").unwrap();
        assert_eq!(dir.get(&code("DIJ")).unwrap().name, "Dijon centre");
    }
}
