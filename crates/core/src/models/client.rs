//! Client records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ClientRef, Record, ValidationError, require};
use crate::{ClientId, Email, MagasinCode};

/// A client of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub last_name: String,
    pub first_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<Email>,
    pub magasin: MagasinCode,
    /// Social security number, kept as typed.
    #[serde(default)]
    pub social_security_number: Option<String>,
    /// Name of the client's complementary insurer.
    #[serde(default)]
    pub mutuelle: Option<String>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable client fields, as posted by the client form.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInput {
    pub last_name: String,
    pub first_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<Email>,
    #[serde(default)]
    pub social_security_number: Option<String>,
    #[serde(default)]
    pub mutuelle: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl ClientInput {
    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] when the last name is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("last_name", &self.last_name)
    }
}

impl Client {
    /// Create a client owned by `magasin`.
    #[must_use]
    pub fn new(input: ClientInput, magasin: MagasinCode, now: DateTime<Utc>) -> Self {
        Self {
            id: ClientId::generate(),
            last_name: input.last_name.trim().to_uppercase(),
            first_name: input.first_name.trim().to_owned(),
            phone: input.phone,
            email: input.email,
            magasin,
            social_security_number: input.social_security_number,
            mutuelle: input.mutuelle,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace editable fields, keeping identity and ownership.
    pub fn apply(&mut self, input: ClientInput, now: DateTime<Utc>) {
        self.last_name = input.last_name.trim().to_uppercase();
        self.first_name = input.first_name.trim().to_owned();
        self.phone = input.phone;
        self.email = input.email;
        self.social_security_number = input.social_security_number;
        self.mutuelle = input.mutuelle;
        self.notes = input.notes;
        self.updated_at = now;
    }

    /// "NOM Prénom".
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.first_name.is_empty() {
            self.last_name.clone()
        } else {
            format!("{} {}", self.last_name, self.first_name)
        }
    }

    /// Reference to copy onto orders and tickets.
    #[must_use]
    pub fn reference(&self) -> ClientRef {
        ClientRef {
            id: Some(self.id.clone()),
            name: self.display_name(),
            phone: self.phone.clone(),
        }
    }

    /// Case-insensitive match on names; phone numbers match ignoring spaces and dots.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        if self.last_name.to_lowercase().contains(&query)
            || self.first_name.to_lowercase().contains(&query)
        {
            return true;
        }
        let digits: String = query.chars().filter(char::is_ascii_digit).collect();
        !digits.is_empty()
            && self.phone.as_deref().is_some_and(|phone| {
                let phone: String = phone.chars().filter(char::is_ascii_digit).collect();
                phone.contains(&digits)
            })
    }
}

impl Record for Client {
    const COLLECTION: &'static str = "clients";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn magasin(&self) -> Option<&MagasinCode> {
        Some(&self.magasin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new(
            ClientInput {
                last_name: " Martin ".to_owned(),
                first_name: "Jeanne".to_owned(),
                phone: Some("03 80 12 34 56".to_owned()),
                email: None,
                social_security_number: None,
                mutuelle: Some("Harmonie".to_owned()),
                notes: String::new(),
            },
            MagasinCode::parse("DIJ").unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_normalises_names() {
        let c = client();
        assert_eq!(c.last_name, "MARTIN");
        assert_eq!(c.display_name(), "MARTIN Jeanne");
    }

    #[test]
    fn test_matches_name_and_phone() {
        let c = client();
        assert!(c.matches("mart"));
        assert!(c.matches("JEANNE"));
        assert!(c.matches("0380.12"));
        assert!(!c.matches("dupont"));
        assert!(c.matches("  "));
    }

    #[test]
    fn test_reference_carries_id_and_phone() {
        let c = client();
        let r = c.reference();
        assert_eq!(r.id.as_ref(), Some(&c.id));
        assert_eq!(r.phone.as_deref(), Some("03 80 12 34 56"));
    }
}
