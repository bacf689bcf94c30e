//! Editable store profiles (the `stores` collection).
//!
//! PIN codes never live here; they come from the store directory.

use serde::{Deserialize, Serialize};

use super::Record;
use crate::{Email, MagasinCode};

/// Contact details shown on receipts and repair tickets.
///
/// The document id is the store code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreProfile {
    #[serde(rename = "id")]
    pub code: MagasinCode,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<Email>,
    #[serde(default)]
    pub opening_hours: Option<String>,
}

impl StoreProfile {
    /// An empty profile for `code`.
    #[must_use]
    pub const fn empty(code: MagasinCode) -> Self {
        Self {
            code,
            address: String::new(),
            phone: None,
            email: None,
            opening_hours: None,
        }
    }
}

impl Record for StoreProfile {
    const COLLECTION: &'static str = "stores";

    fn id(&self) -> &str {
        self.code.as_str()
    }

    fn magasin(&self) -> Option<&MagasinCode> {
        Some(&self.code)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_email_is_validated() {
        let profile: StoreProfile = serde_json::from_str(
            r#"{"id": "DIJ", "address": "12 rue de la Liberté", "email": "dijon@SAV-Audition.fr"}"#,
        )
        .unwrap();
        assert_eq!(
            profile.email.as_ref().map(Email::as_str),
            Some("dijon@sav-audition.fr")
        );

        let bad = serde_json::from_str::<StoreProfile>(r#"{"id": "DIJ", "email": "pas-un-mail"}"#);
        assert!(bad.is_err());
    }
}
