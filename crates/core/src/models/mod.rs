//! Records persisted in the remote document store.
//!
//! Every record names its collection through [`Record`]. The document id
//! is carried in the record's `id` field in memory; repositories move it
//! into the document name when writing.

pub mod client;
pub mod collaborator;
pub mod decompte;
pub mod intervention;
pub mod invoice;
pub mod order;
pub mod store;

pub use client::{Client, ClientInput};
pub use collaborator::{Collaborator, CollaboratorInput};
pub use decompte::{Amounts, Decompte, DecompteInput, LinkedDocument};
pub use intervention::{
    Device, Intervention, InterventionDraft, InterventionError, InterventionInput,
};
pub use invoice::{Invoice, InvoiceInput, Payment, PaymentError, PaymentMethod};
pub use order::{Order, OrderInput, OrderLine};
pub use store::StoreProfile;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{ClientId, MagasinCode};

/// A record stored as one document in a named collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection holding records of this type.
    const COLLECTION: &'static str;

    /// Document id of this record.
    fn id(&self) -> &str;

    /// Store owning this record, if the record is store-scoped.
    fn magasin(&self) -> Option<&MagasinCode>;
}

/// Errors raised when a record fails its own consistency rules.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is blank.
    #[error("{0} is required")]
    Required(&'static str),
    /// A numeric field is outside its allowed range.
    #[error("{field}: {reason}")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// What was wrong.
        reason: String,
    },
    /// Amounts do not add up.
    #[error("amounts do not add up: {0}")]
    Inconsistent(String),
}

/// Denormalised reference to a client, copied onto tickets so lists can
/// render without a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRef {
    /// Client document id, when the client has a record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ClientId>,
    /// Display name ("NOM Prénom").
    pub name: String,
    /// Contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ClientRef {
    /// Check the reference has a name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] when the name is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("client.name", &self.name)
    }
}

/// Fail when `value` is blank.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}
