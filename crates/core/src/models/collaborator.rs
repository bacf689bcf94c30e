//! Collaborators (the `users` collection).

use serde::{Deserialize, Serialize};

use super::{Record, ValidationError, require};
use crate::{CollaboratorId, CollaboratorRole, MagasinCode};

/// A member of staff who can be assigned to orders and repairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub id: CollaboratorId,
    pub name: String,
    pub role: CollaboratorRole,
    /// Home store; `None` for staff working across the chain.
    #[serde(default)]
    pub magasin: Option<MagasinCode>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// Editable collaborator fields.
#[derive(Debug, Clone, Deserialize)]
pub struct CollaboratorInput {
    pub name: String,
    pub role: CollaboratorRole,
    #[serde(default)]
    pub magasin: Option<MagasinCode>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Collaborator {
    /// Create a collaborator from form input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] when the name is blank.
    pub fn new(input: CollaboratorInput) -> Result<Self, ValidationError> {
        require("name", &input.name)?;
        Ok(Self {
            id: CollaboratorId::generate(),
            name: input.name.trim().to_owned(),
            role: input.role,
            magasin: input.magasin,
            active: input.active,
        })
    }

    /// Replace editable fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] when the name is blank.
    pub fn apply(&mut self, input: CollaboratorInput) -> Result<(), ValidationError> {
        require("name", &input.name)?;
        self.name = input.name.trim().to_owned();
        self.role = input.role;
        self.magasin = input.magasin;
        self.active = input.active;
        Ok(())
    }
}

impl Record for Collaborator {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn magasin(&self) -> Option<&MagasinCode> {
        self.magasin.as_ref()
    }
}
