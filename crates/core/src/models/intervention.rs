//! Repair and service tickets for hearing aids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ClientRef, Record, ValidationError, require};
use crate::{EarSide, InterventionId, InterventionStatus, MagasinCode, ProblemKind, Urgency};

/// The hearing aid left at the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Device {
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub side: Option<EarSide>,
}

/// A repair ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub id: InterventionId,
    pub client: ClientRef,
    pub magasin: MagasinCode,
    pub device: Device,
    #[serde(default)]
    pub problems: Vec<ProblemKind>,
    #[serde(default)]
    pub description: String,
    /// Work carried out, filled in by the technician.
    #[serde(default)]
    pub actions: String,
    pub status: InterventionStatus,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub technician: Option<String>,
    /// Client signature captured on return, as an image data URL.
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub signed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable intervention fields.
#[derive(Debug, Clone, Deserialize)]
pub struct InterventionInput {
    pub client: ClientRef,
    pub device: Device,
    #[serde(default)]
    pub problems: Vec<ProblemKind>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actions: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub technician: Option<String>,
}

impl InterventionInput {
    /// Check client and device.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] for a missing client name,
    /// device brand, or a ticket with neither problem nor description.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.client.validate()?;
        require("device.brand", &self.device.brand)?;
        if self.problems.is_empty() && self.description.trim().is_empty() {
            return Err(ValidationError::Required("problems"));
        }
        Ok(())
    }
}

/// Why a status change on an intervention was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InterventionError {
    /// The lifecycle forbids the move.
    #[error(transparent)]
    Transition(#[from] crate::TransitionError),
    /// The device cannot be handed back before the client signs.
    #[error("a client signature is required before returning the device")]
    SignatureRequired,
}

impl Intervention {
    /// Open a new ticket.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the input is incomplete.
    pub fn new(
        input: InterventionInput,
        magasin: MagasinCode,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        input.validate()?;
        Ok(Self {
            id: InterventionId::generate(),
            client: input.client,
            magasin,
            device: input.device,
            problems: input.problems,
            description: input.description,
            actions: input.actions,
            status: InterventionStatus::Ouverte,
            urgency: input.urgency,
            technician: input.technician,
            signature: None,
            signed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace editable fields.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the input is incomplete.
    pub fn apply(
        &mut self,
        input: InterventionInput,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        input.validate()?;
        self.client = input.client;
        self.device = input.device;
        self.problems = input.problems;
        self.description = input.description;
        self.actions = input.actions;
        self.urgency = input.urgency;
        self.technician = input.technician;
        self.updated_at = now;
        Ok(())
    }

    /// Move to `next`; returning the device requires a signature.
    ///
    /// # Errors
    ///
    /// Returns an [`InterventionError`] when the move is refused.
    pub fn set_status(
        &mut self,
        next: InterventionStatus,
        now: DateTime<Utc>,
    ) -> Result<(), InterventionError> {
        let next = self.status.transition(next)?;
        if next == InterventionStatus::Restituee && self.signature.is_none() {
            return Err(InterventionError::SignatureRequired);
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Attach the client's signature.
    pub fn sign(&mut self, data_url: String, now: DateTime<Utc>) {
        self.signature = Some(data_url);
        self.signed_at = Some(now);
        self.updated_at = now;
    }
}

impl Record for Intervention {
    const COLLECTION: &'static str = "interventions";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn magasin(&self) -> Option<&MagasinCode> {
        Some(&self.magasin)
    }
}

/// Half-filled intervention form kept between page loads.
///
/// Every field is optional so any partial state can be saved.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterventionDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<ProblemKind>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    /// Last time the draft was saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl InterventionDraft {
    /// Whether nothing worth keeping has been entered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.client.is_none()
            && self.device.is_none()
            && self.problems.is_empty()
            && self.description.trim().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> InterventionInput {
        InterventionInput {
            client: ClientRef {
                id: None,
                name: "BLANC Henri".to_owned(),
                phone: Some("0601020304".to_owned()),
            },
            device: Device {
                brand: "Phonak".to_owned(),
                model: "Audéo L90".to_owned(),
                serial: Some("2231XK".to_owned()),
                side: Some(EarSide::Gauche),
            },
            problems: vec![ProblemKind::Sifflement],
            description: String::new(),
            actions: String::new(),
            urgency: Urgency::Urgente,
            technician: None,
        }
    }

    fn finished() -> Intervention {
        let now = Utc::now();
        let mut i = Intervention::new(input(), MagasinCode::parse("AUX").unwrap(), now).unwrap();
        i.set_status(InterventionStatus::EnCours, now).unwrap();
        i.set_status(InterventionStatus::Terminee, now).unwrap();
        i
    }

    #[test]
    fn test_requires_problem_or_description() {
        let mut bad = input();
        bad.problems.clear();
        assert_eq!(bad.validate(), Err(ValidationError::Required("problems")));
        bad.description = "Son faible".to_owned();
        assert!(bad.validate().is_ok());
    }

    #[test]
    fn test_return_requires_signature() {
        let mut i = finished();
        assert_eq!(
            i.set_status(InterventionStatus::Restituee, Utc::now()),
            Err(InterventionError::SignatureRequired)
        );
        i.sign("data:image/svg+xml;base64,AAAA".to_owned(), Utc::now());
        assert!(i.set_status(InterventionStatus::Restituee, Utc::now()).is_ok());
        assert!(i.signed_at.is_some());
    }

    #[test]
    fn test_invalid_transition_is_reported() {
        let now = Utc::now();
        let mut i = Intervention::new(input(), MagasinCode::parse("AUX").unwrap(), now).unwrap();
        assert!(matches!(
            i.set_status(InterventionStatus::Terminee, now),
            Err(InterventionError::Transition(_))
        ));
    }

    #[test]
    fn test_empty_draft_serialises_to_empty_object() {
        let draft = InterventionDraft::default();
        assert!(draft.is_empty());
        assert_eq!(serde_json::to_string(&draft).unwrap(), "{}");
    }
}
