//! Reimbursement statements (décomptes) from social security or a mutuelle.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ClientRef, Record, ValidationError, require};
use crate::{DecompteId, DecompteKind, DecompteStatus, InvoiceId, MagasinCode, TransitionError};

/// Breakdown of a hearing-aid bill between payers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Amounts {
    pub total: Decimal,
    pub secu: Decimal,
    pub mutuelle: Decimal,
    pub reste_a_charge: Decimal,
}

impl Amounts {
    /// Check no amount is negative and the shares sum to the total.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] for a negative amount and
    /// [`ValidationError::Inconsistent`] when the shares do not add up.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("amounts.total", self.total),
            ("amounts.secu", self.secu),
            ("amounts.mutuelle", self.mutuelle),
            ("amounts.reste_a_charge", self.reste_a_charge),
        ] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(ValidationError::OutOfRange {
                    field,
                    reason: "must not be negative".to_owned(),
                });
            }
        }

        let shares = self
            .secu
            .checked_add(self.mutuelle)
            .and_then(|sum| sum.checked_add(self.reste_a_charge))
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "amounts",
                reason: "shares are too large".to_owned(),
            })?;
        if shares != self.total {
            return Err(ValidationError::Inconsistent(format!(
                "{shares} shared out but total is {}",
                self.total
            )));
        }
        Ok(())
    }
}

/// A scanned or generated document attached to a decompte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedDocument {
    pub label: String,
    pub url: String,
}

/// A reimbursement statement being tracked to payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decompte {
    pub id: DecompteId,
    pub client: ClientRef,
    pub magasin: MagasinCode,
    pub kind: DecompteKind,
    /// Paying organism (CPAM office or mutuelle name).
    #[serde(default)]
    pub organism: String,
    pub status: DecompteStatus,
    pub amounts: Amounts,
    #[serde(default)]
    pub documents: Vec<LinkedDocument>,
    /// Invoice this statement settles.
    #[serde(default)]
    pub invoice: Option<InvoiceId>,
    #[serde(default)]
    pub received_at: Option<NaiveDate>,
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable decompte fields.
#[derive(Debug, Clone, Deserialize)]
pub struct DecompteInput {
    pub client: ClientRef,
    pub kind: DecompteKind,
    #[serde(default)]
    pub organism: String,
    pub amounts: Amounts,
    #[serde(default)]
    pub documents: Vec<LinkedDocument>,
    #[serde(default)]
    pub invoice: Option<InvoiceId>,
    #[serde(default)]
    pub received_at: Option<NaiveDate>,
}

impl DecompteInput {
    /// Check client, amounts and document links.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.client.validate()?;
        self.amounts.validate()?;
        for doc in &self.documents {
            require("documents.url", &doc.url)?;
        }
        Ok(())
    }
}

impl Decompte {
    /// Register a new statement, status `a_traiter`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the input is inconsistent.
    pub fn new(
        input: DecompteInput,
        magasin: MagasinCode,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        input.validate()?;
        Ok(Self {
            id: DecompteId::generate(),
            client: input.client,
            magasin,
            kind: input.kind,
            organism: input.organism,
            status: DecompteStatus::ATraiter,
            amounts: input.amounts,
            documents: input.documents,
            invoice: input.invoice,
            received_at: input.received_at,
            processed_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace editable fields.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the input is inconsistent.
    pub fn apply(
        &mut self,
        input: DecompteInput,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        input.validate()?;
        self.client = input.client;
        self.kind = input.kind;
        self.organism = input.organism;
        self.amounts = input.amounts;
        self.documents = input.documents;
        self.invoice = input.invoice;
        self.received_at = input.received_at;
        self.updated_at = now;
        Ok(())
    }

    /// Move to `next`. Rejections keep their reason; reopening clears it.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the lifecycle forbids the move.
    pub fn set_status(
        &mut self,
        next: DecompteStatus,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.status = self.status.transition(next)?;
        match next {
            DecompteStatus::Rembourse => self.processed_at = Some(now),
            DecompteStatus::Rejete => {
                self.processed_at = Some(now);
                self.rejection_reason = reason;
            }
            DecompteStatus::ATraiter => {
                self.processed_at = None;
                self.rejection_reason = None;
            }
            DecompteStatus::Transmis => {}
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Record for Decompte {
    const COLLECTION: &'static str = "decomptes";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn magasin(&self) -> Option<&MagasinCode> {
        Some(&self.magasin)
    }
}
