//! Invoices and the payments registered against them.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ClientRef, Record, ValidationError, require};
use crate::{DecompteId, InvoiceId, InvoiceStatus, MagasinCode, format_eur};

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Carte,
    Cheque,
    Especes,
    Virement,
    /// Paid directly by social security or a mutuelle.
    TiersPayant,
}

impl PaymentMethod {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Carte => "Carte bancaire",
            Self::Cheque => "Chèque",
            Self::Especes => "Espèces",
            Self::Virement => "Virement",
            Self::TiersPayant => "Tiers payant",
        }
    }
}

/// A payment received against an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Why a payment was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Zero or negative amount.
    #[error("payment amount must be positive")]
    NotPositive,
    /// More than what is left to pay.
    #[error("payment of {amount} exceeds the remaining {remaining}")]
    Overpayment {
        /// Attempted amount, formatted.
        amount: String,
        /// Balance left, formatted.
        remaining: String,
    },
    /// The invoice was cancelled.
    #[error("invoice is cancelled")]
    Cancelled,
    /// The invoice is already settled.
    #[error("invoice is already paid")]
    AlreadyPaid,
}

/// An invoice issued to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// Human invoice number, e.g. `F2026-0142`.
    pub number: String,
    pub client: ClientRef,
    pub magasin: MagasinCode,
    pub status: InvoiceStatus,
    pub amount_total: Decimal,
    #[serde(default)]
    pub amount_paid: Decimal,
    #[serde(default)]
    pub payments: Vec<Payment>,
    /// Reimbursement statements covering part of this invoice.
    #[serde(default)]
    pub decomptes: Vec<DecompteId>,
    pub issued_at: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable invoice fields.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceInput {
    pub number: String,
    pub client: ClientRef,
    pub amount_total: Decimal,
    #[serde(default)]
    pub decomptes: Vec<DecompteId>,
    pub issued_at: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl InvoiceInput {
    /// Check number, client and total.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a blank number or client, a
    /// non-positive total, or a due date before the issue date.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("number", &self.number)?;
        self.client.validate()?;
        if self.amount_total <= Decimal::ZERO {
            return Err(ValidationError::OutOfRange {
                field: "amount_total",
                reason: "must be positive".to_owned(),
            });
        }
        if self.due_date.is_some_and(|due| due < self.issued_at) {
            return Err(ValidationError::OutOfRange {
                field: "due_date",
                reason: "must not precede the issue date".to_owned(),
            });
        }
        Ok(())
    }
}

impl Invoice {
    /// Issue a new invoice with nothing paid.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the input is invalid.
    pub fn new(
        input: InvoiceInput,
        magasin: MagasinCode,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        input.validate()?;
        Ok(Self {
            id: InvoiceId::generate(),
            number: input.number.trim().to_owned(),
            client: input.client,
            magasin,
            status: InvoiceStatus::Emise,
            amount_total: input.amount_total,
            amount_paid: Decimal::ZERO,
            payments: Vec::new(),
            decomptes: input.decomptes,
            issued_at: input.issued_at,
            due_date: input.due_date,
            paid_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace editable fields and recompute the payment status.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the input is invalid or the new
    /// total is below what has already been paid.
    pub fn apply(&mut self, input: InvoiceInput, now: DateTime<Utc>) -> Result<(), ValidationError> {
        input.validate()?;
        if input.amount_total < self.amount_paid {
            return Err(ValidationError::Inconsistent(format!(
                "total {} is below the {} already paid",
                format_eur(input.amount_total),
                format_eur(self.amount_paid)
            )));
        }
        self.number = input.number.trim().to_owned();
        self.client = input.client;
        self.amount_total = input.amount_total;
        self.decomptes = input.decomptes;
        self.issued_at = input.issued_at;
        self.due_date = input.due_date;
        self.refresh_status(now);
        self.updated_at = now;
        Ok(())
    }

    /// Balance still to be paid.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        (self.amount_total - self.amount_paid).max(Decimal::ZERO)
    }

    /// Whether money is still owed after the due date.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !matches!(self.status, InvoiceStatus::Payee | InvoiceStatus::Annulee)
            && self.due_date.is_some_and(|due| due < today)
    }

    /// Record a payment and update the status.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`] when the invoice cannot take the payment.
    pub fn register_payment(&mut self, payment: Payment) -> Result<(), PaymentError> {
        match self.status {
            InvoiceStatus::Annulee => return Err(PaymentError::Cancelled),
            InvoiceStatus::Payee => return Err(PaymentError::AlreadyPaid),
            InvoiceStatus::Emise | InvoiceStatus::Partielle => {}
        }
        if payment.amount <= Decimal::ZERO {
            return Err(PaymentError::NotPositive);
        }
        let remaining = self.remaining();
        if payment.amount > remaining {
            return Err(PaymentError::Overpayment {
                amount: format_eur(payment.amount),
                remaining: format_eur(remaining),
            });
        }

        let at = payment.received_at;
        self.amount_paid += payment.amount;
        self.payments.push(payment);
        self.refresh_status(at);
        self.updated_at = at;
        Ok(())
    }

    /// Cancel the invoice. Paid invoices cannot be cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::AlreadyPaid`] for a settled invoice.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), PaymentError> {
        if self.status == InvoiceStatus::Payee {
            return Err(PaymentError::AlreadyPaid);
        }
        self.status = InvoiceStatus::Annulee;
        self.updated_at = now;
        Ok(())
    }

    fn refresh_status(&mut self, now: DateTime<Utc>) {
        if self.status == InvoiceStatus::Annulee {
            return;
        }
        self.status = if self.amount_paid.is_zero() {
            InvoiceStatus::Emise
        } else if self.amount_paid < self.amount_total {
            InvoiceStatus::Partielle
        } else {
            InvoiceStatus::Payee
        };
        if self.status == InvoiceStatus::Payee {
            self.paid_at.get_or_insert(now);
        } else {
            self.paid_at = None;
        }
    }
}

impl Record for Invoice {
    const COLLECTION: &'static str = "invoices";

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

    fn invoice(total: i64) -> Invoice {
        Invoice::new(
            InvoiceInput {
                number: "F2026-0142".to_owned(),
                client: ClientRef {
                    id: None,
                    name: "ROUX Paul".to_owned(),
                    phone: None,
                },
                amount_total: Decimal::new(total, 0),
                decomptes: vec![],
                issued_at: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                due_date: NaiveDate::from_ymd_opt(2026, 3, 31),
            },
            MagasinCode::parse("MAC").unwrap(),
            Utc::now(),
        )
        .unwrap()
    }

    fn payment(amount: i64) -> Payment {
        Payment {
            amount: Decimal::new(amount, 0),
            method: PaymentMethod::Carte,
            received_at: Utc::now(),
            note: None,
        }
    }

    #[test]
    fn test_partial_then_full_payment() {
        let mut inv = invoice(1500);
        inv.register_payment(payment(500)).unwrap();
        assert_eq!(inv.status, InvoiceStatus::Partielle);
        assert_eq!(inv.remaining(), Decimal::new(1000, 0));
        assert!(inv.paid_at.is_none());

        inv.register_payment(payment(1000)).unwrap();
        assert_eq!(inv.status, InvoiceStatus::Payee);
        assert!(inv.paid_at.is_some());
        assert_eq!(inv.register_payment(payment(1)), Err(PaymentError::AlreadyPaid));
    }

    #[test]
    fn test_overpayment_is_refused() {
        let mut inv = invoice(100);
        assert!(matches!(
            inv.register_payment(payment(150)),
            Err(PaymentError::Overpayment { .. })
        ));
        assert_eq!(inv.register_payment(payment(0)), Err(PaymentError::NotPositive));
        assert!(inv.payments.is_empty());
    }

    #[test]
    fn test_cancelled_invoice_takes_no_payment() {
        let mut inv = invoice(100);
        inv.cancel(Utc::now()).unwrap();
        assert_eq!(inv.register_payment(payment(10)), Err(PaymentError::Cancelled));
        assert!(!inv.is_overdue(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()));
    }

    #[test]
    fn test_overdue_after_due_date() {
        let inv = invoice(100);
        assert!(!inv.is_overdue(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()));
        assert!(inv.is_overdue(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()));
    }

    #[test]
    fn test_due_date_cannot_precede_issue() {
        let mut input = InvoiceInput {
            number: "F1".to_owned(),
            client: ClientRef {
                id: None,
                name: "X".to_owned(),
                phone: None,
            },
            amount_total: Decimal::ONE,
            decomptes: vec![],
            issued_at: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 2, 1),
        };
        assert!(input.validate().is_err());
        input.due_date = None;
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_lowering_total_below_paid_is_refused() {
        let mut inv = invoice(1000);
        inv.register_payment(payment(800)).unwrap();
        let input = InvoiceInput {
            number: inv.number.clone(),
            client: inv.client.clone(),
            amount_total: Decimal::new(500, 0),
            decomptes: vec![],
            issued_at: inv.issued_at,
            due_date: None,
        };
        assert!(matches!(
            inv.apply(input, Utc::now()),
            Err(ValidationError::Inconsistent(_))
        ));
    }
}
