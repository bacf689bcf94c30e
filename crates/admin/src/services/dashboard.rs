//! Dashboard counters for the signed-in store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sav_core::models::{Decompte, Intervention, Invoice, Order};
use sav_core::{DecompteStatus, InterventionStatus, InvoiceStatus, MagasinCode, OrderStatus, Urgency, format_eur};
use serde::Serialize;

use crate::state::AppState;
use crate::store::StoreError;

/// Number of orders shown in the priority list.
const PRIORITY_LIMIT: usize = 5;

/// One line of the priority list.
#[derive(Debug, Clone, Serialize)]
pub struct PriorityOrder {
    pub id: String,
    pub client: String,
    pub magasin: String,
    pub status: &'static str,
    pub urgency: &'static str,
    pub urgent: bool,
}

/// Work-queue counters shown on the dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSummary {
    pub clients: usize,
    pub orders_open: usize,
    pub orders_urgent: usize,
    pub orders_to_receive: usize,
    pub decomptes_to_process: usize,
    pub decomptes_rejected: usize,
    pub invoices_unpaid: usize,
    pub invoices_overdue: usize,
    pub outstanding: String,
    pub interventions_open: usize,
    pub interventions_awaiting_signature: usize,
    pub priority_orders: Vec<PriorityOrder>,
}

impl DashboardSummary {
    /// Compute counters from already-scoped record lists.
    #[must_use]
    pub fn compute(
        clients: usize,
        mut orders: Vec<Order>,
        decomptes: &[Decompte],
        invoices: &[Invoice],
        interventions: &[Intervention],
        today: NaiveDate,
    ) -> Self {
        orders.retain(|o| !o.status.is_final());
        orders.sort_by(Order::priority_cmp);

        let unpaid: Vec<&Invoice> = invoices
            .iter()
            .filter(|i| matches!(i.status, InvoiceStatus::Emise | InvoiceStatus::Partielle))
            .collect();
        let outstanding = unpaid
            .iter()
            .map(|i| i.remaining())
            .fold(Decimal::ZERO, Decimal::saturating_add);

        Self {
            clients,
            orders_open: orders.len(),
            orders_urgent: orders
                .iter()
                .filter(|o| o.urgency != Urgency::Normale)
                .count(),
            orders_to_receive: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Commandee)
                .count(),
            decomptes_to_process: decomptes
                .iter()
                .filter(|d| d.status == DecompteStatus::ATraiter)
                .count(),
            decomptes_rejected: decomptes
                .iter()
                .filter(|d| d.status == DecompteStatus::Rejete)
                .count(),
            invoices_unpaid: unpaid.len(),
            invoices_overdue: invoices.iter().filter(|i| i.is_overdue(today)).count(),
            outstanding: format_eur(outstanding),
            interventions_open: interventions
                .iter()
                .filter(|i| i.status != InterventionStatus::Restituee)
                .count(),
            interventions_awaiting_signature: interventions
                .iter()
                .filter(|i| i.status == InterventionStatus::Terminee && i.signature.is_none())
                .count(),
            priority_orders: orders
                .iter()
                .take(PRIORITY_LIMIT)
                .map(|o| PriorityOrder {
                    id: o.id.to_string(),
                    client: o.client.name.clone(),
                    magasin: o.magasin.to_string(),
                    status: o.status.label(),
                    urgency: o.urgency.label(),
                    urgent: o.urgency != Urgency::Normale,
                })
                .collect(),
        }
    }

    /// Load everything `viewer` may see and compute the counters.
    ///
    /// # Errors
    ///
    /// Returns an error if any collection cannot be listed.
    pub async fn load(
        state: &AppState,
        viewer: &MagasinCode,
        today: NaiveDate,
    ) -> Result<Self, StoreError> {
        let client_repo = state.clients();
        let order_repo = state.orders();
        let decompte_repo = state.decomptes();
        let invoice_repo = state.invoices();
        let intervention_repo = state.interventions();
        let (clients, orders, decomptes, invoices, interventions) = tokio::try_join!(
            client_repo.list_for(viewer),
            order_repo.list_for(viewer),
            decompte_repo.list_for(viewer),
            invoice_repo.list_for(viewer),
            intervention_repo.list_for(viewer),
        )?;
        Ok(Self::compute(
            clients.len(),
            orders,
            &decomptes,
            &invoices,
            &interventions,
            today,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};
    use sav_core::models::{ClientRef, InvoiceInput, OrderInput, OrderLine};

    use super::*;

    fn client() -> ClientRef {
        ClientRef {
            id: None,
            name: "MARTIN Jeanne".to_string(),
            phone: None,
        }
    }

    fn order(urgency: Urgency, age_hours: i64) -> Order {
        let input = OrderInput {
            client: client(),
            products: vec![OrderLine {
                designation: "Piles 312".to_string(),
                reference: None,
                quantity: 2,
                side: None,
            }],
            urgency,
            collaborator: None,
            notes: String::new(),
        };
        Order::new(
            input,
            MagasinCode::parse("DIJ").unwrap(),
            Utc::now() - Duration::hours(age_hours),
        )
        .unwrap()
    }

    #[test]
    fn test_priority_list_puts_urgent_first_and_skips_closed() {
        let old_normal = order(Urgency::Normale, 48);
        let urgent = order(Urgency::TresUrgente, 1);
        let mut delivered = order(Urgency::TresUrgente, 72);
        delivered.status = OrderStatus::Livree;

        let summary = DashboardSummary::compute(
            0,
            vec![old_normal.clone(), delivered, urgent.clone()],
            &[],
            &[],
            &[],
            Utc::now().date_naive(),
        );

        assert_eq!(summary.orders_open, 2);
        assert_eq!(summary.orders_urgent, 1);
        assert_eq!(summary.priority_orders[0].id, urgent.id.to_string());
        assert_eq!(summary.priority_orders[1].id, old_normal.id.to_string());
    }

    #[test]
    fn test_outstanding_and_overdue_invoices() {
        let today = Utc::now().date_naive();
        let input = InvoiceInput {
            number: "F-2026-001".to_string(),
            client: client(),
            amount_total: Decimal::new(150_000, 2),
            decomptes: Vec::new(),
            issued_at: today - Duration::days(40),
            due_date: Some(today - Duration::days(10)),
        };
        let invoice = Invoice::new(input, MagasinCode::parse("DIJ").unwrap(), Utc::now()).unwrap();

        let summary = DashboardSummary::compute(0, Vec::new(), &[], &[invoice], &[], today);
        assert_eq!(summary.invoices_unpaid, 1);
        assert_eq!(summary.invoices_overdue, 1);
        assert_eq!(summary.outstanding, "1 500,00 €");
    }
}
