//! Load records from a YAML fixture.
//!
//! Every record is built and validated before anything is written, so a
//! bad fixture leaves the store untouched.
//!
//! ```yaml
//! profiles:
//!   - id: DIJ
//!     address: 12 rue de la Liberté, Dijon
//! collaborators:
//!   - name: Claire Petit
//!     role: audioprothesiste
//!     magasin: DIJ
//! clients:
//!   - magasin: DIJ
//!     last_name: MARTIN
//!     first_name: Jeanne
//! orders:
//!   - magasin: DIJ
//!     client: { name: MARTIN Jeanne }
//!     products: [{ designation: Piles 312, quantity: 4 }]
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use sav_admin::state::AppState;
use sav_core::models::{
    Client, ClientInput, Collaborator, CollaboratorInput, Decompte, DecompteInput, Intervention,
    InterventionInput, Invoice, InvoiceInput, Order, OrderInput, StoreProfile,
};
use sav_core::{MagasinCode, ValidationError};
use serde::Deserialize;
use tracing::info;

use super::{CliError, open_state};

/// A record input tagged with its owning store.
#[derive(Debug, Deserialize)]
pub struct Owned<T> {
    pub magasin: MagasinCode,
    #[serde(flatten)]
    pub input: T,
}

/// Fixture file contents. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    #[serde(default)]
    pub profiles: Vec<StoreProfile>,
    #[serde(default)]
    pub collaborators: Vec<CollaboratorInput>,
    #[serde(default)]
    pub clients: Vec<Owned<ClientInput>>,
    #[serde(default)]
    pub orders: Vec<Owned<OrderInput>>,
    #[serde(default)]
    pub decomptes: Vec<Owned<DecompteInput>>,
    #[serde(default)]
    pub invoices: Vec<Owned<InvoiceInput>>,
    #[serde(default)]
    pub interventions: Vec<Owned<InterventionInput>>,
}

/// Records built from a fixture, ready to insert.
#[derive(Debug, Default)]
pub struct SeedPlan {
    pub profiles: Vec<StoreProfile>,
    pub collaborators: Vec<Collaborator>,
    pub clients: Vec<Client>,
    pub orders: Vec<Order>,
    pub decomptes: Vec<Decompte>,
    pub invoices: Vec<Invoice>,
    pub interventions: Vec<Intervention>,
}

impl SeedPlan {
    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
            + self.collaborators.len()
            + self.clients.len()
            + self.orders.len()
            + self.decomptes.len()
            + self.invoices.len()
            + self.interventions.len()
    }

    /// Whether the fixture held no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build every record, failing on the first invalid one.
fn build_all<I, T>(
    kind: &'static str,
    inputs: Vec<I>,
    build: impl Fn(I) -> Result<T, ValidationError>,
) -> Result<Vec<T>, CliError> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            build(input).map_err(|source| CliError::Invalid {
                kind,
                index,
                source,
            })
        })
        .collect()
}

/// Validate a fixture and turn it into records.
///
/// # Errors
///
/// Returns [`CliError::Invalid`] naming the first invalid record.
pub fn plan(fixture: Fixture, now: DateTime<Utc>) -> Result<SeedPlan, CliError> {
    Ok(SeedPlan {
        profiles: fixture.profiles,
        collaborators: build_all("collaborator", fixture.collaborators, Collaborator::new)?,
        clients: build_all("client", fixture.clients, |o| {
            o.input.validate()?;
            Ok(Client::new(o.input, o.magasin, now))
        })?,
        orders: build_all("order", fixture.orders, |o| Order::new(o.input, o.magasin, now))?,
        decomptes: build_all("decompte", fixture.decomptes, |o| {
            Decompte::new(o.input, o.magasin, now)
        })?,
        invoices: build_all("invoice", fixture.invoices, |o| {
            Invoice::new(o.input, o.magasin, now)
        })?,
        interventions: build_all("intervention", fixture.interventions, |o| {
            Intervention::new(o.input, o.magasin, now)
        })?,
    })
}

/// Write every planned record.
///
/// # Errors
///
/// Returns an error on the first store failure.
pub async fn apply(state: &AppState, plan: &SeedPlan) -> Result<(), CliError> {
    for profile in &plan.profiles {
        state.profiles().save(profile).await?;
    }
    for collaborator in &plan.collaborators {
        state.collaborators().insert(collaborator).await?;
    }
    for client in &plan.clients {
        state.clients().insert(client).await?;
    }
    for order in &plan.orders {
        state.orders().insert(order).await?;
    }
    for decompte in &plan.decomptes {
        state.decomptes().insert(decompte).await?;
    }
    for invoice in &plan.invoices {
        state.invoices().insert(invoice).await?;
    }
    for intervention in &plan.interventions {
        state.interventions().insert(intervention).await?;
    }
    Ok(())
}

/// Seed the document store from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the fixture is invalid,
/// or the store fails.
pub async fn run(path: &Path, dry_run: bool) -> Result<SeedPlan, CliError> {
    info!(path = %path.display(), dry_run, "Loading fixture");

    let content = tokio::fs::read_to_string(path).await?;
    let fixture: Fixture = serde_yaml::from_str(&content)?;
    let plan = plan(fixture, Utc::now())?;

    info!(
        profiles = plan.profiles.len(),
        collaborators = plan.collaborators.len(),
        clients = plan.clients.len(),
        orders = plan.orders.len(),
        decomptes = plan.decomptes.len(),
        invoices = plan.invoices.len(),
        interventions = plan.interventions.len(),
        "Fixture validated"
    );

    let state = open_state(dry_run)?;
    apply(&state, &plan).await?;

    if dry_run {
        info!("Dry run: {} record(s) built in memory, nothing written", plan.len());
    } else {
        info!(backend = state.store().backend(), "Seeded {} record(s)", plan.len());
    }
    Ok(plan)
}
