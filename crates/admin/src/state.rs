//! Application state shared across handlers.

use std::sync::Arc;

use sav_core::models::{
    Client, Collaborator, Decompte, Intervention, Invoice, Order, StoreProfile,
};
use sav_core::{PinAuthenticator, Record};

use crate::config::{AdminConfig, StoreBackend};
use crate::services::LoginLedger;
use crate::store::{DocumentStore, FirestoreStore, MemoryStore, Repository, StoreError};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: Arc<dyn DocumentStore>,
    auth: PinAuthenticator,
    login_ledger: LoginLedger,
}

impl AppState {
    /// Build state with the configured document store.
    ///
    /// # Errors
    ///
    /// Returns an error if the Firestore client cannot be created.
    pub fn new(config: AdminConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn DocumentStore> = match (config.backend, &config.firestore) {
            (StoreBackend::Firestore, Some(firestore)) => Arc::new(FirestoreStore::new(firestore)?),
            (StoreBackend::Firestore, None) => {
                tracing::warn!("Firestore backend selected without settings, using memory");
                Arc::new(MemoryStore::new())
            }
            (StoreBackend::Memory, _) => Arc::new(MemoryStore::new()),
        };
        Ok(Self::with_store(config, store))
    }

    /// Build state around an existing document store.
    #[must_use]
    pub fn with_store(config: AdminConfig, store: Arc<dyn DocumentStore>) -> Self {
        let auth = PinAuthenticator::new(config.directory.clone(), config.auth);
        tracing::info!(
            backend = store.backend(),
            stores = config.directory.len(),
            "Application state ready"
        );
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                auth,
                login_ledger: LoginLedger::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn auth(&self) -> &PinAuthenticator {
        &self.inner.auth
    }

    /// Failed-login counters shared by every request.
    #[must_use]
    pub fn login_ledger(&self) -> &LoginLedger {
        &self.inner.login_ledger
    }

    /// Typed repository over the shared store.
    #[must_use]
    pub fn repo<T: Record>(&self) -> Repository<T> {
        Repository::new(Arc::clone(&self.inner.store))
    }

    #[must_use]
    pub fn clients(&self) -> Repository<Client> {
        self.repo()
    }

    #[must_use]
    pub fn collaborators(&self) -> Repository<Collaborator> {
        self.repo()
    }

    #[must_use]
    pub fn orders(&self) -> Repository<Order> {
        self.repo()
    }

    #[must_use]
    pub fn decomptes(&self) -> Repository<Decompte> {
        self.repo()
    }

    #[must_use]
    pub fn invoices(&self) -> Repository<Invoice> {
        self.repo()
    }

    #[must_use]
    pub fn interventions(&self) -> Repository<Intervention> {
        self.repo()
    }

    #[must_use]
    pub fn profiles(&self) -> Repository<StoreProfile> {
        self.repo()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.inner.store.backend())
            .field("base_url", &self.inner.config.base_url)
            .finish_non_exhaustive()
    }
}
