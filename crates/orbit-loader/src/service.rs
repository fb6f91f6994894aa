//! Async front door for loads.
//!
//! `LoaderService` owns the store handle and pushes every store access onto
//! tokio's blocking pool. Expansions with the same anchor and mode, issued
//! against the same graph, that overlap in time share one in-flight future,
//! so a double click issues one set of store queries.

use crate::config::LoaderOptions;
use crate::error::{LoadError, Result};
use crate::expander::{self, ExpandMode, ExpandRequest};
use crate::neighborhood::{self, NeighborhoodRequest};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use orbit_core::{Budget, GraphStore, NodeKey, PartitionFilter};
use orbit_graph::{GraphDelta, GraphSnapshot};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

type SharedExpansion = Shared<BoxFuture<'static, Result<GraphDelta>>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ExpansionKey {
    anchor: NodeKey,
    mode: ExpandMode,
    graph: u64,
}

struct InFlight {
    ticket: u64,
    cancel: CancellationToken,
    shared: SharedExpansion,
}

#[derive(Default)]
struct ServiceState {
    store: Option<Arc<dyn GraphStore>>,
    in_flight: HashMap<ExpansionKey, InFlight>,
    next_ticket: u64,
}

/// Cheap to clone; clones share the store handle and in-flight table.
#[derive(Clone, Default)]
pub struct LoaderService {
    state: Arc<Mutex<ServiceState>>,
    options: LoaderOptions,
}

impl LoaderService {
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServiceState::default())),
            options,
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Installs the store handle. Configuring again replaces it.
    pub fn configure(&self, store: Arc<dyn GraphStore>) {
        let mut state = self.lock();
        if state.store.is_some() {
            info!("Replacing configured store");
        }
        state.store = Some(store);
    }

    pub fn is_configured(&self) -> bool {
        self.lock().store.is_some()
    }

    /// Number of distinct expansions currently running.
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn store(&self) -> Result<Arc<dyn GraphStore>> {
        self.lock().store.clone().ok_or(LoadError::NotConfigured)
    }

    pub async fn load_global(
        &self,
        partition: PartitionFilter,
        budget: Budget,
        cancel: CancellationToken,
    ) -> Result<GraphSnapshot> {
        let store = self.store()?;
        tokio::task::spawn_blocking(move || {
            neighborhood::load_global(store.as_ref(), &partition, &budget, &cancel)
        })
        .await
        .map_err(|e| LoadError::Worker(e.to_string()))?
    }

    pub async fn load_neighborhood(
        &self,
        request: NeighborhoodRequest,
        cancel: CancellationToken,
    ) -> Result<GraphSnapshot> {
        let store = self.store()?;
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || {
            neighborhood::load_neighborhood(store.as_ref(), &request, &options, &cancel)
        })
        .await
        .map_err(|e| LoadError::Worker(e.to_string()))?
    }

    /// Expands one node, joining an identical expansion already running.
    ///
    /// Only expansions of the same graph generation are joined, and never one
    /// whose token is already cancelled. A joined expansion runs under the
    /// cancellation token of the caller that started it.
    pub async fn expand(
        &self,
        request: ExpandRequest,
        cancel: CancellationToken,
    ) -> Result<GraphDelta> {
        let store = self.store()?;
        let key = ExpansionKey {
            anchor: request.anchor.clone(),
            mode: request.mode,
            graph: request.graph,
        };

        let (ticket, shared) = {
            let mut state = self.lock();
            let running = state
                .in_flight
                .get(&key)
                .filter(|entry| !entry.cancel.is_cancelled())
                .map(|entry| (entry.ticket, entry.shared.clone()));
            match running {
                Some(joined) => {
                    debug!("Joining in-flight expansion of {}", key.anchor);
                    joined
                }
                None => {
                    let ticket = state.next_ticket;
                    state.next_ticket += 1;
                    let options = self.options.clone();
                    let token = cancel.clone();
                    let shared = async move {
                        tokio::task::spawn_blocking(move || {
                            expander::expand(store.as_ref(), &request, &options, &cancel)
                        })
                        .await
                        .unwrap_or_else(|e| Err(LoadError::Worker(e.to_string())))
                    }
                    .boxed()
                    .shared();
                    state.in_flight.insert(
                        key.clone(),
                        InFlight {
                            ticket,
                            cancel: token,
                            shared: shared.clone(),
                        },
                    );
                    (ticket, shared)
                }
            }
        };

        let result = shared.await;

        let mut state = self.lock();
        if state.in_flight.get(&key).map(|entry| entry.ticket) == Some(ticket) {
            state.in_flight.remove(&key);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_core::{MemoryStore, NodeRecord};

    #[tokio::test]
    async fn test_not_configured() {
        let service = LoaderService::default();
        assert!(!service.is_configured());

        let err = service
            .load_global(PartitionFilter::Any, Budget::default(), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, LoadError::NotConfigured);

        let err = service
            .expand(
                ExpandRequest::new(NodeKey::primary("a"), ExpandMode::Full),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, LoadError::NotConfigured);
    }

    #[tokio::test]
    async fn test_configure_replaces_store() {
        let service = LoaderService::default();
        service.configure(Arc::new(
            MemoryStore::new().with_node(NodeRecord::primary("a", "A")),
        ));
        service.configure(Arc::new(
            MemoryStore::new()
                .with_node(NodeRecord::primary("a", "A"))
                .with_node(NodeRecord::primary("b", "B")),
        ));

        let snapshot = service
            .load_global(PartitionFilter::Any, Budget::default(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(snapshot.node_count(), 2);
    }
}
