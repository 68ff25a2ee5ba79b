//! Browse controller: the async driver around the pure state machine.
//!
//! [`CatalogController::dispatch`] applies an event, runs the resulting
//! requests concurrently, and feeds each completion back through
//! [`transition`] in the order they finish. [`CatalogController::submit`]
//! and [`CatalogController::settle`] split that in two so a caller can fire
//! further user events while earlier requests are still in flight.

pub mod state;

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::api::CatalogApi;

pub use state::{
    CatalogState, Effect, Event, FetchError, Mode, Outcome, Phase, RequestKind, transition,
};

/// Drives a [`CatalogState`] against a [`CatalogApi`].
pub struct CatalogController {
    api: Arc<dyn CatalogApi>,
    state: CatalogState,
    in_flight: JoinSet<Event>,
}

impl CatalogController {
    #[must_use]
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self {
            api,
            state: CatalogState::new(),
            in_flight: JoinSet::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &CatalogState {
        &self.state
    }

    /// Number of requests still running.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Apply `event` and wait until every request it (or anything still
    /// outstanding) started has completed.
    pub async fn dispatch(&mut self, event: Event) {
        self.submit(event);
        self.settle().await;
    }

    /// Apply `event` and start its requests without waiting for them.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, event: Event) {
        let state = std::mem::take(&mut self.state);
        let (next, effects) = transition(state, event);
        self.state = next;

        for effect in effects {
            debug!(?effect, "Starting catalog request");
            self.in_flight.spawn(perform(Arc::clone(&self.api), effect));
        }
    }

    /// Feed completions back until nothing is in flight.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            match joined {
                Ok(completion) => {
                    if let Event::Completed { tag, outcome } = &completion
                        && !self.state.is_current(*tag, outcome)
                    {
                        debug!(
                            tag,
                            session = self.state.session(),
                            generation = self.state.generation(),
                            "Discarding stale response"
                        );
                    }
                    self.submit(completion);
                }
                Err(e) => warn!(error = %e, "Catalog request task failed"),
            }
        }
    }
}

/// Run one effect and package its completion.
async fn perform(api: Arc<dyn CatalogApi>, effect: Effect) -> Event {
    let tag = effect.tag();
    let outcome = match effect {
        Effect::FetchCategories { .. } => Outcome::Categories(
            api.categories()
                .await
                .map_err(|e| failure(RequestKind::Categories, &e)),
        ),
        Effect::FetchTotal { .. } => Outcome::Total(
            api.product_count()
                .await
                .map_err(|e| failure(RequestKind::TotalCount, &e)),
        ),
        Effect::FetchPage { page, .. } => Outcome::Page {
            page,
            result: api
                .product_page(page)
                .await
                .map_err(|e| failure(RequestKind::Page(page), &e)),
        },
        Effect::FetchFilter { request, .. } => Outcome::Filter(
            api.filter_products(&request)
                .await
                .map_err(|e| failure(RequestKind::Filter, &e)),
        ),
    };
    Event::Completed { tag, outcome }
}

fn failure(kind: RequestKind, error: &crate::api::ClientError) -> String {
    warn!(?kind, error = %error, "Catalog request failed");
    error.to_string()
}
